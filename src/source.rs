use futures::future::BoxFuture;

use log::{debug, warn, Logger};

use crate::errors::SourceError;
use crate::member::{Member, MemberId, MemberInput, MemberPatch};
use crate::sample;

#[cfg(test)]
pub(crate) mod mock;

/// The external record source. `fetch_all` is the single read the
/// engine performs at startup. The write-back calls define the contract
/// a production shell needs; the engine itself never invokes them, so
/// local mutations stay local.
pub trait Source {
    /// Fetches the full member collection.
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Member>, SourceError>>;

    /// Creates a member on the remote source and returns the stored
    /// record, id assigned remotely.
    fn create(&self, input: MemberInput) -> BoxFuture<'_, Result<Member, SourceError>>;

    /// Applies a partial update to the remote record.
    fn update(&self, id: MemberId, patch: MemberPatch) -> BoxFuture<'_, Result<Member, SourceError>>;

    /// Deletes the remote record.
    fn delete(&self, id: MemberId) -> BoxFuture<'_, Result<(), SourceError>>;
}

/// Performs the one-shot initial load. A failed load and an empty
/// successful response both fall back to the built-in sample roster;
/// neither is surfaced to the user as an error. There is no retry, and
/// dropping the future before it resolves discards whatever the source
/// later returns.
pub async fn load_or_fallback(logger: &Logger, source: &dyn Source) -> Vec<Member> {
    let result = source.fetch_all().await.and_then(|members| {
        if members.is_empty() {
            Err(SourceError::Empty)
        } else {
            Ok(members)
        }
    });

    match result {
        Ok(members) => {
            debug!(logger, "Loaded members from source"; "count" => members.len());

            members
        }
        Err(e) => {
            warn!(logger, "Falling back to the sample roster"; "error" => %e);

            sample::members()
        }
    }
}

pub use self::http::*;

mod http {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use url::Url;

    use crate::config::get_variable;
    use crate::errors::SourceError;
    use crate::member::{Member, MemberId, MemberInput, MemberPatch};

    /// A source backed by the remote members API.
    pub struct HttpSource {
        client: reqwest::Client,
        members_url: Url,
    }

    impl HttpSource {
        /// Creates a new instance against the API base URL.
        pub fn new(base_url: Url) -> Self {
            let members_url = base_url.join("members/").expect("join members path");

            Self {
                client: reqwest::Client::new(),
                members_url,
            }
        }

        pub fn from_env() -> Self {
            let base_url = Url::parse(&get_variable("ROSTER_SOURCE_URL")).expect("parse ROSTER_SOURCE_URL");

            Self::new(base_url)
        }

        fn member_url(&self, id: MemberId) -> Url {
            self.members_url
                .join(&id.to_string())
                .expect("join member id path")
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Source for HttpSource {
        fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Member>, SourceError>> {
            async move {
                let response = self
                    .client
                    .get(self.members_url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(transport)?;

                let raw = response.text().await.map_err(transport)?;
                let members = serde_json::from_str(&raw)
                    .map_err(|source| SourceError::Malformed { source })?;

                Ok(members)
            }
            .boxed()
        }

        fn create(&self, input: MemberInput) -> BoxFuture<'_, Result<Member, SourceError>> {
            async move {
                let response = self
                    .client
                    .post(self.members_url.clone())
                    .json(&input)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(transport)?;

                parse_member(response).await
            }
            .boxed()
        }

        fn update(
            &self,
            id: MemberId,
            patch: MemberPatch,
        ) -> BoxFuture<'_, Result<Member, SourceError>> {
            async move {
                let response = self
                    .client
                    .put(self.member_url(id))
                    .json(&patch)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(transport)?;

                parse_member(response).await
            }
            .boxed()
        }

        fn delete(&self, id: MemberId) -> BoxFuture<'_, Result<(), SourceError>> {
            async move {
                self.client
                    .delete(self.member_url(id))
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(transport)?;

                Ok(())
            }
            .boxed()
        }
    }

    async fn parse_member(response: reqwest::Response) -> Result<Member, SourceError> {
        let raw = response.text().await.map_err(transport)?;

        serde_json::from_str(&raw).map_err(|source| SourceError::Malformed { source })
    }

    fn transport(source: reqwest::Error) -> SourceError {
        SourceError::Unavailable {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use log::{o, Discard, Logger};

    use crate::sample;
    use crate::source::mock::MockSource;

    use super::load_or_fallback;

    fn logger() -> Logger {
        Logger::root(Discard, o!())
    }

    #[tokio::test]
    async fn a_successful_load_is_used_as_is() {
        let source = MockSource::with_records(sample::members().split_off(3));

        let members = load_or_fallback(&logger(), &source).await;

        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn a_failed_load_falls_back_to_the_sample_roster() {
        let source = MockSource::failing();

        let members = load_or_fallback(&logger(), &source).await;

        assert_eq!(members.len(), sample::members().len());
    }

    #[tokio::test]
    async fn an_empty_load_falls_back_like_a_failure() {
        let source = MockSource::with_records(Vec::new());

        let members = load_or_fallback(&logger(), &source).await;

        assert_eq!(members.len(), sample::members().len());
    }
}
