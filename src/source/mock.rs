use std::io;
use std::sync::RwLock;

use futures::future::BoxFuture;
use futures::FutureExt;
use time::OffsetDateTime;

use crate::errors::SourceError;
use crate::member::{Member, MemberId, MemberInput, MemberPatch};
use crate::source::Source;

/// An in-memory stand-in for the remote members API.
#[derive(Default)]
pub(crate) struct MockSource {
    pub(crate) records: RwLock<Vec<Member>>,
    fail: bool,
}

impl MockSource {
    pub fn with_records(records: Vec<Member>) -> Self {
        MockSource {
            records: RwLock::new(records),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        MockSource {
            fail: true,
            ..Default::default()
        }
    }

    fn offline(&self) -> Result<(), SourceError> {
        if self.fail {
            Err(SourceError::Unavailable {
                source: Box::new(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "mock source offline",
                )),
            })
        } else {
            Ok(())
        }
    }
}

impl Source for MockSource {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Member>, SourceError>> {
        async move {
            self.offline()?;

            Ok(self.records.read().unwrap().clone())
        }
        .boxed()
    }

    fn create(&self, input: MemberInput) -> BoxFuture<'_, Result<Member, SourceError>> {
        async move {
            self.offline()?;

            let mut records = self.records.write().unwrap();
            let id = records.iter().map(Member::id).max().unwrap_or(0) + 1;
            let member = Member::from_input(id, input, OffsetDateTime::now_utc());
            records.push(member.clone());

            Ok(member)
        }
        .boxed()
    }

    fn update(&self, id: MemberId, patch: MemberPatch) -> BoxFuture<'_, Result<Member, SourceError>> {
        async move {
            self.offline()?;

            let mut records = self.records.write().unwrap();
            let member = records.iter_mut().find(|m| m.id() == id).ok_or_else(|| {
                SourceError::Unavailable {
                    source: Box::new(io::Error::new(io::ErrorKind::NotFound, "no such member")),
                }
            })?;
            member.apply(patch);

            Ok(member.clone())
        }
        .boxed()
    }

    fn delete(&self, id: MemberId) -> BoxFuture<'_, Result<(), SourceError>> {
        async move {
            self.offline()?;

            self.records.write().unwrap().retain(|m| m.id() != id);

            Ok(())
        }
        .boxed()
    }
}
