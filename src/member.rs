use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use url::Url;

use crate::config::Config;
use crate::errors::RosterError;
use crate::normalization;

/// An ID in the store.
pub type MemberId = i64;

/// The gender recorded for a member.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// A single member in the store.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Member {
    /// The ID of the member.
    id: MemberId,

    /// The first name provided.
    #[serde(deserialize_with = "normalization::deserialize")]
    first_name: String,

    /// The last name provided.
    #[serde(deserialize_with = "normalization::deserialize")]
    last_name: String,

    /// The email address provided.
    email: String,

    /// The gender provided.
    gender: Gender,

    /// The location facet the member belongs to. Drawn from the
    /// configured facet set.
    facet: String,

    /// The age provided.
    age: u32,

    /// The instant the member was enrolled.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// The birthday, if provided. Only the month and day matter; the
    /// year is ignored for recurrence.
    #[serde(default)]
    birthday: Option<Date>,

    /// The number of recorded contributions. The sole activity proxy.
    contributions: u32,

    /// The avatar URL, if one was provided. Absence is handled at the
    /// presentation boundary.
    #[serde(default)]
    image_url: Option<Url>,

    /// The tags assigned to the member. An untagged member carries an
    /// empty set, never an absent one.
    #[serde(default)]
    tags: BTreeSet<String>,
}

impl Member {
    // TODO revisit whether we can get around the lint
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MemberId,
        first_name: String,
        last_name: String,
        email: String,
        gender: Gender,
        facet: String,
        age: u32,
        created_at: OffsetDateTime,
        birthday: Option<Date>,
        contributions: u32,
        image_url: Option<Url>,
        tags: BTreeSet<String>,
    ) -> Self {
        Member {
            id,
            first_name,
            last_name,
            email,
            gender,
            facet,
            age,
            created_at,
            birthday,
            contributions,
            image_url,
            tags,
        }
    }

    pub(crate) fn from_input(id: MemberId, input: MemberInput, created_at: OffsetDateTime) -> Self {
        Member {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            gender: input.gender,
            facet: input.facet,
            age: input.age,
            created_at,
            birthday: input.birthday,
            contributions: 0,
            image_url: input.image_url,
            tags: input.tags,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Returns the display name, first name then last name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn facet(&self) -> &str {
        &self.facet
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn birthday(&self) -> Option<Date> {
        self.birthday
    }

    pub fn contributions(&self) -> u32 {
        self.contributions
    }

    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns whether the member counts as active, i.e. has recorded at
    /// least one contribution.
    pub fn is_active(&self) -> bool {
        self.contributions > 0
    }

    pub(crate) fn apply(&mut self, patch: MemberPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(facet) = patch.facet {
            self.facet = facet;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(birthday) = patch.birthday {
            self.birthday = Some(birthday);
        }
        if let Some(contributions) = patch.contributions {
            self.contributions = contributions;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
    }

    pub(crate) fn add_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_owned());
    }

    pub(crate) fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }
}

/// The payload for adding a member. The id and the enrollment instant
/// are assigned by the store, not supplied by the caller.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemberInput {
    /// The first name provided.
    #[serde(deserialize_with = "normalization::deserialize")]
    pub first_name: String,

    /// The last name provided.
    #[serde(deserialize_with = "normalization::deserialize")]
    pub last_name: String,

    /// The email address provided.
    pub email: String,

    /// The gender provided.
    pub gender: Gender,

    /// The location facet the member belongs to.
    pub facet: String,

    /// The age provided.
    #[serde(default)]
    pub age: u32,

    /// The birthday, if provided.
    #[serde(default)]
    pub birthday: Option<Date>,

    /// The avatar URL, if one was provided.
    #[serde(default)]
    pub image_url: Option<Url>,

    /// The initial tags. Must be drawn from the configured vocabulary.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl MemberInput {
    /// Checks the payload against the required fields and the configured
    /// facet and tag sets. Rejected payloads never reach the store.
    pub fn validate(&self, config: &Config) -> Result<(), RosterError> {
        if self.first_name.trim().is_empty() {
            return Err(RosterError::InvalidInput { field: "first_name" });
        }
        if self.last_name.trim().is_empty() {
            return Err(RosterError::InvalidInput { field: "last_name" });
        }
        if self.email.trim().is_empty() {
            return Err(RosterError::InvalidInput { field: "email" });
        }
        if !config.contains_facet(&self.facet) {
            return Err(RosterError::UnknownFacet {
                value: self.facet.clone(),
            });
        }
        for tag in &self.tags {
            if !config.contains_tag(tag) {
                return Err(RosterError::UnknownTag { value: tag.clone() });
            }
        }

        Ok(())
    }
}

/// A partial update to a member. Fields left as `None` are untouched by
/// the merge; tags are mutated through the dedicated tag operations
/// instead.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MemberPatch {
    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<Date>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Url>,
}

impl MemberPatch {
    /// Checks the provided fields the same way `MemberInput::validate`
    /// checks a full payload.
    pub fn validate(&self, config: &Config) -> Result<(), RosterError> {
        if let Some(first_name) = &self.first_name {
            if first_name.trim().is_empty() {
                return Err(RosterError::InvalidInput { field: "first_name" });
            }
        }
        if let Some(last_name) = &self.last_name {
            if last_name.trim().is_empty() {
                return Err(RosterError::InvalidInput { field: "last_name" });
            }
        }
        if let Some(email) = &self.email {
            if email.trim().is_empty() {
                return Err(RosterError::InvalidInput { field: "email" });
            }
        }
        if let Some(facet) = &self.facet {
            if !config.contains_facet(facet) {
                return Err(RosterError::UnknownFacet {
                    value: facet.clone(),
                });
            }
        }

        Ok(())
    }
}
