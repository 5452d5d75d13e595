use std::collections::BTreeSet;

use time::OffsetDateTime;

use crate::errors::RosterError;
use crate::member::{Member, MemberId, MemberInput, MemberPatch};

/// The canonical owner of the member collection. All reads elsewhere are
/// snapshots of `all`; nothing outside the store holds a live mutable
/// reference.
///
/// Ids come from a store-owned monotonic counter, so an id is never
/// reassigned to a different record, even after the record holding it is
/// deleted.
#[derive(Debug)]
pub struct RecordStore {
    members: Vec<Member>,
    next_id: MemberId,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            next_id: 1,
        }
    }

    /// Builds a store around an existing collection, e.g. the initial
    /// load from the external source. The id counter resumes after the
    /// highest seeded id.
    pub fn seeded(members: Vec<Member>) -> Self {
        let next_id = members.iter().map(Member::id).max().unwrap_or(0) + 1;

        Self { members, next_id }
    }

    /// Inserts a new record, assigning the next id and stamping the
    /// enrollment instant. Returns the stored record.
    pub fn insert(&mut self, input: MemberInput, now: OffsetDateTime) -> Member {
        let member = Member::from_input(self.next_id, input, now);
        self.next_id += 1;
        self.members.push(member.clone());

        member
    }

    /// Merges the patch over the record's current fields. Fields absent
    /// from the patch are untouched.
    pub fn update(&mut self, id: MemberId, patch: MemberPatch) -> Result<Member, RosterError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(RosterError::NotFound { id })?;
        member.apply(patch);

        Ok(member.clone())
    }

    /// Removes the record and returns it.
    pub fn delete(&mut self, id: MemberId) -> Result<Member, RosterError> {
        let position = self
            .members
            .iter()
            .position(|m| m.id() == id)
            .ok_or(RosterError::NotFound { id })?;

        Ok(self.members.remove(position))
    }

    /// Removes every record whose id appears in `ids`. Ids with no
    /// matching record are silently ignored; bulk deletion is
    /// best-effort, not all-or-nothing. Returns the number removed.
    pub fn bulk_delete(&mut self, ids: &BTreeSet<MemberId>) -> usize {
        let before = self.members.len();
        self.members.retain(|m| !ids.contains(&m.id()));

        before - self.members.len()
    }

    /// Adds a tag to the record. Adding an already-present tag is a
    /// no-op, not an error.
    pub fn add_tag(&mut self, id: MemberId, tag: &str) -> Result<(), RosterError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(RosterError::NotFound { id })?;
        member.add_tag(tag);

        Ok(())
    }

    /// Removes a tag from the record. Removing an absent tag is a no-op.
    pub fn remove_tag(&mut self, id: MemberId, tag: &str) -> Result<(), RosterError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(RosterError::NotFound { id })?;
        member.remove_tag(tag);

        Ok(())
    }

    /// Returns the collection in insertion order.
    pub fn all(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
