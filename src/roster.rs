use std::collections::BTreeSet;

use time::OffsetDateTime;

use crate::aggregates::Aggregates;
use crate::config::Config;
use crate::errors::RosterError;
use crate::export;
use crate::member::{Member, MemberId, MemberInput, MemberPatch};
use crate::selection::SelectionState;
use crate::store::RecordStore;
use crate::view::{self, ViewPage, ViewParams};

/// Owns the record store and the selection, and applies every mutation.
/// Each successful mutation bumps a revision counter; consumers compare
/// revisions to know that previously computed views and aggregates are
/// stale and must be recomputed before the next read.
#[derive(Debug)]
pub struct Roster {
    store: RecordStore,
    selection: SelectionState,
    config: Config,
    revision: u64,
}

impl Roster {
    pub fn new(config: Config) -> Self {
        Self {
            store: RecordStore::new(),
            selection: SelectionState::new(),
            config,
            revision: 0,
        }
    }

    /// Builds a roster around an existing collection, e.g. the initial
    /// load from the external source.
    pub fn seeded(members: Vec<Member>, config: Config) -> Self {
        Self {
            store: RecordStore::seeded(members),
            selection: SelectionState::new(),
            config,
            revision: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The full collection in insertion order.
    pub fn members(&self) -> &[Member] {
        self.store.all()
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.store.get(id)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Monotonic change counter; bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Computes the displayed page and scopes the selection to it.
    pub fn view(&mut self, params: &ViewParams) -> ViewPage {
        let page = view::build_view(self.store.all(), params);
        self.selection.set_page(page.page());

        page
    }

    /// Recomputes the dashboard battery from the full collection.
    pub fn aggregates(&self, now: OffsetDateTime) -> Aggregates {
        Aggregates::compute(self.store.all(), now, self.config.facets())
    }

    /// Renders the filtered records, in the current sort order, as CSV.
    pub fn export_csv(&self, params: &ViewParams) -> String {
        let visible = view::filter_and_sort(self.store.all(), params);

        export::to_csv(&visible, self.config.facet_label())
    }

    pub fn add_member(&mut self, input: MemberInput, now: OffsetDateTime) -> Result<Member, RosterError> {
        input.validate(&self.config)?;

        let member = self.store.insert(input, now);
        self.touch();

        Ok(member)
    }

    pub fn edit_member(&mut self, id: MemberId, patch: MemberPatch) -> Result<Member, RosterError> {
        patch.validate(&self.config)?;

        let member = self.store.update(id, patch)?;
        self.touch();

        Ok(member)
    }

    /// Removes the record. The consuming UI is expected to gate this
    /// (and `bulk_delete_selected`) behind an explicit confirmation
    /// step; the engine itself deletes unconditionally.
    pub fn delete_member(&mut self, id: MemberId) -> Result<Member, RosterError> {
        let member = self.store.delete(id)?;
        self.selection.retain(|selected| selected != id);
        self.touch();

        Ok(member)
    }

    /// Deletes every currently selected record, best-effort, and clears
    /// the selection. Returns the number removed.
    pub fn bulk_delete_selected(&mut self) -> usize {
        let ids: BTreeSet<MemberId> = self.selection.ids().clone();
        let removed = self.store.bulk_delete(&ids);
        self.selection.clear();

        if removed > 0 {
            self.touch();
        }

        removed
    }

    pub fn assign_tag(&mut self, id: MemberId, tag: &str) -> Result<(), RosterError> {
        if !self.config.contains_tag(tag) {
            return Err(RosterError::UnknownTag {
                value: tag.to_owned(),
            });
        }

        self.store.add_tag(id, tag)?;
        self.touch();

        Ok(())
    }

    pub fn remove_tag(&mut self, id: MemberId, tag: &str) -> Result<(), RosterError> {
        if !self.config.contains_tag(tag) {
            return Err(RosterError::UnknownTag {
                value: tag.to_owned(),
            });
        }

        self.store.remove_tag(id, tag)?;
        self.touch();

        Ok(())
    }

    pub fn toggle_selected(&mut self, id: MemberId) {
        self.selection.toggle(id);
    }

    /// Selects every record on the page the parameters describe.
    pub fn select_visible(&mut self, params: &ViewParams) {
        let page = self.view(params);
        let ids: Vec<MemberId> = page.items().iter().map(Member::id).collect();
        self.selection.select_many(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
