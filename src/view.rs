use std::cmp::Ordering;

use serde::Serialize;

use crate::member::{Gender, Member};

/// The page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A single sortable column of the member table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    Name,
    Facet,
    Status,
    JoinDate,
    Contributions,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// The parameters that deterministically select and order the displayed
/// slice of records. Changing the search, a filter, or the sort resets
/// the page to 1 so the view never lingers on a page that no longer
/// exists for the new criteria.
#[derive(Clone, Debug)]
pub struct ViewParams {
    search: String,
    facet: Option<String>,
    gender: Option<Gender>,
    tag: Option<String>,
    sort: SortKey,
    direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl ViewParams {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            facet: None,
            gender: None,
            tag: None,
            sort: SortKey::Name,
            direction: SortDirection::Ascending,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self.page = 1;
        self
    }

    /// Filters to a single facet; `None` means "All".
    pub fn with_facet(mut self, facet: Option<String>) -> Self {
        self.facet = facet;
        self.page = 1;
        self
    }

    pub fn with_gender(mut self, gender: Option<Gender>) -> Self {
        self.gender = gender;
        self.page = 1;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self.page = 1;
        self
    }

    pub fn with_sort(mut self, sort: SortKey, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self.page = 1;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns whether the member satisfies every active predicate. The
    /// facet, gender and tag filters are exact matches; the search text
    /// is a case-insensitive substring match against the display name or
    /// the email; all of them are combined with AND.
    fn matches(&self, member: &Member) -> bool {
        if let Some(facet) = &self.facet {
            if member.facet() != facet {
                return false;
            }
        }
        if let Some(gender) = self.gender {
            if member.gender() != gender {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !member.tags().contains(tag) {
                return false;
            }
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();

            return member.full_name().to_lowercase().contains(&needle)
                || member.email().to_lowercase().contains(&needle);
        }

        true
    }

    fn compare(&self, a: &Member, b: &Member) -> Ordering {
        let ordering = match self.sort {
            SortKey::Name => a.full_name().cmp(&b.full_name()),
            SortKey::Facet => a.facet().cmp(b.facet()),
            SortKey::Status => a.is_active().cmp(&b.is_active()),
            SortKey::JoinDate => a.created_at().cmp(&b.created_at()),
            SortKey::Contributions => a.contributions().cmp(&b.contributions()),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl Default for ViewParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// One displayed page plus the totals the pagination chrome needs.
#[derive(Clone, Debug, Serialize)]
pub struct ViewPage {
    items: Vec<Member>,
    total_count: usize,
    total_pages: usize,
    page: usize,
}

impl ViewPage {
    pub fn items(&self) -> &[Member] {
        &self.items
    }

    /// The number of records after filter and search, before pagination.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Always at least 1, even for an empty filtered set.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// The page actually shown, clamped into `[1, total_pages]`.
    pub fn page(&self) -> usize {
        self.page
    }
}

/// Applies the filters and the sort without paginating. This is the
/// sequence the CSV export walks: every visible record, in the current
/// sort order.
pub fn filter_and_sort<'a>(records: &'a [Member], params: &ViewParams) -> Vec<&'a Member> {
    let mut filtered: Vec<&Member> = records.iter().filter(|m| params.matches(m)).collect();

    // Ties must preserve the pre-sort relative order; sort_by is stable.
    filtered.sort_by(|a, b| params.compare(a, b));

    filtered
}

/// Composes filter, search, sort and pagination into the displayed page.
/// Pure: the same records and parameters always produce the same page.
pub fn build_view(records: &[Member], params: &ViewParams) -> ViewPage {
    let filtered = filter_and_sort(records, params);

    let page_size = params.page_size.max(1);
    let total_count = filtered.len();
    let total_pages = ((total_count + page_size - 1) / page_size).max(1);
    let page = params.page.clamp(1, total_pages);

    let items = filtered
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    ViewPage {
        items,
        total_count,
        total_pages,
        page,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    use crate::member::{Gender, Member};

    use super::{build_view, filter_and_sort, SortDirection, SortKey, ViewParams};

    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00 UTC);

    const FACETS: [&str; 4] = ["Suphan Buri", "Kanchanaburi", "Uthai Thani", "Sing Buri"];
    const TAGS: [&str; 3] = ["Committee", "Volunteer", "Alumni"];

    fn member(
        id: i64,
        first: &str,
        last: &str,
        email: &str,
        gender: Gender,
        facet: &str,
        contributions: u32,
        days_ago: i64,
        tags: &[&str],
    ) -> Member {
        Member::new(
            id,
            first.to_owned(),
            last.to_owned(),
            email.to_owned(),
            gender,
            facet.to_owned(),
            30,
            NOW - Duration::days(days_ago),
            None,
            contributions,
            None,
            tags.iter().map(|t| (*t).to_owned()).collect(),
        )
    }

    fn fixture() -> Vec<Member> {
        vec![
            member(1, "Ananda", "Kul", "ananda@example.com", Gender::Male, FACETS[0], 4, 120, &["Committee"]),
            member(2, "Boon", "Mee", "boon@example.com", Gender::Male, FACETS[1], 0, 90, &[]),
            member(3, "Chai", "Dee", "chai@example.com", Gender::Male, FACETS[0], 7, 60, &["Volunteer"]),
            member(4, "Dao", "Kul", "dao@example.com", Gender::Female, FACETS[2], 2, 30, &["Committee"]),
            member(5, "Fah", "Ngam", "fah@other.org", Gender::Female, FACETS[1], 0, 10, &[]),
        ]
    }

    #[test]
    fn search_matches_name_or_email_case_insensitively() {
        let records = fixture();

        let by_name = filter_and_sort(&records, &ViewParams::default().with_search("aNaNdA"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id(), 1);

        let by_email = filter_and_sort(&records, &ViewParams::default().with_search("other.org"));
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].id(), 5);
    }

    #[test]
    fn search_spans_the_full_name_concatenation() {
        let records = fixture();

        // "a Kul" only appears across the first/last name boundary.
        let hits = filter_and_sort(&records, &ViewParams::default().with_search("a Kul"));

        assert_eq!(hits.iter().map(|m| m.id()).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn search_narrows_filters_rather_than_replacing_them() {
        let records = fixture();

        let params = ViewParams::default()
            .with_facet(Some(FACETS[1].to_owned()))
            .with_search("boon");
        let hits = filter_and_sort(&records, &params);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 2);
    }

    #[test]
    fn filters_combine_with_and() {
        let records = fixture();

        let params = ViewParams::default()
            .with_gender(Some(Gender::Female))
            .with_tag(Some("Committee".to_owned()));
        let hits = filter_and_sort(&records, &params);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 4);
    }

    #[test]
    fn empty_set_still_has_one_page() {
        let records = fixture();

        let page = build_view(&records, &ViewParams::default().with_search("no such member"));

        assert_eq!(page.total_count(), 0);
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.page(), 1);
        assert!(page.items().is_empty());
    }

    #[test]
    fn page_is_clamped_into_range() {
        let records = fixture();

        let page = build_view(&records, &ViewParams::new(2).with_page(9));

        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.page(), 3);
        assert_eq!(page.items().len(), 1);
    }

    #[test]
    fn changing_a_filter_resets_the_page() {
        let params = ViewParams::new(2)
            .with_page(3)
            .with_facet(Some(FACETS[0].to_owned()));

        assert_eq!(params.page(), 1);
    }

    #[test]
    fn changing_the_sort_resets_the_page() {
        let params = ViewParams::new(2)
            .with_page(2)
            .with_sort(SortKey::Contributions, SortDirection::Descending);

        assert_eq!(params.page(), 1);
    }

    #[test]
    fn zero_page_size_never_divides_by_zero() {
        let records = fixture();

        let page = build_view(&records, &ViewParams::new(0));

        assert_eq!(page.total_pages(), 5);
        assert_eq!(page.items().len(), 1);
    }

    #[test]
    fn status_sorts_inactive_before_active_ascending() {
        let records = fixture();

        let sorted = filter_and_sort(
            &records,
            &ViewParams::default().with_sort(SortKey::Status, SortDirection::Ascending),
        );

        assert_eq!(
            sorted.iter().map(|m| m.id()).collect::<Vec<_>>(),
            vec![2, 5, 1, 3, 4]
        );
    }

    #[test]
    fn facet_ties_keep_insertion_order() {
        let records = fixture();

        let sorted = filter_and_sort(
            &records,
            &ViewParams::default().with_sort(SortKey::Facet, SortDirection::Ascending),
        );

        // Kanchanaburi: 2 before 5; Suphan Buri: 1 before 3.
        assert_eq!(
            sorted.iter().map(|m| m.id()).collect::<Vec<_>>(),
            vec![2, 5, 1, 3, 4]
        );
    }

    #[test]
    fn descending_reverses_the_comparator_but_not_tie_order() {
        let records = fixture();

        let sorted = filter_and_sort(
            &records,
            &ViewParams::default().with_sort(SortKey::Facet, SortDirection::Descending),
        );

        // Ties still read in insertion order within each facet.
        assert_eq!(
            sorted.iter().map(|m| m.id()).collect::<Vec<_>>(),
            vec![4, 1, 3, 2, 5]
        );
    }

    #[test]
    fn distinct_keys_reverse_exactly() {
        let records = fixture();

        let asc = filter_and_sort(
            &records,
            &ViewParams::default().with_sort(SortKey::JoinDate, SortDirection::Ascending),
        );
        let mut desc = filter_and_sort(
            &records,
            &ViewParams::default().with_sort(SortKey::JoinDate, SortDirection::Descending),
        );
        desc.reverse();

        assert_eq!(
            asc.iter().map(|m| m.id()).collect::<Vec<_>>(),
            desc.iter().map(|m| m.id()).collect::<Vec<_>>()
        );
    }

    prop_compose! {
        fn arb_seed()(
            first in "[a-z]{1,8}",
            facet_idx in 0..FACETS.len(),
            female in any::<bool>(),
            tag_bits in 0u8..8,
            contributions in 0u32..40,
            days_ago in 0i64..400,
        ) -> (String, usize, bool, u8, u32, i64) {
            (first, facet_idx, female, tag_bits, contributions, days_ago)
        }
    }

    fn build_members(seeds: Vec<(String, usize, bool, u8, u32, i64)>) -> Vec<Member> {
        seeds
            .into_iter()
            .enumerate()
            .map(|(i, (first, facet_idx, female, tag_bits, contributions, days_ago))| {
                let tags: BTreeSet<String> = TAGS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| tag_bits & (1 << bit) != 0)
                    .map(|(_, t)| (*t).to_owned())
                    .collect();

                Member::new(
                    i as i64 + 1,
                    first.clone(),
                    "Test".to_owned(),
                    format!("{}{}@example.com", first, i),
                    if female { Gender::Female } else { Gender::Male },
                    FACETS[facet_idx].to_owned(),
                    25,
                    NOW - Duration::days(days_ago),
                    None,
                    contributions,
                    None,
                    tags,
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn filtered_set_is_exactly_the_matching_subset(
            seeds in proptest::collection::vec(arb_seed(), 0..40),
            facet_idx in proptest::option::of(0..FACETS.len()),
            female in proptest::option::of(any::<bool>()),
            tag_idx in proptest::option::of(0..TAGS.len()),
            search in "[a-z]{0,2}",
        ) {
            let records = build_members(seeds);
            let params = ViewParams::default()
                .with_facet(facet_idx.map(|i| FACETS[i].to_owned()))
                .with_gender(female.map(|f| if f { Gender::Female } else { Gender::Male }))
                .with_tag(tag_idx.map(|i| TAGS[i].to_owned()))
                .with_search(search.clone());

            let filtered = filter_and_sort(&records, &params);
            let filtered_ids: BTreeSet<i64> = filtered.iter().map(|m| m.id()).collect();

            for m in &filtered {
                prop_assert!(records.iter().any(|r| r.id() == m.id()));
            }

            for record in &records {
                let facet_ok = facet_idx.map_or(true, |i| record.facet() == FACETS[i]);
                let gender_ok = female.map_or(true, |f| {
                    record.gender() == if f { Gender::Female } else { Gender::Male }
                });
                let tag_ok = tag_idx.map_or(true, |i| record.tags().contains(TAGS[i]));
                let needle = search.to_lowercase();
                let search_ok = needle.is_empty()
                    || record.full_name().to_lowercase().contains(&needle)
                    || record.email().to_lowercase().contains(&needle);

                prop_assert_eq!(
                    facet_ok && gender_ok && tag_ok && search_ok,
                    filtered_ids.contains(&record.id())
                );
            }
        }

        #[test]
        fn concatenated_pages_reproduce_the_filtered_set(
            seeds in proptest::collection::vec(arb_seed(), 0..40),
            page_size in 1usize..7,
        ) {
            let records = build_members(seeds);
            let params = ViewParams::new(page_size);

            let expected: Vec<i64> = filter_and_sort(&records, &params)
                .iter()
                .map(|m| m.id())
                .collect();

            let first = build_view(&records, &params);
            prop_assert!(first.total_pages() >= 1);

            let mut collected = Vec::new();
            for page in 1..=first.total_pages() {
                let view = build_view(&records, &params.clone().with_page(page));
                collected.extend(view.items().iter().map(|m| m.id()));
            }

            prop_assert_eq!(collected, expected);
        }

        #[test]
        fn sorting_is_stable_under_ties(
            seeds in proptest::collection::vec(arb_seed(), 0..40),
        ) {
            let records = build_members(seeds);
            let params = ViewParams::default().with_sort(SortKey::Facet, SortDirection::Ascending);

            let sorted = filter_and_sort(&records, &params);

            for window in sorted.windows(2) {
                if window[0].facet() == window[1].facet() {
                    // Equal keys: ids are positions here, so order must rise.
                    prop_assert!(window[0].id() < window[1].id());
                }
            }
        }
    }
}
