use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::member::{Gender, Member};

/// How long a member may stay contribution-free before counting as at
/// risk.
const AT_RISK_AFTER: Duration = Duration::days(30);

/// The window after enrollment during which a member still needs a
/// welcome follow-up.
const WELCOME_WINDOW: Duration = Duration::days(7);

const UPCOMING_BIRTHDAY_DAYS: i64 = 30;
const URGENT_BIRTHDAY_DAYS: i64 = 7;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The number of members carrying one facet value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FacetCount {
    facet: String,
    count: usize,
}

impl FacetCount {
    pub fn facet(&self) -> &str {
        &self.facet
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// The member counts by gender.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct GenderCounts {
    male: usize,
    female: usize,
}

impl GenderCounts {
    pub fn male(&self) -> usize {
        self.male
    }

    pub fn female(&self) -> usize {
        self.female
    }
}

/// A calendar-month cohort of enrollments.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MonthBucket {
    year: i32,
    month: u8,
    count: usize,
}

impl MonthBucket {
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month, 1 through 12.
    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns a chart label such as `"Jan 2025"`.
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_ABBREVIATIONS[(self.month - 1) as usize], self.year)
    }
}

/// One facet's slice of the performance ranking.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FacetPerformance {
    facet: String,
    total: usize,
    active: usize,
    new_this_month: usize,
    engagement_rate: i64,
}

impl FacetPerformance {
    pub fn facet(&self) -> &str {
        &self.facet
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn new_this_month(&self) -> usize {
        self.new_this_month
    }

    pub fn engagement_rate(&self) -> i64 {
        self.engagement_rate
    }
}

/// Integer percentage of `part` in `whole`, defined as 0 when `whole`
/// is 0. None of the dashboard numbers may ever be NaN, infinite, or a
/// panic.
fn percentage(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as i64
    }
}

fn month_key(instant: OffsetDateTime) -> (i32, u8) {
    (instant.year(), u8::from(instant.month()))
}

fn previous_month(year: i32, month: u8) -> (i32, u8) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn created_in_month(member: &Member, year: i32, month: u8) -> bool {
    month_key(member.created_at()) == (year, month)
}

/// Counts members per configured facet, zero-filled, in facet
/// declaration order.
pub fn facet_counts(records: &[Member], facets: &[String]) -> Vec<FacetCount> {
    facets
        .iter()
        .map(|facet| FacetCount {
            facet: facet.clone(),
            count: records.iter().filter(|m| m.facet() == facet.as_str()).count(),
        })
        .collect()
}

pub fn gender_counts(records: &[Member]) -> GenderCounts {
    GenderCounts {
        male: records.iter().filter(|m| m.gender() == Gender::Male).count(),
        female: records.iter().filter(|m| m.gender() == Gender::Female).count(),
    }
}

/// Groups enrollments by calendar month, in chronological order.
pub fn monthly_cohorts(records: &[Member]) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<(i32, u8), usize> = BTreeMap::new();

    for member in records {
        *buckets.entry(month_key(member.created_at())).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), count)| MonthBucket { year, month, count })
        .collect()
}

/// Month-over-month growth of the enrollment cohort, as a rounded
/// percentage. Defined as 0 when last month had no enrollments; that is
/// a policy choice for determinism, not a mathematical identity.
pub fn monthly_growth_rate(records: &[Member], now: OffsetDateTime) -> i64 {
    let (this_year, this_month) = month_key(now);
    let (last_year, last_month) = previous_month(this_year, this_month);

    let this_count = records
        .iter()
        .filter(|m| created_in_month(m, this_year, this_month))
        .count();
    let last_count = records
        .iter()
        .filter(|m| created_in_month(m, last_year, last_month))
        .count();

    if last_count == 0 {
        0
    } else {
        ((this_count as f64 - last_count as f64) / last_count as f64 * 100.0).round() as i64
    }
}

pub fn active_count(records: &[Member]) -> usize {
    records.iter().filter(|m| m.is_active()).count()
}

/// Percentage of members with at least one contribution. 0 on an empty
/// roster.
pub fn engagement_score(records: &[Member]) -> i64 {
    percentage(active_count(records), records.len())
}

/// The retention rate is the engagement score under another name; both
/// appear on the dashboard and must always agree.
pub fn retention_rate(records: &[Member]) -> i64 {
    engagement_score(records)
}

/// Members with no contributions whose enrollment is older than 30
/// days.
pub fn at_risk(records: &[Member], now: OffsetDateTime) -> Vec<&Member> {
    records
        .iter()
        .filter(|m| !m.is_active() && now - m.created_at() > AT_RISK_AFTER)
        .collect()
}

/// Members missing an avatar or an email address.
pub fn incomplete_profiles(records: &[Member]) -> Vec<&Member> {
    records
        .iter()
        .filter(|m| m.image_url().is_none() || m.email().trim().is_empty())
        .collect()
}

/// Members enrolled in the current calendar month, no more than 7 days
/// ago.
pub fn needs_welcome(records: &[Member], now: OffsetDateTime) -> Vec<&Member> {
    let (year, month) = month_key(now);

    records
        .iter()
        .filter(|m| created_in_month(m, year, month) && now - m.created_at() <= WELCOME_WINDOW)
        .collect()
}

/// Members whose birthday recurs within the next 30 days.
pub fn upcoming_birthdays(records: &[Member], now: OffsetDateTime) -> Vec<&Member> {
    birthdays_within(records, now, UPCOMING_BIRTHDAY_DAYS)
}

/// Members whose birthday recurs within the next 7 days.
pub fn urgent_birthdays(records: &[Member], now: OffsetDateTime) -> Vec<&Member> {
    birthdays_within(records, now, URGENT_BIRTHDAY_DAYS)
}

fn birthdays_within(records: &[Member], now: OffsetDateTime, days: i64) -> Vec<&Member> {
    records
        .iter()
        .filter(|m| matches!(days_until_birthday(m, now), Some(d) if (0..=days).contains(&d)))
        .collect()
}

/// Day distance from `now` to the member's birthday recurrence in
/// `now`'s year. A member without a birthday yields `None`, never 0.
fn days_until_birthday(member: &Member, now: OffsetDateTime) -> Option<i64> {
    let birthday = member.birthday()?;

    // A Feb 29 birthday lands on Feb 28 in a non-leap year.
    let recurrence = Date::from_calendar_date(now.year(), birthday.month(), birthday.day())
        .or_else(|_| Date::from_calendar_date(now.year(), Month::February, 28))
        .ok()?;

    Some((recurrence - now.date()).whole_days())
}

/// Ranks the configured facets by engagement rate, descending. Facets
/// with equal rates keep their declaration order.
pub fn facet_performance(
    records: &[Member],
    now: OffsetDateTime,
    facets: &[String],
) -> Vec<FacetPerformance> {
    let (year, month) = month_key(now);

    let mut rows: Vec<FacetPerformance> = facets
        .iter()
        .map(|facet| {
            let total = records.iter().filter(|m| m.facet() == facet.as_str()).count();
            let active = records
                .iter()
                .filter(|m| m.facet() == facet.as_str() && m.is_active())
                .count();
            let new_this_month = records
                .iter()
                .filter(|m| m.facet() == facet.as_str() && created_in_month(m, year, month))
                .count();

            FacetPerformance {
                facet: facet.clone(),
                total,
                active,
                new_this_month,
                engagement_rate: percentage(active, total),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.engagement_rate.cmp(&a.engagement_rate));

    rows
}

/// The most active members, highest contribution count first. Members
/// with no contributions never appear, whatever `count` asks for.
pub fn top_contributors(records: &[Member], count: usize) -> Vec<&Member> {
    let mut contributors: Vec<&Member> = records.iter().filter(|m| m.is_active()).collect();
    contributors.sort_by(|a, b| b.contributions().cmp(&a.contributions()));
    contributors.truncate(count);

    contributors
}

/// The most recently enrolled members, newest first.
pub fn recent_additions(records: &[Member], count: usize) -> Vec<&Member> {
    let mut recent: Vec<&Member> = records.iter().collect();
    recent.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    recent.truncate(count);

    recent
}

/// The full dashboard battery, recomputed from the entire collection
/// whenever the store changes.
#[derive(Clone, Debug, Serialize)]
pub struct Aggregates {
    total: usize,
    facet_counts: Vec<FacetCount>,
    gender_counts: GenderCounts,
    cohorts: Vec<MonthBucket>,
    growth_rate: i64,
    engagement_score: i64,
    retention_rate: i64,
    at_risk: usize,
    incomplete_profiles: usize,
    needs_welcome: usize,
    upcoming_birthdays: usize,
    urgent_birthdays: usize,
    facet_performance: Vec<FacetPerformance>,
}

impl Aggregates {
    pub fn compute(records: &[Member], now: OffsetDateTime, facets: &[String]) -> Self {
        Self {
            total: records.len(),
            facet_counts: facet_counts(records, facets),
            gender_counts: gender_counts(records),
            cohorts: monthly_cohorts(records),
            growth_rate: monthly_growth_rate(records, now),
            engagement_score: engagement_score(records),
            retention_rate: retention_rate(records),
            at_risk: at_risk(records, now).len(),
            incomplete_profiles: incomplete_profiles(records).len(),
            needs_welcome: needs_welcome(records, now).len(),
            upcoming_birthdays: upcoming_birthdays(records, now).len(),
            urgent_birthdays: urgent_birthdays(records, now).len(),
            facet_performance: facet_performance(records, now, facets),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn facet_counts(&self) -> &[FacetCount] {
        &self.facet_counts
    }

    pub fn gender_counts(&self) -> GenderCounts {
        self.gender_counts
    }

    pub fn cohorts(&self) -> &[MonthBucket] {
        &self.cohorts
    }

    pub fn growth_rate(&self) -> i64 {
        self.growth_rate
    }

    pub fn engagement_score(&self) -> i64 {
        self.engagement_score
    }

    pub fn retention_rate(&self) -> i64 {
        self.retention_rate
    }

    pub fn at_risk(&self) -> usize {
        self.at_risk
    }

    pub fn incomplete_profiles(&self) -> usize {
        self.incomplete_profiles
    }

    pub fn needs_welcome(&self) -> usize {
        self.needs_welcome
    }

    pub fn upcoming_birthdays(&self) -> usize {
        self.upcoming_birthdays
    }

    pub fn urgent_birthdays(&self) -> usize {
        self.urgent_birthdays
    }

    pub fn facet_performance(&self) -> &[FacetPerformance] {
        &self.facet_performance
    }
}
