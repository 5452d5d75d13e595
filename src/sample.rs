use std::collections::BTreeSet;

use time::macros::{date, datetime};
use url::Url;

use crate::member::{Gender, Member};

/// Returns the built-in sample roster. It seeds the engine whenever the
/// external source fails or answers with an empty collection, so the
/// dashboard always has something to show.
pub fn members() -> Vec<Member> {
    vec![
        Member::new(
            1,
            "Somchai".to_owned(),
            "Srisuwan".to_owned(),
            "somchai.srisuwan@example.com".to_owned(),
            Gender::Male,
            "Suphan Buri".to_owned(),
            34,
            datetime!(2025-02-11 09:30 UTC),
            Some(date!(1991-04-18)),
            12,
            Some(avatar("somchai")),
            tags(&["Committee"]),
        ),
        Member::new(
            2,
            "Kanya".to_owned(),
            "Phrom".to_owned(),
            "kanya.phrom@example.com".to_owned(),
            Gender::Female,
            "Kanchanaburi".to_owned(),
            27,
            datetime!(2025-03-02 14:05 UTC),
            Some(date!(1998-11-02)),
            5,
            Some(avatar("kanya")),
            tags(&["Volunteer"]),
        ),
        Member::new(
            3,
            "Anong".to_owned(),
            "Chaiyasit".to_owned(),
            "anong.chaiyasit@example.com".to_owned(),
            Gender::Female,
            "Uthai Thani".to_owned(),
            41,
            datetime!(2025-03-21 08:15 UTC),
            None,
            0,
            None,
            BTreeSet::new(),
        ),
        Member::new(
            4,
            "Prasert".to_owned(),
            "Wongsawat".to_owned(),
            "prasert.wongsawat@example.com".to_owned(),
            Gender::Male,
            "Sing Buri".to_owned(),
            52,
            datetime!(2025-04-09 17:45 UTC),
            Some(date!(1973-06-30)),
            23,
            Some(avatar("prasert")),
            tags(&["Committee", "Alumni"]),
        ),
        Member::new(
            5,
            "Malee".to_owned(),
            "Thongdee".to_owned(),
            "malee.thongdee@example.com".to_owned(),
            Gender::Female,
            "Suphan Buri".to_owned(),
            23,
            datetime!(2025-04-28 11:00 UTC),
            Some(date!(2002-01-07)),
            0,
            Some(avatar("malee")),
            BTreeSet::new(),
        ),
    ]
}

fn avatar(slug: &str) -> Url {
    Url::parse(&format!("https://avatars.example.com/{}.png", slug)).expect("parse sample avatar URL")
}

fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}
