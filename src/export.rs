use std::borrow::Cow;

use crate::member::Member;

/// Renders records as CSV: a header of `Name`, the facet label,
/// `Gender`, `Email` and `Contributions`, then one row per record in
/// the order given. Fields containing separators are quoted so a comma
/// in a name cannot corrupt the file.
pub fn to_csv(members: &[&Member], facet_label: &str) -> String {
    let mut rows = Vec::with_capacity(members.len() + 1);

    rows.push(row(&[
        "Name",
        facet_label,
        "Gender",
        "Email",
        "Contributions",
    ]));

    for member in members {
        rows.push(row(&[
            &member.full_name(),
            member.facet(),
            &member.gender().to_string(),
            member.email(),
            &member.contributions().to_string(),
        ]));
    }

    rows.join("\n")
}

fn row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape(field: &str) -> Cow<str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
