use iterbene_shared::PersonName;

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Display name for a record: `fullName` when present, otherwise the joined
/// first and last names, otherwise an empty string.
pub fn full_name(name: &PersonName) -> String {
    if let Some(full) = name.full_name.as_deref().filter(|s| !s.trim().is_empty()) {
        return full.to_string();
    }
    [non_blank(&name.first_name), non_blank(&name.last_name)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a display name into first name and the rest.
pub fn split_full_name(full: &str) -> (String, String) {
    let mut parts = full.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Up to two uppercase initials for avatar placeholders.
pub fn initials(name: &PersonName) -> String {
    let full = full_name(name);
    let words: Vec<&str> = full.split_whitespace().collect();
    let picked: Vec<&str> = match words.as_slice() {
        [] => vec![],
        [only] => vec![*only],
        [first, .., last] => vec![*first, *last],
    };
    picked
        .into_iter()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
