//! Token casing for canonical filenames.

/// Tokens rendered fully uppercase: country codes, roman numerals and
/// broadcaster/initialism tokens.
const SPECIAL_CASES: &[&str] = &[
    "USA", "FBI", "BBC", "US", "AU", "PL", "IE", "NZ", "FR", "DE", "JP", "UK", "QI", "XL",
    "WWII", "WPC", "VI", "VII", "VIII", "VIIII", "IX", "II", "III", "IV", "DCI", "HD", "W1A",
    "HBO", "100K",
];

pub(crate) fn is_special_case(token: &str) -> bool {
    let upper = token.to_uppercase();
    SPECIAL_CASES.contains(&upper.as_str())
}

/// Uppercase for special-case tokens, otherwise first letter upper and the
/// rest lower.
pub(crate) fn case_token(token: &str) -> String {
    if is_special_case(token) {
        return token.to_uppercase();
    }
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
