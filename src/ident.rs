//! Identifier case and plural conversions.
//!
//! Every generated path, token and symbol is keyed off these functions, so
//! they must stay pure: the same input always yields the same output.

/// `UserAuthProvider` -> `user-auth-provider`
pub fn to_kebab(s: &str) -> String {
    split_boundaries(s, '-')
}

/// `UserAuthProvider` -> `user_auth_provider`
pub fn to_snake(s: &str) -> String {
    split_boundaries(s, '_')
}

/// `UserAuthProvider` -> `USER_AUTH_PROVIDER`
pub fn to_screaming_snake(s: &str) -> String {
    to_snake(s).to_uppercase()
}

/// `S3Object` -> `s3Object`. Only the first character is lowered.
pub fn to_var_name(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `first_name` -> `First name`
pub fn to_sentence(s: &str) -> String {
    let spaced = s.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Suffix-only English pluralization.
///
/// Irregular nouns come out wrong (`Person` -> `Persons`); callers that care
/// must special-case them.
pub fn pluralize(s: &str) -> String {
    if s.ends_with('s') {
        format!("{s}es")
    } else if s.ends_with("ey") {
        format!("{s}s")
    } else if let Some(stem) = s.strip_suffix('y') {
        format!("{stem}ies")
    } else {
        format!("{s}s")
    }
}

// A separator goes between an ASCII lowercase letter or digit and the ASCII
// uppercase letter that follows it; the result is lowercased.
fn split_boundaries(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if let Some(p) = prev {
            if (p.is_ascii_lowercase() || p.is_ascii_digit()) && c.is_ascii_uppercase() {
                out.push(sep);
            }
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }
    out
}
