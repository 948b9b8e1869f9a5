/*!
 * Parameter name composition.
 *
 * Qualified parameter names are built by appending a capitalized member name
 * to a prefix: prefix `Address` and member `city` give `AddressCity`.
 */

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `prefix` followed by the capitalized member name
pub fn qualify(prefix: &str, member: &str) -> String {
    format!("{prefix}{}", capitalize(member))
}
