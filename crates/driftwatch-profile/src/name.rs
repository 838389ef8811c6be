use crate::DefinitionError;

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '@' | '.' | '/')
}

/// Normalizes a component or score name.
///
/// The name is lowercased, spaces become `_`, every character outside
/// `[a-z0-9_\-@./]` is dropped and trailing `_` are trimmed.
///
/// # Errors
///
/// Returns [`DefinitionError::InvalidName`] if nothing is left.
///
/// # Examples
///
/// ```
/// use driftwatch_profile::name::normalize_name;
///
/// assert_eq!(normalize_name("Lot Area").unwrap(), "lot_area");
/// assert_eq!(normalize_name("1stFlrSF ").unwrap(), "1stflrsf");
/// assert_eq!(normalize_name("price ($)").unwrap(), "price");
/// assert!(normalize_name("%%%").is_err());
/// ```
pub fn normalize_name(name: &str) -> Result<String, DefinitionError> {
    let normalized = name
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| is_name_char(*c))
        .collect::<String>();
    let normalized = normalized.trim_end_matches('_');
    if normalized.is_empty() {
        return Err(DefinitionError::InvalidName {
            name: name.to_owned(),
            reason: "no valid characters",
        });
    }
    Ok(normalized.to_owned())
}

/// Normalizes a score name. Score names may not contain `@`, which separates
/// profile name and version in tag groups.
pub fn normalize_score_name(name: &str) -> Result<String, DefinitionError> {
    if name.contains('@') {
        return Err(DefinitionError::InvalidName {
            name: name.to_owned(),
            reason: "score names may not contain '@'",
        });
    }
    normalize_name(name)
}
