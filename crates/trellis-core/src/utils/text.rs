//! String utility functions used by routing conventions.
//!
//! Controller class names are derived from URL segments with [`camelize`];
//! URLs are built back from class names with [`underscore`].

/// Converts an underscored or dashed name to `CamelCase`.
///
/// # Examples
///
/// ```
/// use trellis_core::utils::text::camelize;
///
/// assert_eq!(camelize("user_accounts"), "UserAccounts");
/// assert_eq!(camelize("sales-report"), "SalesReport");
/// assert_eq!(camelize("Users"), "Users");
/// ```
pub fn camelize(s: &str) -> String {
    s.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(capfirst)
        .collect()
}

/// Converts a `CamelCase` name to `snake_case`.
///
/// # Examples
///
/// ```
/// use trellis_core::utils::text::underscore;
///
/// assert_eq!(underscore("UserAccounts"), "user_accounts");
/// assert_eq!(underscore("users"), "users");
/// ```
pub fn underscore(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Capitalizes the first character of a string.
///
/// # Examples
///
/// ```
/// use trellis_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("hello"), "Hello");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
