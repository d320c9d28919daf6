//! Redacting wrapper for credentials
//!
//! Access tokens travel as `Sensitive<String>`: formatting one with `{}` or
//! `{:?}` prints a placeholder, so a token dropped into a log field or an
//! error message leaks nothing.

use std::fmt;

/// Printed in place of the wrapped value
pub const REDACTED: &str = "***REDACTED***";

/// A value that formats as [`REDACTED`]
///
/// ```
/// use pollx_core_types::Sensitive;
///
/// let token = Sensitive::new("4f1c0a");
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(token.expose(), &"4f1c0a");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// The raw value, for a response body or a query parameter
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_never_shows_the_token() {
        let token = Sensitive::new(String::from("grant-token-123"));

        assert_eq!(format!("{}", token), REDACTED);
        assert_eq!(format!("{:?}", token), REDACTED);
        assert!(!format!("{:?}", Some(&token)).contains("grant-token"));
    }

    #[test]
    fn test_equality_compares_the_wrapped_value() {
        let a: Sensitive<String> = "abc".to_string().into();
        assert_eq!(a, Sensitive::new("abc".to_string()));
        assert_ne!(a, Sensitive::new("abd".to_string()));
        assert_eq!(a.expose(), "abc");
    }
}
