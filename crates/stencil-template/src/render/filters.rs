//! Placeholder filters
//!
//! `snakecase` and `camelcase` turn free-form project names into
//! identifiers: `"My Web-App"` becomes `my_web_app` and `MyWebApp`.

use crate::error::RenderError;

/// Filter names accepted after `|`
pub const FILTERS: [&str; 5] = ["snakecase", "camelcase", "lower", "upper", "trim"];

/// Lowercase ASCII slug: runs of anything but letters and digits collapse
/// into `separator`, none at either end
#[must_use]
pub fn slugify(text: &str, separator: char) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending && !slug.is_empty() {
                slug.push(separator);
            }
            pending = false;
            slug.extend(c.to_lowercase());
        } else {
            pending = true;
        }
    }
    slug
}

/// Uppercase every letter that follows a non-letter, lowercase the rest
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if after_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            titled.push(c);
            after_letter = false;
        }
    }
    titled
}

/// `my_web_app`
#[must_use]
pub fn snakecase(text: &str) -> String {
    slugify(text, '_')
}

/// `MyWebApp`
#[must_use]
pub fn camelcase(text: &str) -> String {
    title_case(&slugify(text, '-')).replace('-', "")
}

/// Apply filter `name` to `value`
///
/// # Errors
/// [`RenderError::UnknownFilter`] for a name outside [`FILTERS`].
pub fn apply(name: &str, value: &str) -> Result<String, RenderError> {
    match name {
        "snakecase" => Ok(snakecase(value)),
        "camelcase" => Ok(camelcase(value)),
        "lower" => Ok(value.to_lowercase()),
        "upper" => Ok(value.to_uppercase()),
        "trim" => Ok(value.trim().to_string()),
        other => Err(RenderError::UnknownFilter(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn snakecase_examples() {
        assert_eq!(snakecase("My Web-App"), "my_web_app");
        assert_eq!(snakecase("  leading and trailing  "), "leading_and_trailing");
        assert_eq!(snakecase("already_snake"), "already_snake");
        assert_eq!(snakecase("v2 API"), "v2_api");
    }

    #[test]
    fn camelcase_examples() {
        assert_eq!(camelcase("My Web-App"), "MyWebApp");
        assert_eq!(camelcase("my_app"), "MyApp");
        assert_eq!(camelcase("app2go"), "App2Go");
    }

    #[test]
    fn simple_filters() {
        assert_eq!(apply("lower", "MiXeD").unwrap(), "mixed");
        assert_eq!(apply("upper", "MiXeD").unwrap(), "MIXED");
        assert_eq!(apply("trim", "  x ").unwrap(), "x");
    }

    #[test]
    fn unknown_filter() {
        let err = apply("reverse", "abc").unwrap_err();
        assert!(matches!(err, RenderError::UnknownFilter(name) if name == "reverse"));
    }

    proptest! {
        #[test]
        fn prop_snakecase_is_identifier_like(text in "[a-zA-Z0-9 ._/-]{0,32}") {
            let snake = snakecase(&text);
            prop_assert!(!snake.starts_with('_') && !snake.ends_with('_'));
            prop_assert!(!snake.contains("__"));
            prop_assert_eq!(snakecase(&snake), snake.clone());
        }

        #[test]
        fn prop_camelcase_has_no_separators(text in "[a-zA-Z0-9 _-]{0,32}") {
            let camel = camelcase(&text);
            prop_assert!(camel.chars().all(char::is_alphanumeric));
        }
    }
}
