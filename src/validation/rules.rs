//! Custom constraints referenced from `#[validate(custom(function = ...))]`.

use std::{borrow::Cow, collections::HashSet};
use validator::ValidationError;

use super::coerce::parse_identifier;

pub const INVALID_IDENTIFIER: &str = "must be a valid identifier";

pub const MIN_COMPARED_TARIFFS: usize = 2;
pub const MAX_COMPARED_TARIFFS: usize = 4;

/// MIME types accepted for provider logos.
pub const LOGO_CONTENT_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/svg+xml"];

fn violation(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Lowercase ASCII words joined by single hyphens, e.g. `fast-host-24`.
pub fn slug(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value
            .split('-')
            .all(|word| !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(violation(
            "slug",
            "must be lowercase letters and digits separated by single hyphens",
        ))
    }
}

/// The tariffs picked for one comparison: a bounded number of distinct, well-formed ids.
/// Cardinality is checked first so an undersized list reports the count, not its contents.
pub fn tariff_selection(ids: &[String]) -> Result<(), ValidationError> {
    if ids.len() < MIN_COMPARED_TARIFFS {
        return Err(violation(
            "length",
            format!("minimum {MIN_COMPARED_TARIFFS} tariffs"),
        ));
    }
    if ids.len() > MAX_COMPARED_TARIFFS {
        return Err(violation(
            "length",
            format!("maximum {MAX_COMPARED_TARIFFS} tariffs"),
        ));
    }
    if let Some(position) = ids.iter().position(|id| parse_identifier(id).is_none()) {
        return Err(violation(
            "identifier",
            format!("entry {position} {INVALID_IDENTIFIER}"),
        ));
    }
    let mut seen = HashSet::new();
    if !ids.iter().all(|id| seen.insert(id.to_ascii_lowercase())) {
        return Err(violation("distinct", "tariffs must be distinct"));
    }
    Ok(())
}

pub fn logo_content_type(value: &str) -> Result<(), ValidationError> {
    if LOGO_CONTENT_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(violation(
            "content_type",
            format!("must be one of {}", LOGO_CONTENT_TYPES.join(", ")),
        ))
    }
}

/// Phone numbers: digits with optional spaces, dashes, parentheses and a leading `+`.
pub fn phone(value: &str) -> Result<(), ValidationError> {
    let body = value.strip_prefix('+').unwrap_or(value);
    let digits = body.chars().filter(char::is_ascii_digit).count();
    let allowed = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'));
    if allowed && (5..=20).contains(&digits) {
        Ok(())
    } else {
        Err(violation("phone", "must be a valid phone number"))
    }
}
