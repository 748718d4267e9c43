//! serde `deserialize_with` helpers that normalise untrusted input before constraints run.

use serde::{
    Deserialize, Deserializer,
    de::{self, DeserializeOwned, IntoDeserializer, value::StringDeserializer},
};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::rules::INVALID_IDENTIFIER;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    String(String),
}

/// Trims surrounding whitespace.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Trims surrounding whitespace; a blank string counts as absent.
pub fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Trims and lower-cases an e-mail address.
pub fn email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_lowercase())
}

/// Trims every element of a string list.
pub fn trimmed_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Vec::<String>::deserialize(deserializer)?
        .into_iter()
        .map(|s| s.trim().to_string())
        .collect())
}

/// Accepts a JSON number or a numeric string (query strings carry only strings).
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => parse_number(&s),
    }
}

/// Like [`number`], but `null` and blank strings count as absent.
pub fn number_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => parse_number(&s).map(Some),
    }
}

fn parse_number<T, E>(raw: &str) -> Result<T, E>
where
    T: FromStr,
    T::Err: Display,
    E: de::Error,
{
    raw.trim()
        .parse()
        .map_err(|_| E::custom(format!("expected a number, got `{raw}`")))
}

/// An optional unit-variant enum sent as text. Surrounding whitespace is ignored; `null` and
/// blank strings count as absent.
pub fn enum_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => {
            let inner: StringDeserializer<de::value::Error> =
                raw.trim().to_string().into_deserializer();
            T::deserialize(inner).map(Some).map_err(de::Error::custom)
        }
    }
}

/// An identifier in canonical form.
pub fn id<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_identifier(&raw).ok_or_else(|| de::Error::custom(INVALID_IDENTIFIER))
}

/// An optional identifier; `null` and blank strings count as absent.
pub fn id_opt<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_identifier(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(INVALID_IDENTIFIER)),
    }
}

/// parse_identifier
///
/// Identifiers are UUIDs in the hyphenated 8-4-4-4-12 hex layout. The braced, URN and
/// un-hyphenated spellings `Uuid::parse_str` would also accept are refused, so every id has a
/// single textual form.
pub fn parse_identifier(raw: &str) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.len() != 36 {
        return None;
    }
    let well_formed = raw.char_indices().all(|(i, ch)| match i {
        8 | 13 | 18 | 23 => ch == '-',
        _ => ch.is_ascii_hexdigit(),
    });
    if !well_formed {
        return None;
    }
    Uuid::parse_str(raw).ok()
}
