//! Splitting of structured variable names such as
//! `SEAFEVENTS__INDEX0x20FILES__enabled` into their parts.

use crate::error::{GenerateError, Result};

/// Joins prefix, section and field in a variable name.
pub const SEPARATOR: &str = "__";

/// Reserved characters and the token that stands for them inside a name
/// segment. `0x20` follows the Gitea convention of hex-encoding the
/// character; `%20` is its URL-encoded spelling.
pub const ESCAPES: &[(&str, char)] = &[("0x20", ' '), ("%20", ' ')];

/// A decoded `PREFIX__SECTION__FIELD` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionedKey<'a> {
    pub prefix: &'a str,
    pub section: String,
    pub field: &'a str,
}

/// A decoded `PREFIX__FIELD` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatKey<'a> {
    pub prefix: &'a str,
    pub field: &'a str,
}

pub struct KeyDecoder;

impl KeyDecoder {
    pub fn decode_sectioned(key: &str) -> Result<SectionedKey<'_>> {
        match *split(key, 3, "PREFIX__SECTION__KEY")?.as_slice() {
            [prefix, section, field] => Ok(SectionedKey {
                prefix,
                // The split above runs on the raw name, so a decoded
                // character can never act as a separator.
                section: Self::unescape(section),
                field,
            }),
            _ => unreachable!("split checked the part count"),
        }
    }

    pub fn decode_flat(key: &str) -> Result<FlatKey<'_>> {
        match *split(key, 2, "PREFIX__KEY")?.as_slice() {
            [prefix, field] => Ok(FlatKey { prefix, field }),
            _ => unreachable!("split checked the part count"),
        }
    }

    /// Replaces every escape token with the character it encodes.
    pub fn unescape(segment: &str) -> String {
        ESCAPES
            .iter()
            .fold(segment.to_string(), |acc, (token, ch)| {
                acc.replace(token, &ch.to_string())
            })
    }
}

fn split<'a>(key: &'a str, parts: usize, expected: &'static str) -> Result<Vec<&'a str>> {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();
    if segments.len() != parts || segments.iter().any(|s| s.is_empty()) {
        return Err(GenerateError::MalformedKey {
            key: key.to_string(),
            expected,
        });
    }
    Ok(segments)
}
