use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::batch::COMMENT_MARKER;
use crate::command::{EncodedCommand, ItemKind, FIELD_SEPARATOR, HEADER_SEPARATOR};
use crate::title::normalize_title;

/// Raw strategy output; any field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork_url: Option<String>,
}

/// A fully validated extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub service: String,
    pub item_kind: ItemKind,
    pub id: String,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
}

impl ExtractedRecord {
    /// Serializes the record into its card line. Cannot fail for a validated record.
    pub fn encode(&self) -> EncodedCommand {
        EncodedCommand {
            service: self.service.clone(),
            item_kind: self.item_kind,
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            artwork_url: self.artwork_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Service,
    Id,
    Title,
    Artist,
    Cover,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Service => "service",
            Field::Id => "id",
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Cover => "cover",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no {0} found")]
    MissingField(Field),
    #[error("{field} contains reserved character {character:?}")]
    ReservedCharacter { field: Field, character: char },
}

/// Checks a strategy result and builds the record, normalizing the title.
///
/// Presence is checked first, in the order id, title, artist, cover, and the
/// first missing field is reported. Then every value is checked against the
/// line format: no `|`, `#` or line breaks anywhere, and no `:` in the header
/// values (service, id). `#` would start a comment in the batch file.
pub fn validate(
    service: &str,
    item_kind: ItemKind,
    partial: PartialRecord,
) -> Result<ExtractedRecord, ValidationError> {
    let id = require(partial.id, Field::Id)?;
    let title = require(partial.title, Field::Title)?;
    let artist = require(partial.artist, Field::Artist)?;
    let artwork_url = require(partial.artwork_url, Field::Cover)?;
    if service.is_empty() {
        return Err(ValidationError::MissingField(Field::Service));
    }

    check_header_value(Field::Service, service)?;
    check_header_value(Field::Id, &id)?;
    check_payload_value(Field::Title, &title)?;
    check_payload_value(Field::Artist, &artist)?;
    check_payload_value(Field::Cover, &artwork_url)?;

    Ok(ExtractedRecord {
        service: service.to_string(),
        item_kind,
        id,
        title: normalize_title(&title),
        artist,
        artwork_url,
    })
}

fn require(value: Option<String>, field: Field) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

fn check_header_value(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.contains(HEADER_SEPARATOR) {
        return Err(ValidationError::ReservedCharacter {
            field,
            character: HEADER_SEPARATOR,
        });
    }
    check_payload_value(field, value)
}

fn check_payload_value(field: Field, value: &str) -> Result<(), ValidationError> {
    match value
        .chars()
        .find(|c| matches!(*c, FIELD_SEPARATOR | COMMENT_MARKER | '\n' | '\r'))
    {
        Some(character) => Err(ValidationError::ReservedCharacter { field, character }),
        None => Ok(()),
    }
}
