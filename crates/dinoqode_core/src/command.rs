use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Separator between `service`, `kind` and `id` in the command header.
pub const HEADER_SEPARATOR: char = ':';
/// Separator between the header and the payload fields.
pub const FIELD_SEPARATOR: char = '|';

/// Whether a card points at a whole album or a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Album,
    Song,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Album => "album",
            ItemKind::Song => "song",
        }
    }

    /// Interprets the operator's free-text answer; blank input means album.
    pub fn from_prompt(input: &str) -> Result<Self, CommandParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(ItemKind::Album);
        }
        trimmed.parse()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("album") {
            Ok(ItemKind::Album)
        } else if s.eq_ignore_ascii_case("song") {
            Ok(ItemKind::Song)
        } else {
            Err(CommandParseError::UnknownItemKind(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("expected 4 '|'-separated fields, found {0}")]
    FieldCount(usize),
    #[error("expected header '<service>:<kind>:<id>', found {0:?}")]
    Header(String),
    #[error("unknown item kind {0:?} (expected album or song)")]
    UnknownItemKind(String),
    #[error("empty {0} field")]
    EmptyField(&'static str),
}

/// One card line: `<service>:<kind>:<id>|<title>|<artist>|<artwork_url>`.
///
/// `Display` produces the wire form and `FromStr` parses it back. Values are
/// expected to be free of `|` and line breaks, and the header values free of
/// `:`; [`crate::validate`] enforces this before a command is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedCommand {
    pub service: String,
    pub item_kind: ItemKind,
    pub id: String,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
}

impl fmt::Display for EncodedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{service}{hs}{kind}{hs}{id}{fs}{title}{fs}{artist}{fs}{art}",
            service = self.service,
            kind = self.item_kind,
            id = self.id,
            title = self.title,
            artist = self.artist,
            art = self.artwork_url,
            hs = HEADER_SEPARATOR,
            fs = FIELD_SEPARATOR,
        )
    }
}

impl FromStr for EncodedCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [header, title, artist, artwork_url] = fields.as_slice() else {
            return Err(CommandParseError::FieldCount(fields.len()));
        };

        let header_parts: Vec<&str> = header.split(HEADER_SEPARATOR).collect();
        let [service, kind, id] = header_parts.as_slice() else {
            return Err(CommandParseError::Header(header.to_string()));
        };

        let item_kind: ItemKind = kind.parse()?;
        let non_empty = |name: &'static str, value: &str| {
            if value.is_empty() {
                Err(CommandParseError::EmptyField(name))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(EncodedCommand {
            service: non_empty("service", service)?,
            item_kind,
            id: non_empty("id", id)?,
            title: non_empty("title", title)?,
            artist: non_empty("artist", artist)?,
            artwork_url: non_empty("cover", artwork_url)?,
        })
    }
}
