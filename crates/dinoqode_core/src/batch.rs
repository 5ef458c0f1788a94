use std::fmt;

use crate::command::EncodedCommand;

/// Everything after this character on a batch line is a comment.
pub const COMMENT_MARKER: char = '#';

/// How the generator lays out card backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    #[default]
    Simplex,
    Duplex,
}

impl PrintMode {
    /// Maps the submitted form value. Only `dublex` (the creator page's value)
    /// and `duplex` select duplex printing; anything else is simplex.
    pub fn from_form_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("dublex") || v.eq_ignore_ascii_case("duplex") => {
                PrintMode::Duplex
            }
            _ => PrintMode::Simplex,
        }
    }

    pub fn is_duplex(self) -> bool {
        matches!(self, PrintMode::Duplex)
    }
}

impl fmt::Display for PrintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintMode::Simplex => f.write_str("simplex"),
            PrintMode::Duplex => f.write_str("duplex"),
        }
    }
}

/// A submitted set of card lines plus the print mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub commands: String,
    pub print_mode: PrintMode,
}

/// Line accounting for a batch, counted the way the generator reads the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Lines that parse as an [`EncodedCommand`].
    pub cards: usize,
    /// Non-empty lines in another format (`cmd:`, `tunein:`, ...).
    pub other: usize,
}

impl Batch {
    pub fn new(commands: impl Into<String>, print_mode: PrintMode) -> Self {
        Self {
            commands: commands.into(),
            print_mode,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.lines().next().is_none()
    }

    /// Content lines: trimmed, with comments stripped and blanks skipped.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.commands
            .lines()
            .map(|line| line.split(COMMENT_MARKER).next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
    }

    pub fn summary(&self) -> BatchSummary {
        self.lines()
            .fold(BatchSummary::default(), |mut summary, line| {
                if line.parse::<EncodedCommand>().is_ok() {
                    summary.cards += 1;
                } else {
                    summary.other += 1;
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_dublex_and_duplex_select_duplex() {
        assert_eq!(PrintMode::from_form_value(Some("dublex")), PrintMode::Duplex);
        assert_eq!(PrintMode::from_form_value(Some("Duplex")), PrintMode::Duplex);
        assert_eq!(PrintMode::from_form_value(Some("simplex")), PrintMode::Simplex);
        assert_eq!(PrintMode::from_form_value(None), PrintMode::Simplex);
    }

    #[test]
    fn summary_skips_comments_and_blank_lines() {
        let batch = Batch::new(
            "# header\n\nspotify:album:1|T|A|http://x/a.png\r\ncmd:playpause\n   # note\n",
            PrintMode::Simplex,
        );
        assert_eq!(batch.summary(), BatchSummary { cards: 1, other: 1 });
        assert!(!batch.is_blank());
    }

    #[test]
    fn comment_only_batch_is_blank() {
        assert!(Batch::new("  \n# nothing\n", PrintMode::Duplex).is_blank());
    }
}
