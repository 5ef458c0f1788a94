use std::sync::LazyLock;

use regex::Regex;

static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bFolge (\d{1,3}) - ").expect("episode marker pattern is valid")
});

/// Collapses the `"Folge <n> - "` episode marker into a `"Folge <n>: "` subtitle.
///
/// Titles without the marker are returned unchanged, and the rewritten form no
/// longer matches, so applying this twice equals applying it once.
pub fn normalize_title(title: &str) -> String {
    EPISODE_MARKER
        .replace_all(title, "Folge ${1}: ")
        .into_owned()
}
