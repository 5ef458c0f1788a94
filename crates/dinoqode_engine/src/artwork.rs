//! Helpers that pull artwork URLs out of inline styles and responsive image sets.
use std::sync::LazyLock;

use regex::Regex;

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')]+?)["']?\s*\)"#).expect("css url pattern is valid")
});
static ALBUM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"images/Alb\.([^/]+)/").expect("album id pattern is valid"));

/// First `url(...)` value inside an inline style such as
/// `background-image: url("https://…/cover.jpg")`.
pub fn background_image_url(style: &str) -> Option<String> {
    CSS_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|u| !u.is_empty())
}

/// Album id embedded in an image URL of the form `…/images/Alb.<id>/<file>`.
pub fn album_id_from_image_url(url: &str) -> Option<String> {
    ALBUM_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Picks the candidate with the largest descriptor from a `srcset` value.
///
/// Density (`3x`) and width (`600w`) descriptors compare by their number; a
/// candidate without a descriptor counts as `1x`. Ties keep the earlier one.
pub fn best_srcset_candidate(srcset: &str) -> Option<String> {
    let mut best: Option<(f32, &str)> = None;
    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let weight = parts.next().map(descriptor_value).unwrap_or(Some(1.0));
        let Some(weight) = weight else {
            continue;
        };
        if best.map_or(true, |(w, _)| weight > w) {
            best = Some((weight, url));
        }
    }
    best.map(|(_, url)| url.to_string())
}

fn descriptor_value(descriptor: &str) -> Option<f32> {
    let number = descriptor
        .strip_suffix('x')
        .or_else(|| descriptor.strip_suffix('w'))?;
    number.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
