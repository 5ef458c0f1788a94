use dinoqode_core::PartialRecord;

use crate::artwork::{album_id_from_image_url, background_image_url, best_srcset_candidate};
use crate::page::PageContext;

/// Reads the card fields of one service's page.
///
/// Implementations only locate values; a field that cannot be found stays
/// `None` and is reported later by the validator.
pub trait ExtractionStrategy: Send + Sync {
    fn extract(&self, page: &PageContext) -> PartialRecord;
}

/// Apple Music album/track pages.
///
/// - id: `meta[name="apple:content_id"]` content
/// - title: `aria-label` of `span.product-header__title`
/// - artist: text of the first link in `span.product-header__identity`
/// - cover: highest-density candidate of the first `<source>` in `picture.we-artwork`
#[derive(Debug, Default, Clone, Copy)]
pub struct AppleMusicStrategy;

impl ExtractionStrategy for AppleMusicStrategy {
    fn extract(&self, page: &PageContext) -> PartialRecord {
        let artwork_url = page
            .attr("picture.we-artwork source:first-child", "srcset")
            .and_then(|srcset| best_srcset_candidate(&srcset))
            .and_then(|url| page.resolve(&url));

        PartialRecord {
            id: page.attr(r#"meta[name="apple:content_id"]"#, "content"),
            title: page.attr("span.product-header__title", "aria-label"),
            artist: page.text("span.product-header__identity a"),
            artwork_url,
        }
    }
}

/// Amazon Music album pages. The id is the last segment of the page path.
#[derive(Debug, Default, Clone, Copy)]
pub struct AmazonMusicStrategy;

impl ExtractionStrategy for AmazonMusicStrategy {
    fn extract(&self, page: &PageContext) -> PartialRecord {
        PartialRecord {
            id: page.last_path_segment(),
            title: page.text(".playlistHeaderDescription .viewTitle"),
            artist: page.text(".playlistHeaderDescription .artistLink a"),
            artwork_url: page
                .attr(".albumArtWrapper img.renderImage", "src")
                .and_then(|src| page.resolve(&src)),
        }
    }
}

/// Spotify web player pages. The id is the last segment of the page path and
/// the cover comes from the `background-image` of the cover art element.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpotifyStrategy;

impl ExtractionStrategy for SpotifyStrategy {
    fn extract(&self, page: &PageContext) -> PartialRecord {
        let artwork_url = page
            .attr(".media-object .cover-art-image", "style")
            .and_then(|style| background_image_url(&style))
            .and_then(|url| page.resolve(&url));

        PartialRecord {
            id: page.last_path_segment(),
            title: page.attr(".media-object .mo-info-name", "title"),
            artist: page.text(".media-object .react-contextmenu-wrapper a"),
            artwork_url,
        }
    }
}

/// ALDI life / Napster pages. Both id and cover come from the blurred
/// background image, whose URL has the form `…/images/Alb.<id>/<file>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AldiLifeStrategy;

impl ExtractionStrategy for AldiLifeStrategy {
    fn extract(&self, page: &PageContext) -> PartialRecord {
        let background = page
            .attr(".blurred-image .image", "style")
            .and_then(|style| background_image_url(&style));

        PartialRecord {
            id: background.as_deref().and_then(album_id_from_image_url),
            title: page.text(".album-title"),
            artist: page.text(".artist-name"),
            artwork_url: background.and_then(|url| page.resolve(&url)),
        }
    }
}
