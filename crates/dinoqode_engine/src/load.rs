use std::path::Path;

use dinoqode_logging::dq_debug;
use thiserror::Error;
use url::Url;

use crate::decode::{decode_page, DecodeError};
use crate::fetch::Fetcher;
use crate::page::PageContext;
use crate::FetchError;

#[derive(Debug, Error)]
pub enum PageLoadError {
    #[error("invalid page url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Downloads `url` and builds a page context from the final (post-redirect) URL.
pub async fn fetch_page(fetcher: &dyn Fetcher, url: &str) -> Result<PageContext, PageLoadError> {
    let output = fetcher.fetch(url).await?;
    let decoded = decode_page(&output.bytes, output.metadata.content_type.as_deref())?;
    dq_debug!(
        "Decoded {} as {} ({:?})",
        output.metadata.final_url,
        decoded.encoding_label,
        decoded.source
    );
    let page_url = parse_url(&output.metadata.final_url)?;
    Ok(PageContext::new(page_url, &decoded.html))
}

/// Builds a page context from a saved HTML file and the URL it was saved from.
pub fn read_page(path: &Path, url: &str) -> Result<PageContext, PageLoadError> {
    let bytes = std::fs::read(path).map_err(|source| PageLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let decoded = decode_page(&bytes, None)?;
    Ok(PageContext::new(parse_url(url)?, &decoded.html))
}

fn parse_url(url: &str) -> Result<Url, PageLoadError> {
    Url::parse(url).map_err(|err| PageLoadError::InvalidUrl {
        url: url.to_string(),
        message: err.to_string(),
    })
}
