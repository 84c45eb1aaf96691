use thiserror::Error;
use url::Url;

/// Reasons an article link is refused before being handed to the browser.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Anything other than http or https, e.g. `file://` or `javascript:`.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Validate an article URL for opening in the system browser.
///
/// Article URLs come from scraped pages, so only web links with a host are
/// passed on to the OS opener.
///
/// ```
/// use dailyknowledge::util::validate_article_url;
///
/// assert!(validate_article_url("https://telex.hu/gazdasag/2024/05/10/cikk").is_ok());
/// assert!(validate_article_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_article_url(raw: &str) -> Result<Url, LinkError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(LinkError::MissingHost);
    }

    Ok(url)
}
