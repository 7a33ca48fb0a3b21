//! URL resolution - unwrap redirect wrappers and keep only external links
//!
//! Search markup rarely links straight to a destination. Result anchors go
//! through `/url?q=`, ads through `/aclk?adurl=`, and the rest of the page is
//! full of links back into the source itself. Only a link that survives
//! [`UrlResolver::resolve`] is ever surfaced in a record.

use url::Url;

use crate::config::ExtractionConfig;

/// Base used to parse the site-relative links the source emits
const SOURCE_BASE: &str = "https://www.google.com/";

/// Paths on the source that wrap a destination in a query parameter
const WRAPPER_PATHS: &[&str] = &[
    "/url",
    "/aclk",
    "/pagead/aclk",
    "/imgres",
    "/interstitial",
    "/local_url",
    "/link",
];

/// Query parameters that carry the wrapped destination, in preference order
const TARGET_PARAMS: &[&str] = &["adurl", "url", "q", "imgrefurl", "imgurl", "u", "dest"];

/// Hosts (and their subdomains) that are never external content
const DENYLISTED_HOSTS: &[&str] = &[
    // the source itself
    "g.co",
    "goo.gl",
    "google.com",
    "googleusercontent.com",
    "withgoogle.com",
    // ad serving
    "googleadservices.com",
    "googlesyndication.com",
    "doubleclick.net",
    "adservice.google.com",
    "bing.com",
    // assets and CDNs
    "gstatic.com",
    "googleapis.com",
    "ggpht.com",
    "cdnjs.cloudflare.com",
    "jsdelivr.net",
    "unpkg.com",
    "schema.org",
    "w3.org",
];

/// File extensions that are assets rather than documents
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif", "css", "js", "mjs", "map",
    "woff", "woff2", "ttf", "otf", "eot", "mp4", "webm", "mp3",
];

const MAX_UNWRAP_DEPTH: usize = 3;

/// Resolves and classifies links for one pipeline call
#[derive(Debug, Clone)]
pub struct UrlResolver<'a> {
    blocked_hosts: &'a [String],
}

impl<'a> UrlResolver<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self {
            blocked_hosts: &config.blocked_hosts,
        }
    }

    /// Resolve a raw href (possibly a redirect wrapper) to an external URL.
    ///
    /// Returns `None` for anything internal, navigational, non-http(s), or an
    /// asset.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let url = unwrap_redirect(raw)?;
        if self.is_external(&url) && is_document_url(&url) {
            Some(url.to_string())
        } else {
            None
        }
    }

    /// Whether a parsed URL points at external content
    pub fn is_external(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        match url.host_str() {
            Some(host) => !self.is_denylisted_host(host),
            None => false,
        }
    }

    fn is_denylisted_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        // google.<any tld>, including country domains like google.co.uk
        if host.split('.').any(|label| label == "google") {
            return true;
        }
        DENYLISTED_HOSTS
            .iter()
            .copied()
            .chain(self.blocked_hosts.iter().map(String::as_str))
            .any(|blocked| host_matches(&host, blocked))
    }
}

fn host_matches(host: &str, blocked: &str) -> bool {
    let blocked = blocked.trim().trim_start_matches('.').to_ascii_lowercase();
    !blocked.is_empty()
        && (host == blocked || host.ends_with(&format!(".{}", blocked)))
}

/// Parse a raw href and peel off redirect wrappers.
///
/// Relative links are resolved against the source's own origin, so they
/// parse but never classify as external unless they wrap a destination.
pub fn unwrap_redirect(raw: &str) -> Option<Url> {
    let cleaned = raw.trim().replace("&amp;", "&");
    if cleaned.is_empty() || cleaned.starts_with('#') || cleaned.starts_with("javascript:") {
        return None;
    }

    let mut url = parse_href(&cleaned)?;
    for _ in 0..MAX_UNWRAP_DEPTH {
        match wrapped_target(&url) {
            Some(target) => url = target,
            None => break,
        }
    }
    Some(url)
}

fn parse_href(href: &str) -> Option<Url> {
    if href.starts_with("//") {
        return Url::parse(&format!("https:{}", href)).ok();
    }
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(SOURCE_BASE).ok()?.join(href).ok()
        }
        Err(_) => None,
    }
}

/// The destination a wrapper URL points at, if it is a wrapper
fn wrapped_target(url: &Url) -> Option<Url> {
    let path = url.path();
    let is_wrapper_path = WRAPPER_PATHS.contains(&path);
    let is_source_host = url
        .host_str()
        .map(|h| h.split('.').any(|label| label == "google"))
        .unwrap_or(false);
    if !is_wrapper_path && !is_source_host {
        return None;
    }

    for param in TARGET_PARAMS {
        let Some((_, value)) = url.query_pairs().find(|(k, _)| k == param) else {
            continue;
        };
        let mut value = value.into_owned();
        // some wrappers double-encode the destination
        if value.starts_with("http%3A") || value.starts_with("https%3A") {
            if let Ok(decoded) = urlencoding::decode(&value) {
                value = decoded.into_owned();
            }
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            if let Ok(target) = Url::parse(&value) {
                return Some(target);
            }
        }
    }
    None
}

/// Whether the URL's path ends in a document rather than an asset
pub fn is_document_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((_, ext)) => !ASSET_EXTENSIONS.contains(&ext),
        None => true,
    }
}

/// Human-facing form of a URL: host without `www.` plus path, no scheme
pub fn display_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let host = host.strip_prefix("www.").unwrap_or(host);
            let path = parsed.path().trim_end_matches('/');
            format!("{}{}", host, path)
        }
        Err(_) => url.to_string(),
    }
}

/// Host of a URL without `www.`, for comparisons
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| {
        u.host_str()
            .map(|h| h.strip_prefix("www.").unwrap_or(h).to_ascii_lowercase())
    })
}
