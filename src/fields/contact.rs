//! Phone, website and email extraction

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use super::{always, candidates, first_match, group1, whole, Rule, Surface};
use crate::links::UrlResolver;
use crate::window::ContextWindow;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Top-level domains that mean an "email" is really an asset name like `logo@2x.png`
const ASSET_TLDS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "js", "css", "ico"];

static TEL_HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)href="tel:([^"]{7,40})""#).expect("Invalid tel href regex")
});

static PHONE_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:data-(?:phone|tel)(?:-number)?|data-dtype="d3ph"[^>]*aria-label)="(?:phone:\s*)?([^"]{7,40})""#)
        .expect("Invalid phone attribute regex")
});

static PHONE_INTL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+[0-9]{1,3}[\s.-]?\(?[0-9]{1,4}\)?(?:[\s.-]?[0-9]{2,4}){2,4}")
        .expect("Invalid international phone regex")
});

static PHONE_NANP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?\b[0-9]{3}\)?[\s.-]?[0-9]{3}[\s.-][0-9]{4}\b").expect("Invalid NANP phone regex")
});

static AUTHORITY_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<a\b[^>]*(?:data-item-id="authority"|aria-label="website[^"]*"|data-tooltip="open website")[^>]*>"#,
    )
    .expect("Invalid authority link regex")
});

static HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref="([^"]+)""#).expect("Invalid href regex")
});

static WEBSITE_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:website|url|sameAs)"\s*:\s*"(https?://[^"]+)""#).expect("Invalid website JSON regex")
});

static MAILTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)href="mailto:([^"?]+)"#).expect("Invalid mailto regex")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("Invalid email regex")
});

/// Ranked rules for the phone number
pub static PHONE_RULES: &[Rule<String>] = &[
    Rule {
        name: "phone_tel_link",
        surface: Surface::Raw,
        pattern: &TEL_HREF_RE,
        transform: decoded_group1,
        accept: plausible_phone,
    },
    Rule {
        name: "phone_attribute",
        surface: Surface::Raw,
        pattern: &PHONE_ATTR_RE,
        transform: decoded_group1,
        accept: plausible_phone,
    },
    Rule {
        name: "phone_international",
        surface: Surface::Text,
        pattern: &PHONE_INTL_RE,
        transform: whole,
        accept: plausible_phone,
    },
    Rule {
        name: "phone_nanp",
        surface: Surface::Text,
        pattern: &PHONE_NANP_RE,
        transform: whole,
        accept: plausible_phone,
    },
];

/// Ranked rules for raw website hrefs; resolution happens afterwards
pub static WEBSITE_RULES: &[Rule<String>] = &[
    Rule {
        name: "website_authority_link",
        surface: Surface::Raw,
        pattern: &AUTHORITY_LINK_RE,
        transform: |caps| HREF_RE.captures(&caps[0]).and_then(|c| group1(&c)),
        accept: always,
    },
    Rule {
        name: "website_json",
        surface: Surface::Raw,
        pattern: &WEBSITE_JSON_RE,
        transform: group1,
        accept: always,
    },
    Rule {
        name: "website_first_external_href",
        surface: Surface::Raw,
        pattern: &HREF_RE,
        transform: group1,
        accept: always,
    },
];

/// Ranked rules for the email address
pub static EMAIL_RULES: &[Rule<String>] = &[
    Rule {
        name: "email_mailto",
        surface: Surface::Raw,
        pattern: &MAILTO_RE,
        transform: decoded_group1,
        accept: plausible_email,
    },
    Rule {
        name: "email_text",
        surface: Surface::Text,
        pattern: &EMAIL_RE,
        transform: whole,
        accept: plausible_email,
    },
];

pub fn extract_phone(window: &ContextWindow<'_>) -> Option<String> {
    first_match(PHONE_RULES, window)
}

/// First candidate href that resolves to an external destination
pub fn extract_website(window: &ContextWindow<'_>, resolver: &UrlResolver<'_>) -> Option<String> {
    candidates(WEBSITE_RULES, window).find_map(|href| resolver.resolve(&href))
}

/// First email whose domain is not the source's own or an asset host
pub fn extract_email(window: &ContextWindow<'_>, resolver: &UrlResolver<'_>) -> Option<String> {
    candidates(EMAIL_RULES, window).find(|email| {
        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };
        Url::parse(&format!("https://{}/", domain))
            .map(|url| resolver.is_external(&url))
            .unwrap_or(false)
    })
}

fn decoded_group1(caps: &Captures<'_>) -> Option<String> {
    let raw = caps.get(1)?.as_str().replace("&amp;", "&");
    let decoded = urlencoding::decode(&raw).ok()?;
    Some(decoded.trim().to_string())
}

fn plausible_phone(phone: &String) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

fn plausible_email(email: &String) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let tld = domain.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    !local.is_empty() && domain.contains('.') && !ASSET_TLDS.contains(&tld.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn window(html: &str) -> ContextWindow<'_> {
        ContextWindow::from_fragment(html)
    }

    #[test]
    fn test_phone_prefers_tel_link() {
        let w = window(r#"<a href="tel:+1%20212-555-0100">Call</a> or 212-555-9999"#);
        assert_eq!(extract_phone(&w).as_deref(), Some("+1 212-555-0100"));
    }

    #[test]
    fn test_phone_from_text() {
        assert_eq!(
            extract_phone(&window("<span>(212) 555-0147</span>")).as_deref(),
            Some("(212) 555-0147")
        );
        assert_eq!(
            extract_phone(&window("<span>Tel +44 20 7946 0958</span>")).as_deref(),
            Some("+44 20 7946 0958")
        );
    }

    #[test]
    fn test_phone_rejects_short_digit_runs() {
        assert_eq!(extract_phone(&window(r#"<a href="tel:12-34">x</a>"#)), None);
        assert_eq!(extract_phone(&window("<p>Founded 1998, 42 staff</p>")), None);
    }

    #[test]
    fn test_website_prefers_authority_link() {
        let config = ExtractionConfig::default();
        let resolver = UrlResolver::new(&config);
        let w = window(
            r#"<a href="https://reviews.example.org/joes">Reviews</a>
               <a data-item-id="authority" href="/url?q=https://joespizza.example/&amp;sa=U">Website</a>"#,
        );
        assert_eq!(
            extract_website(&w, &resolver).as_deref(),
            Some("https://joespizza.example/")
        );
    }

    #[test]
    fn test_website_skips_internal_links() {
        let config = ExtractionConfig::default();
        let resolver = UrlResolver::new(&config);
        let w = window(
            r#"<a href="/maps/place/Joe's">Map</a>
               <a href="https://www.google.com/search?q=joe">More</a>
               <a href="https://joespizza.example/menu">Menu</a>"#,
        );
        assert_eq!(
            extract_website(&w, &resolver).as_deref(),
            Some("https://joespizza.example/menu")
        );
    }

    #[test]
    fn test_email_extraction() {
        let config = ExtractionConfig::default();
        let resolver = UrlResolver::new(&config);

        let w = window(r#"<a href="mailto:hello@joespizza.example?subject=hi">Email</a>"#);
        assert_eq!(extract_email(&w, &resolver).as_deref(), Some("hello@joespizza.example"));

        let w = window("<p>icon@2x.png support@google.com info@cafe.example</p>");
        assert_eq!(extract_email(&w, &resolver).as_deref(), Some("info@cafe.example"));
    }
}
