//! Candidate validation - decide whether a string can name an entity
//!
//! Strategies find far more strings than there are entities: buttons, labels,
//! review quotes, promotional banners. These predicates are the gate every
//! candidate passes before it is allowed to become a record. All of them are
//! pure functions of their input.

use once_cell::sync::Lazy;
use regex::RegexSet;

/// Shortest accepted entity name, in characters
pub const MIN_NAME_CHARS: usize = 2;
/// Longest accepted entity name, in characters
pub const MAX_NAME_CHARS: usize = 80;
/// More words than this reads as a sentence, not a name
pub const MAX_NAME_WORDS: usize = 8;
/// All-caps strings longer than this are banners
pub const MAX_SHOUTING_CHARS: usize = 20;

const MAX_TITLE_CHARS: usize = 200;
const MAX_QUERY_CHARS: usize = 120;
const MIN_CATEGORY_CHARS: usize = 2;
const MAX_CATEGORY_CHARS: usize = 50;
const MAX_CATEGORY_WORDS: usize = 5;

/// Interface chrome, navigation, and result-page furniture
static UI_DENYLIST: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^(sponsored|advertisement|promoted)\b",
        r"(?i)^(ad|ads)(\s*[·⋅:].*)?$",
        r"(?i)^(open|closed)( now| 24 hours)?$",
        r"(?i)^(open|closed)\s*[·⋅]",
        r"(?i)^(opens|closes) ((at|soon|in)\b|\d)",
        r"(?i)^(temporarily|permanently) closed$",
        r"(?i)^(see|show|view|load) (more|all|less|results|photos|menu|details|outside)\b",
        r"(?i)^(more|less|next|previous|back|menu|directions|website|call|save|share|nearby|reviews?|photos?|overview|about|updates|sign in|search|maps?|images|videos|news|shopping|books|flights|finance|all|tools|filters?|sort by|rating|hours|price|cuisine)$",
        r"(?i)^(people also ask|people also search for|related searches|things to know|top stories|local results|places|results|about this result|feedback|more results|more places|more businesses)$",
        r"(?i)^(get directions|send to (your )?phone|suggest an edit|claim this business|own this business\??|add a missing place|write a review|add photos?)$",
        r"(?i)^(dine-in|takeout|take-out|delivery|curbside pickup|no-contact delivery|in-store shopping|in-store pickup)\b",
        r"(?i)^\d(\.\d)?\s*(stars?|out of 5)\b",
        r"(?i)^(map data|keyboard shortcuts|terms( of (use|service))?|privacy|send feedback|help|settings|report (a|an) (problem|issue))\b",
        r"(?i)^google( maps| search)?$",
        r"(?i)^(results for|search results|showing results|did you mean)\b",
        r"(?i)^(order online|order now|book online|book now|reserve( a table)?|make a reservation|menu & reservations)$",
    ])
    .expect("Invalid UI denylist pattern")
});

/// Marketing copy that shows up where names are expected
static PROMO_DENYLIST: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\b(best (price|prices|deals?|rates?) (guaranteed|in town)|limited[- ]time offer|free shipping|free delivery|free estimates?)\b",
        r"(?i)\b(click here|buy now|shop now|call now|call today|learn more|sign up|subscribe|get started|get a quote|book today)\b",
        r"(?i)^(up to )?\d{1,3}% off\b",
        r"(?i)\b(top[- ]rated|#1 rated|award[- ]winning|satisfaction guaranteed)\b",
    ])
    .expect("Invalid promo denylist pattern")
});

const STATUS_WORDS: &[&str] = &[
    "open",
    "closed",
    "opens",
    "closes",
    "open now",
    "closed now",
    "open 24 hours",
    "temporarily closed",
    "permanently closed",
    "opening soon",
];

const RATING_WORDS: &[&str] = &["star", "stars", "rating", "ratings", "rated", "review", "reviews"];

/// Whether a candidate string can be an entity (business) name
pub fn is_valid_name(candidate: &str) -> bool {
    let text = candidate.trim();
    let chars = text.chars().count();

    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars) {
        return false;
    }
    if is_quoted(text) {
        return false;
    }
    if text.split_whitespace().count() > MAX_NAME_WORDS {
        return false;
    }
    if !has_alphabetic(text) {
        return false;
    }
    if UI_DENYLIST.is_match(text) || PROMO_DENYLIST.is_match(text) {
        return false;
    }
    if is_shouting(text) && chars > MAX_SHOUTING_CHARS {
        return false;
    }
    true
}

/// Whether a string can be the title of a search result.
///
/// Titles may be long and promotional (ads are), so only length, the
/// alphabetic check, and interface chrome are enforced.
pub fn is_valid_title(candidate: &str) -> bool {
    let text = candidate.trim();
    let chars = text.chars().count();
    (MIN_NAME_CHARS..=MAX_TITLE_CHARS).contains(&chars)
        && has_alphabetic(text)
        && !UI_DENYLIST.is_match(text)
}

/// Whether a string can be a related search query
pub fn is_valid_query(candidate: &str) -> bool {
    let text = candidate.trim();
    let chars = text.chars().count();
    (MIN_NAME_CHARS..=MAX_QUERY_CHARS).contains(&chars)
        && has_alphabetic(text)
        && !UI_DENYLIST.is_match(text)
}

/// Whether a delimiter-separated token can be a business category
pub fn is_valid_category(candidate: &str) -> bool {
    let text = candidate.trim();
    let chars = text.chars().count();

    if !(MIN_CATEGORY_CHARS..=MAX_CATEGORY_CHARS).contains(&chars) {
        return false;
    }
    if !has_alphabetic(text) || is_numeric_heavy(text) {
        return false;
    }
    if text.split_whitespace().count() > MAX_CATEGORY_WORDS {
        return false;
    }

    let lower = text.to_lowercase();
    if STATUS_WORDS.contains(&lower.as_str()) {
        return false;
    }
    if lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| RATING_WORDS.contains(&word))
    {
        return false;
    }
    !UI_DENYLIST.is_match(text)
}

/// A bare number as one of the words (a street number, a price, a count), or
/// more digits than letters overall. "24-hour diner" passes.
fn is_numeric_heavy(text: &str) -> bool {
    let bare_number = text.split_whitespace().any(|word| {
        word.chars().any(|c| c.is_ascii_digit()) && !word.chars().any(char::is_alphabetic)
    });
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    bare_number || digits >= letters
}

fn has_alphabetic(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Fully upper-case (ignoring non-letters)
fn is_shouting(text: &str) -> bool {
    has_alphabetic(text) && !text.chars().any(char::is_lowercase)
}

/// Wrapped in quotation marks, the way review excerpts are shown
fn is_quoted(text: &str) -> bool {
    const OPENING: [char; 5] = ['"', '“', '„', '«', '\''];
    const CLOSING: [char; 4] = ['"', '”', '»', '\''];

    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => OPENING.contains(&first) && CLOSING.contains(&last),
        _ => false,
    }
}
