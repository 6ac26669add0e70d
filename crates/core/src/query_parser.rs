//! Natural-language query front end for attribute search.
//!
//! A best-effort keyword extractor that maps free text to the three
//! search predicates (gender, upper color, lower color). It is lossy by
//! design: a dimension that cannot be extracted is left unset and the
//! search simply does not filter on it — it is never defaulted to a
//! guess.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Color vocabulary, including synonyms mapped to canonical names.
const COLOR_MAP: &[(&str, &str)] = &[
    ("red", "red"),
    ("blue", "blue"),
    ("navy", "blue"),
    ("black", "black"),
    ("white", "white"),
    ("gray", "gray"),
    ("grey", "gray"),
    ("green", "green"),
    ("yellow", "yellow"),
    ("brown", "brown"),
    ("pink", "pink"),
    ("orange", "orange"),
    ("purple", "purple"),
    ("beige", "brown"),
    ("tan", "brown"),
    ("khaki", "brown"),
];

/// Garment keywords that place a nearby color on the upper body.
const UPPER_KEYWORDS: &[&str] = &[
    "shirt", "top", "jacket", "coat", "hoodie", "sweater", "blouse", "t-shirt", "tshirt",
    "upper", "torso", "vest", "cardigan", "blazer", "polo",
];

/// Garment keywords that place a nearby color on the lower body.
const LOWER_KEYWORDS: &[&str] = &[
    "pants", "trousers", "jeans", "shorts", "skirt", "bottom", "lower", "legs", "slacks",
    "leggings", "joggers",
];

static MALE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(man|male|boy|guy|gentleman)\b").unwrap());
static FEMALE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(woman|female|girl|lady)\b").unwrap());
static WEARING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bwearing\s+(?:a\s+)?(\w+)").unwrap());

/// Attributes extracted from a natural-language query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && self.upper_color.is_none() && self.lower_color.is_none()
    }
}

/// Extract search predicates from free text.
///
/// Examples:
/// - "male wearing red shirt" -> gender=male, upper_color=red
/// - "person with blue pants" -> lower_color=blue
/// - "female with black top and white bottom" -> all three set
pub fn parse_query(query_text: &str) -> ParsedQuery {
    let query = query_text.to_lowercase();
    let tokens: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .collect();

    ParsedQuery {
        gender: extract_gender(&query),
        upper_color: extract_upper_color(&query, &tokens),
        lower_color: extract_lower_color(&tokens),
    }
}

/// Gender via fixed synonym sets. When both vocabularies appear
/// ("man with a woman"), female wins.
fn extract_gender(query: &str) -> Option<String> {
    if FEMALE_RE.is_match(query) {
        return Some("female".to_string());
    }
    if MALE_RE.is_match(query) {
        return Some("male".to_string());
    }
    None
}

fn canonical_color(token: &str) -> Option<&'static str> {
    COLOR_MAP
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, canonical)| *canonical)
}

/// Color adjacent to an upper-body garment keyword, with a
/// `wearing <color>` fallback.
fn extract_upper_color(query: &str, tokens: &[&str]) -> Option<String> {
    for (i, token) in tokens.iter().enumerate() {
        if !UPPER_KEYWORDS.contains(token) {
            continue;
        }
        // Color immediately before the keyword ("red shirt").
        if i > 0 {
            if let Some(color) = canonical_color(tokens[i - 1]) {
                return Some(color.to_string());
            }
        }
        // Color after the keyword, optionally via "in" ("jacket in blue").
        let mut j = i + 1;
        if tokens.get(j) == Some(&"in") {
            j += 1;
        }
        if let Some(color) = tokens.get(j).and_then(|t| canonical_color(t)) {
            return Some(color.to_string());
        }
    }

    // Fallback: "wearing [a] <color>".
    if let Some(caps) = WEARING_RE.captures(query) {
        if let Some(color) = canonical_color(&caps[1]) {
            return Some(color.to_string());
        }
    }
    None
}

/// Color immediately before a lower-body garment keyword.
fn extract_lower_color(tokens: &[&str]) -> Option<String> {
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && LOWER_KEYWORDS.contains(token) {
            if let Some(color) = canonical_color(tokens[i - 1]) {
                return Some(color.to_string());
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
