//! Keyword extraction for free-text listing names.
//!
//! Names are folded to lowercase ASCII-ish text (accents stripped, punctuation
//! removed) and split into tokens. Keywords are the tokens that survive the
//! stopword list and the minimum length.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

pub const MIN_KEYWORD_LEN: usize = 3;

/// Words that carry no product identity in marketplace listings.
pub const STOPWORDS: &[&str] = &[
    "de", "del", "con", "sin", "el", "la", "los", "las", "un", "una", "unos", "unas", "y", "o",
    "para", "por", "en", "al", "fresco", "fresca", "frescos", "frescas", "artesanal",
    "artesanales",
];

/// Lowercases, strips diacritics and punctuation, and collapses whitespace.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The significant tokens of a product name.
///
/// Normalization happens once on construction; [`Keywords::iter`] filters
/// lazily and can be called any number of times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keywords {
    normalized: String,
}

impl Keywords {
    pub fn extract(text: &str) -> Self {
        Self { normalized: normalize_text(text) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.normalized.split(' ').filter(|token| is_keyword(token))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// Number of keywords that occur as substrings of `candidate_name`.
    pub fn relevance(&self, candidate_name: &str) -> usize {
        let candidate = normalize_text(candidate_name);
        self.iter().filter(|keyword| candidate.contains(keyword)).count()
    }
}

/// Whether `name` contains any of `keywords`, both sides normalized.
///
/// Catalog stores filter with this so "Limón" and "limon" meet.
pub fn name_matches_any(name: &str, keywords: &[String]) -> bool {
    let name = normalize_text(name);
    keywords
        .iter()
        .map(|keyword| normalize_text(keyword))
        .any(|keyword| !keyword.is_empty() && name.contains(&keyword))
}

fn is_keyword(token: &str) -> bool {
    token.chars().count() >= MIN_KEYWORD_LEN && !STOPWORDS.contains(&token)
}
