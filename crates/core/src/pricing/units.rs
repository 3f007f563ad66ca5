//! Unit-of-sale normalization.
//!
//! Listings carry free-text units ("kilos", "1/2 docena", "funda"). Every label
//! maps to exactly one [`CanonicalUnit`]; labels that match nothing pass through
//! as [`CanonicalUnit::Other`] so two listings with the same unknown unit still
//! compare equal.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitClass {
    Countable,
    Weight,
    Volume,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CanonicalUnit {
    Unidad,
    Docena,
    MediaDocena,
    Kg,
    G,
    Lb,
    L,
    Ml,
    Paquete,
    Caja,
    Bolsa,
    Other(String),
}

impl CanonicalUnit {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unidad => "unidad",
            Self::Docena => "docena",
            Self::MediaDocena => "media docena",
            Self::Kg => "kg",
            Self::G => "g",
            Self::Lb => "lb",
            Self::L => "l",
            Self::Ml => "ml",
            Self::Paquete => "paquete",
            Self::Caja => "caja",
            Self::Bolsa => "bolsa",
            Self::Other(token) => token,
        }
    }

    /// Unknown units have no class and only ever convert to themselves.
    pub fn class(&self) -> Option<UnitClass> {
        match self {
            Self::Unidad
            | Self::Docena
            | Self::MediaDocena
            | Self::Paquete
            | Self::Caja
            | Self::Bolsa => Some(UnitClass::Countable),
            Self::Kg | Self::G | Self::Lb => Some(UnitClass::Weight),
            Self::L | Self::Ml => Some(UnitClass::Volume),
            Self::Other(_) => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Paquete | Self::Caja | Self::Bolsa)
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CanonicalUnit> for String {
    fn from(unit: CanonicalUnit) -> Self {
        unit.as_str().to_string()
    }
}

impl From<String> for CanonicalUnit {
    fn from(label: String) -> Self {
        normalize_unit(&label)
    }
}

/// How a synonym is compared against the label.
#[derive(Clone, Copy)]
enum Match {
    /// Anywhere in the label. Only used for words long enough not to collide.
    Substring,
    /// A whole whitespace/punctuation separated token of the label.
    Token,
}

struct Synonym {
    text: &'static str,
    mode: Match,
    unit: CanonicalUnit,
}

const fn sub(text: &'static str, unit: CanonicalUnit) -> Synonym {
    Synonym { text, mode: Match::Substring, unit }
}

const fn tok(text: &'static str, unit: CanonicalUnit) -> Synonym {
    Synonym { text, mode: Match::Token, unit }
}

// Order matters: "media docena" before "docena", "kilogramo" before "gramo",
// "mililitro" before "litro".
static SYNONYMS: &[Synonym] = &[
    sub("media docena", CanonicalUnit::MediaDocena),
    sub("medio docena", CanonicalUnit::MediaDocena),
    sub("1/2 docena", CanonicalUnit::MediaDocena),
    sub("media-docena", CanonicalUnit::MediaDocena),
    sub("docena", CanonicalUnit::Docena),
    sub("dozen", CanonicalUnit::Docena),
    tok("dz", CanonicalUnit::Docena),
    sub("kilogramo", CanonicalUnit::Kg),
    sub("kilo", CanonicalUnit::Kg),
    tok("kgs", CanonicalUnit::Kg),
    tok("kg", CanonicalUnit::Kg),
    sub("gramo", CanonicalUnit::G),
    tok("grs", CanonicalUnit::G),
    tok("gr", CanonicalUnit::G),
    tok("g", CanonicalUnit::G),
    sub("libra", CanonicalUnit::Lb),
    tok("lbs", CanonicalUnit::Lb),
    tok("lb", CanonicalUnit::Lb),
    sub("mililitro", CanonicalUnit::Ml),
    tok("ml", CanonicalUnit::Ml),
    tok("cc", CanonicalUnit::Ml),
    sub("litro", CanonicalUnit::L),
    tok("lts", CanonicalUnit::L),
    tok("lt", CanonicalUnit::L),
    tok("l", CanonicalUnit::L),
    sub("paquete", CanonicalUnit::Paquete),
    sub("pack", CanonicalUnit::Paquete),
    tok("paq", CanonicalUnit::Paquete),
    sub("caja", CanonicalUnit::Caja),
    tok("box", CanonicalUnit::Caja),
    sub("bolsa", CanonicalUnit::Bolsa),
    sub("funda", CanonicalUnit::Bolsa),
    sub("saco", CanonicalUnit::Bolsa),
    sub("unidad", CanonicalUnit::Unidad),
    sub("pieza", CanonicalUnit::Unidad),
    sub("c/u", CanonicalUnit::Unidad),
    tok("und", CanonicalUnit::Unidad),
    tok("unid", CanonicalUnit::Unidad),
    tok("un", CanonicalUnit::Unidad),
    tok("u", CanonicalUnit::Unidad),
];

/// Canonicalizes a free-text unit label. Empty input means `unidad`.
pub fn normalize_unit(label: &str) -> CanonicalUnit {
    let cleaned = label.trim().to_lowercase();
    if cleaned.is_empty() {
        return CanonicalUnit::Unidad;
    }

    SYNONYMS
        .iter()
        .find(|synonym| matches_synonym(&cleaned, synonym))
        .map(|synonym| synonym.unit.clone())
        .unwrap_or(CanonicalUnit::Other(cleaned))
}

fn matches_synonym(label: &str, synonym: &Synonym) -> bool {
    match synonym.mode {
        Match::Substring => label.contains(synonym.text),
        Match::Token => label
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == synonym.text || strip_count(token) == synonym.text),
    }
}

/// "12kg" style tokens: drop a leading quantity so the unit part still matches.
fn strip_count(token: &str) -> &str {
    token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ',')
}

#[cfg(test)]
mod tests {
    use super::{normalize_unit, CanonicalUnit, UnitClass};

    #[test]
    fn synonyms_resolve_to_canonical_units() {
        assert_eq!(normalize_unit("Kilogramo"), CanonicalUnit::Kg);
        assert_eq!(normalize_unit("kilos"), CanonicalUnit::Kg);
        assert_eq!(normalize_unit(" KG "), CanonicalUnit::Kg);
        assert_eq!(normalize_unit("gramos"), CanonicalUnit::G);
        assert_eq!(normalize_unit("500 g"), CanonicalUnit::G);
        assert_eq!(normalize_unit("libra"), CanonicalUnit::Lb);
        assert_eq!(normalize_unit("litro"), CanonicalUnit::L);
        assert_eq!(normalize_unit("mililitros"), CanonicalUnit::Ml);
        assert_eq!(normalize_unit("Media Docena"), CanonicalUnit::MediaDocena);
        assert_eq!(normalize_unit("docena"), CanonicalUnit::Docena);
        assert_eq!(normalize_unit("pack-12"), CanonicalUnit::Paquete);
        assert_eq!(normalize_unit("funda"), CanonicalUnit::Bolsa);
        assert_eq!(normalize_unit("c/u"), CanonicalUnit::Unidad);
    }

    #[test]
    fn empty_label_defaults_to_unidad() {
        assert_eq!(normalize_unit(""), CanonicalUnit::Unidad);
        assert_eq!(normalize_unit("   "), CanonicalUnit::Unidad);
    }

    #[test]
    fn unknown_labels_pass_through_lowercased() {
        assert_eq!(normalize_unit("Cubeta"), CanonicalUnit::Other("cubeta".to_string()));
        assert_eq!(normalize_unit("cubeta").class(), None);
    }

    #[test]
    fn short_abbreviations_do_not_match_inside_words() {
        // "l" must not fire on "bolsa", "g" must not fire on "kg"
        assert_eq!(normalize_unit("bolsa"), CanonicalUnit::Bolsa);
        assert_eq!(normalize_unit("kg"), CanonicalUnit::Kg);
        assert_eq!(normalize_unit("atado"), CanonicalUnit::Other("atado".to_string()));
    }

    #[test]
    fn normalization_is_idempotent() {
        let labels = [
            "", "kilo", "Kilogramos", "g", "gr", "lb", "libras", "l", "litros", "ml", "cc",
            "docena", "media docena", "1/2 docena", "paquete", "pack-12", "caja x 30", "bolsa",
            "funda", "unidad", "c/u", "cubeta", "atado", "  Racimo ",
        ];
        for label in labels {
            let once = normalize_unit(label);
            let twice = normalize_unit(once.as_str());
            assert_eq!(twice, once, "normalize should be idempotent for `{label}`");
        }
    }

    #[test]
    fn units_serialize_as_their_labels() {
        let json = serde_json::to_string(&CanonicalUnit::MediaDocena).expect("serialize");
        assert_eq!(json, "\"media docena\"");
        let parsed: CanonicalUnit = serde_json::from_str("\"Kilos\"").expect("deserialize");
        assert_eq!(parsed, CanonicalUnit::Kg);
    }

    #[test]
    fn every_closed_unit_has_exactly_one_class() {
        assert_eq!(CanonicalUnit::MediaDocena.class(), Some(UnitClass::Countable));
        assert_eq!(CanonicalUnit::Bolsa.class(), Some(UnitClass::Countable));
        assert_eq!(CanonicalUnit::Lb.class(), Some(UnitClass::Weight));
        assert_eq!(CanonicalUnit::Ml.class(), Some(UnitClass::Volume));
    }
}
