//! Price-per-unit conversion between units of the same class.
//!
//! Converting a price never guesses: pairs outside a shared class, or
//! weight/volume targets for count-only products, come back as
//! [`NotConvertible`] so callers can drop the candidate.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::families::count_only_family;
use crate::pricing::units::{normalize_unit, CanonicalUnit, UnitClass};

/// Units per pack when the label carries no explicit count.
pub const DEFAULT_PAQUETE_UNITS: u32 = 6;
/// Units per box when the label carries no explicit count.
pub const DEFAULT_CAJA_UNITS: u32 = 12;
/// Units per bag when the label carries no explicit count.
pub const DEFAULT_BOLSA_UNITS: u32 = 10;

/// Largest unit count a container label may carry.
pub const MAX_EXPLICIT_COUNT: u32 = 1000;

static EXPLICIT_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("count pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedPrice {
    pub price: Decimal,
    pub unit: CanonicalUnit,
    /// False when source and target were already the same unit.
    pub applied: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NotConvertible {
    #[error("`{from}` and `{to}` are not in the same unit class")]
    IncompatibleClasses { from: CanonicalUnit, to: CanonicalUnit },
    #[error("products of family `{family}` are sold by count only, not per `{to}`")]
    CountOnly { family: &'static str, to: CanonicalUnit },
    #[error("`{unit}` has no fixed unit count for this product")]
    UnknownCount { unit: CanonicalUnit },
    #[error("price per `{to}` is outside the decimal range")]
    OutOfRange { to: CanonicalUnit },
}

/// Converts `price` (per `from_label`) into a price per `to_label`.
pub fn convert_price(
    price: Decimal,
    from_label: &str,
    to_label: &str,
    product_name: &str,
) -> Result<ConvertedPrice, NotConvertible> {
    let from = normalize_unit(from_label);
    let to = normalize_unit(to_label);

    if from == to {
        return Ok(ConvertedPrice { price, unit: to, applied: false });
    }

    if let Some(family) = count_only_family(product_name) {
        for unit in [&from, &to] {
            if unit.class() != Some(UnitClass::Countable) {
                return Err(NotConvertible::CountOnly { family: family.keyword, to: unit.clone() });
            }
        }
        let from_count = fixed_count(&from, from_label)?;
        let to_count = fixed_count(&to, to_label)?;
        return rescale(price, from_count, to_count, to);
    }

    match (from.class(), to.class()) {
        (Some(UnitClass::Weight), Some(UnitClass::Weight)) => {
            rescale(price, grams(&from), grams(&to), to)
        }
        (Some(UnitClass::Volume), Some(UnitClass::Volume)) => {
            rescale(price, millilitres(&from), millilitres(&to), to)
        }
        (Some(UnitClass::Countable), Some(UnitClass::Countable)) => {
            let from_count = countable_size(&from, from_label);
            let to_count = countable_size(&to, to_label);
            rescale(price, from_count, to_count, to)
        }
        _ => Err(NotConvertible::IncompatibleClasses { from, to }),
    }
}

/// Price per `from` (which holds `from_size` base units) to price per `to`.
fn rescale(
    price: Decimal,
    from_size: Decimal,
    to_size: Decimal,
    to: CanonicalUnit,
) -> Result<ConvertedPrice, NotConvertible> {
    match price.checked_mul(to_size).and_then(|scaled| scaled.checked_div(from_size)) {
        Some(price) => Ok(ConvertedPrice { price, unit: to, applied: true }),
        None => Err(NotConvertible::OutOfRange { to }),
    }
}

fn grams(unit: &CanonicalUnit) -> Decimal {
    match unit {
        CanonicalUnit::Kg => Decimal::from(1000),
        CanonicalUnit::Lb => Decimal::new(453_592, 3),
        _ => Decimal::ONE,
    }
}

fn millilitres(unit: &CanonicalUnit) -> Decimal {
    match unit {
        CanonicalUnit::L => Decimal::from(1000),
        _ => Decimal::ONE,
    }
}

/// Units contained in a countable unit; only the unambiguous sizes.
fn fixed_count(unit: &CanonicalUnit, label: &str) -> Result<Decimal, NotConvertible> {
    match unit {
        CanonicalUnit::Unidad => Ok(Decimal::ONE),
        CanonicalUnit::Docena => Ok(Decimal::from(12)),
        CanonicalUnit::MediaDocena => Ok(Decimal::from(6)),
        container if container.is_container() => explicit_count(label)
            .map(Decimal::from)
            .ok_or_else(|| NotConvertible::UnknownCount { unit: container.clone() }),
        other => Err(NotConvertible::UnknownCount { unit: other.clone() }),
    }
}

/// Best-effort unit count; containers fall back to their default size.
fn countable_size(unit: &CanonicalUnit, label: &str) -> Decimal {
    if let Ok(count) = fixed_count(unit, label) {
        return count;
    }
    let default = match unit {
        CanonicalUnit::Paquete => DEFAULT_PAQUETE_UNITS,
        CanonicalUnit::Caja => DEFAULT_CAJA_UNITS,
        CanonicalUnit::Bolsa => DEFAULT_BOLSA_UNITS,
        _ => 1,
    };
    Decimal::from(default)
}

/// Count embedded in labels such as "pack-12" or "caja x 30".
///
/// The whole first digit run is read; zero or anything above
/// [`MAX_EXPLICIT_COUNT`] is treated as no count at all.
pub fn explicit_count(label: &str) -> Option<u32> {
    EXPLICIT_COUNT
        .captures(label)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
        .filter(|count| (1..=MAX_EXPLICIT_COUNT).contains(count))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{convert_price, explicit_count, NotConvertible};
    use crate::pricing::units::CanonicalUnit;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn close(left: Decimal, right: Decimal) -> bool {
        (left - right).abs() < dec("0.000000001")
    }

    #[test]
    fn identical_units_return_input_unchanged() {
        let converted = convert_price(dec("2.50"), "kilos", "kg", "papas").expect("same unit");
        assert_eq!(converted.price, dec("2.50"));
        assert_eq!(converted.unit, CanonicalUnit::Kg);
        assert!(!converted.applied);
    }

    #[test]
    fn weight_converts_through_grams() {
        let per_gram = convert_price(dec("2.00"), "kg", "g", "arroz").expect("kg to g");
        assert_eq!(per_gram.price, dec("0.002"));
        assert!(per_gram.applied);

        let per_pound = convert_price(dec("1000"), "kg", "lb", "arroz").expect("kg to lb");
        assert!(close(per_pound.price, dec("453.592")));
    }

    #[test]
    fn volume_converts_through_millilitres() {
        let per_litre = convert_price(dec("0.003"), "ml", "litro", "leche").expect("ml to l");
        assert_eq!(per_litre.price, dec("3.000"));
    }

    #[test]
    fn same_class_round_trips_hold() {
        let price = dec("3.75");
        for (a, b) in [("kg", "g"), ("kg", "lb"), ("g", "lb"), ("l", "ml")] {
            let there = convert_price(price, a, b, "producto").expect("forward");
            let back = convert_price(there.price, b, a, "producto").expect("backward");
            assert!(close(back.price, price), "round trip {a} -> {b} drifted: {}", back.price);
        }
    }

    #[test]
    fn cross_class_pairs_are_never_numeric() {
        for (from, to) in [("kg", "unidad"), ("unidad", "kg"), ("l", "kg"), ("ml", "docena")] {
            let result = convert_price(dec("1"), from, to, "queso");
            assert!(
                matches!(result, Err(NotConvertible::IncompatibleClasses { .. })),
                "{from} -> {to} should not convert"
            );
        }
    }

    #[test]
    fn unknown_units_only_match_themselves() {
        assert!(convert_price(dec("1"), "atado", "atado", "cebolla").is_ok());
        assert!(convert_price(dec("1"), "atado", "unidad", "cebolla").is_err());
    }

    #[test]
    fn count_only_products_reject_weight_targets() {
        let result = convert_price(dec("3.00"), "docena", "kg", "huevos de campo");
        assert!(matches!(result, Err(NotConvertible::CountOnly { family: "huevo", .. })));
    }

    #[test]
    fn count_only_products_use_fixed_multipliers() {
        let per_unit = convert_price(dec("3.00"), "docena", "unidad", "huevos").expect("dozen");
        assert_eq!(per_unit.price, dec("0.25"));

        let per_half = convert_price(dec("0.25"), "unidad", "media docena", "huevos")
            .expect("half dozen");
        assert_eq!(per_half.price, dec("1.50"));

        let per_tray = convert_price(dec("0.20"), "unidad", "caja x 30", "huevos").expect("tray");
        assert_eq!(per_tray.price, dec("6.00"));

        let unlabeled = convert_price(dec("0.20"), "unidad", "caja", "huevos");
        assert!(matches!(unlabeled, Err(NotConvertible::UnknownCount { .. })));
    }

    #[test]
    fn containers_use_label_counts_or_defaults() {
        let per_unit = convert_price(dec("6.00"), "pack-12", "unidad", "galletas").expect("pack");
        assert_eq!(per_unit.price, dec("0.50"));

        let default_pack = convert_price(dec("6.00"), "paquete", "unidad", "galletas")
            .expect("default pack");
        assert_eq!(default_pack.price, dec("1.00"));
    }

    #[test]
    fn explicit_count_reads_embedded_numbers() {
        assert_eq!(explicit_count("pack-12"), Some(12));
        assert_eq!(explicit_count("caja x 30"), Some(30));
        assert_eq!(explicit_count("paquete"), None);
        assert_eq!(explicit_count("pack-0"), None);
    }

    #[test]
    fn oversized_counts_are_not_truncated() {
        assert_eq!(explicit_count("pack-1000"), Some(1000));
        assert_eq!(explicit_count("pack-12345"), None);
        assert_eq!(explicit_count("caja x 99999999999"), None);

        let result = convert_price(dec("6.00"), "pack-12345", "unidad", "galletas");
        assert_eq!(result.expect("default pack").price, dec("1.00"));
    }

    #[test]
    fn out_of_range_prices_are_not_convertible() {
        let result = convert_price(Decimal::MAX, "g", "kg", "arroz");
        assert!(matches!(result, Err(NotConvertible::OutOfRange { to: CanonicalUnit::Kg })));

        let volume = convert_price(Decimal::MAX, "ml", "litro", "leche");
        assert!(matches!(volume, Err(NotConvertible::OutOfRange { to: CanonicalUnit::L })));

        let per_gram = convert_price(Decimal::MAX, "kg", "g", "arroz").expect("shrinks");
        assert!(per_gram.price < Decimal::MAX);
    }
}
