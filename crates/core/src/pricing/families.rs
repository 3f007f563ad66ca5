//! Product families with a conventional unit of sale.
//!
//! Used to reject conversions that make no sense for a product (eggs per kg)
//! and to pick a replacement unit when the caller's unit fits nothing.

use crate::pricing::keywords::normalize_text;
use crate::pricing::units::{CanonicalUnit, UnitClass};

#[derive(Debug, PartialEq, Eq)]
pub struct ProductFamily {
    /// Token prefix matched against the normalized product name.
    pub keyword: &'static str,
    pub class: UnitClass,
    pub suggested_unit: CanonicalUnit,
    /// Sold strictly by count; weight/volume prices are never derived.
    pub count_only: bool,
}

const fn family(
    keyword: &'static str,
    class: UnitClass,
    suggested_unit: CanonicalUnit,
    count_only: bool,
) -> ProductFamily {
    ProductFamily { keyword, class, suggested_unit, count_only }
}

static FAMILIES: &[ProductFamily] = &[
    family("huevo", UnitClass::Countable, CanonicalUnit::Unidad, true),
    family("leche", UnitClass::Volume, CanonicalUnit::L, false),
    family("aceite", UnitClass::Volume, CanonicalUnit::L, false),
    family("jugo", UnitClass::Volume, CanonicalUnit::L, false),
    family("yogur", UnitClass::Volume, CanonicalUnit::L, false),
    family("arroz", UnitClass::Weight, CanonicalUnit::Kg, false),
    family("azucar", UnitClass::Weight, CanonicalUnit::Kg, false),
    family("harina", UnitClass::Weight, CanonicalUnit::Kg, false),
    family("carne", UnitClass::Weight, CanonicalUnit::Kg, false),
    family("pollo", UnitClass::Weight, CanonicalUnit::Kg, false),
];

pub fn infer_family(product_name: &str) -> Option<&'static ProductFamily> {
    let normalized = normalize_text(product_name);
    FAMILIES.iter().find(|family| {
        normalized.split(' ').any(|token| token.starts_with(family.keyword))
    })
}

pub fn count_only_family(product_name: &str) -> Option<&'static ProductFamily> {
    infer_family(product_name).filter(|family| family.count_only)
}

impl ProductFamily {
    /// Whether pricing this family per `unit` is sensible.
    pub fn accepts(&self, unit: &CanonicalUnit) -> bool {
        unit.class() == Some(self.class)
    }
}
