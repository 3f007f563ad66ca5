use thiserror::Error;

use crate::pricing::conversion::NotConvertible;
use crate::pricing::units::CanonicalUnit;
use crate::store::StoreError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("`{name}` has no usable keywords")]
    AmbiguousInput { name: String },
    #[error("{subject} not found")]
    NotFound { subject: String },
    #[error("insufficient reference data: {hint}")]
    InsufficientData { hint: String },
    #[error("cannot convert prices per `{from}` into prices per `{to}`")]
    UnitIncompatible { from: CanonicalUnit, to: CanonicalUnit },
    #[error("store access failed: {0}")]
    UpstreamFailure(#[from] StoreError),
    /// Arithmetic left the decimal range; reported like missing data.
    #[error("{operation} overflowed the decimal range")]
    Overflow { operation: &'static str },
}

impl EngineError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::AmbiguousInput { .. } => "ambiguous_input",
            Self::NotFound { .. } => "not_found",
            Self::InsufficientData { .. } | Self::Overflow { .. } => "insufficient_data",
            Self::UnitIncompatible { .. } => "unit_incompatible",
            Self::UpstreamFailure(_) => "upstream_failure",
        }
    }

    /// Seller-facing guidance for the failure.
    pub fn advice(&self) -> String {
        match self {
            Self::AmbiguousInput { .. } => {
                "Describe el producto con más detalle, por ejemplo \"queso de hoja\" o \"huevos de campo\"."
                    .to_owned()
            }
            Self::NotFound { subject } => {
                format!("No se encontró {subject}. Revisa el nombre o prueba con un término más general.")
            }
            Self::InsufficientData { hint } => hint.clone(),
            Self::UnitIncompatible { from, to } => {
                format!("No es posible comparar precios por {from} con precios por {to}.")
            }
            Self::UpstreamFailure(_) => {
                "No se pudo consultar el catálogo en este momento. Intenta nuevamente en unos minutos."
                    .to_owned()
            }
            Self::Overflow { .. } => {
                "El precio indicado está fuera del rango que se puede comparar; revisa el valor."
                    .to_owned()
            }
        }
    }
}

impl From<NotConvertible> for EngineError {
    fn from(value: NotConvertible) -> Self {
        match value {
            NotConvertible::IncompatibleClasses { from, to } => Self::UnitIncompatible { from, to },
            NotConvertible::CountOnly { family, to } => Self::InsufficientData {
                hint: format!("Los productos de tipo {family} se venden por unidad, no por {to}."),
            },
            NotConvertible::UnknownCount { unit } => Self::InsufficientData {
                hint: format!("Indica cuántas unidades trae la {unit}, por ejemplo \"{unit} x 12\"."),
            },
            NotConvertible::OutOfRange { .. } => Self::Overflow { operation: "price conversion" },
        }
    }
}
