use mercado_core::pricing::convert_unit_price;
use rust_decimal::Decimal;

use crate::commands::CommandResult;

/// Needs neither configuration nor a database.
pub fn run(price: Decimal, from: &str, to: &str, product_name: &str) -> CommandResult {
    match convert_unit_price(price, from, to, product_name) {
        Ok(converted) => CommandResult::success_with(
            "convert",
            format!("{price} per {from} is {:.4} per {}", converted.price, converted.unit),
            converted,
        ),
        Err(error) => CommandResult::engine_failure("convert", &error),
    }
}
