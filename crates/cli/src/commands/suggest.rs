use mercado_core::config::LoadOptions;
use mercado_core::ProductId;

use crate::commands::{run_engine_command, CommandResult};

pub fn run(options: &LoadOptions, product_id: i64) -> CommandResult {
    let product_id = ProductId(product_id);
    match run_engine_command("suggest", options, |engine| async move {
        engine.suggest_price(product_id).await
    }) {
        Ok(suggestion) => CommandResult::success_with(
            "suggest",
            format!(
                "suggested price for product {product_id}: {:.2}",
                suggestion.recommended_price
            ),
            suggestion,
        ),
        Err(failure) => failure,
    }
}
