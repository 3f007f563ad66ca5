use mercado_core::config::LoadOptions;
use mercado_core::ProductId;

use crate::commands::{run_engine_command, CommandResult};

pub fn run(options: &LoadOptions, product_id: i64) -> CommandResult {
    let product_id = ProductId(product_id);
    match run_engine_command("demand", options, |engine| async move {
        engine.estimate_demand(product_id).await
    }) {
        Ok(estimate) => CommandResult::success_with(
            "demand",
            format!("demand for product {product_id} is {}", estimate.level.as_str()),
            estimate,
        ),
        Err(failure) => failure,
    }
}
