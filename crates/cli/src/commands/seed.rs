use mercado_core::config::LoadOptions;
use mercado_db::{connect_with_config, DemoDataset, SeedSummary};

use crate::commands::{
    build_runtime, load_config, CommandResult, EXIT_DB_CONNECTIVITY, EXIT_ENGINE,
};

/// Installs the marketplace schema and replaces its rows with the demo dataset.
pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;

        let loaded = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_ENGINE));

        pool.close().await;
        loaded
    });

    match result {
        Ok(summary) => CommandResult::success_with("seed", seed_message(&summary), summary),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(summary: &SeedSummary) -> String {
    format!(
        "demo marketplace loaded: {} sellers, {} products, {} orders, {} order lines",
        summary.sellers, summary.products, summary.orders, summary.order_lines
    )
}
