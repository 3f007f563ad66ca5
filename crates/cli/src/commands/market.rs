use mercado_core::config::LoadOptions;
use mercado_core::MarketPriceRequest;
use rust_decimal::Decimal;

use crate::commands::{run_engine_command, CommandResult};

/// A report with `found = false` is still a successful command: the
/// outcome and advice inside it are the answer.
pub fn run(options: &LoadOptions, name: &str, price: Decimal, unit: &str) -> CommandResult {
    let request = MarketPriceRequest::new(name, price).with_unit(unit);
    let result = run_engine_command("market", options, |engine| async move {
        Ok(engine.recommend_market_price(&request).await)
    });

    match result {
        Ok(report) => {
            let message = if report.found {
                format!(
                    "{} against {} comparable products",
                    report.classification.as_str(),
                    report.converted_count
                )
            } else {
                format!("no market reference ({})", report.outcome)
            };
            CommandResult::success_with("market", message, report)
        }
        Err(failure) => failure,
    }
}
