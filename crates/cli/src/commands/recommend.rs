use mercado_core::config::LoadOptions;
use mercado_core::{ConsumerId, RecommendationKind};

use crate::commands::{run_engine_command, CommandResult};

pub fn run(options: &LoadOptions, consumer_id: i64) -> CommandResult {
    match run_engine_command("recommend", options, |engine| async move {
        engine.recommend_products(ConsumerId(consumer_id)).await
    }) {
        Ok(recommendations) => {
            let basis = match recommendations.kind {
                RecommendationKind::Personalizado => "purchase history",
                RecommendationKind::Global => "catalog popularity",
            };
            CommandResult::success_with(
                "recommend",
                format!(
                    "{} products recommended for consumer {consumer_id} from {basis}",
                    recommendations.items.len()
                ),
                recommendations,
            )
        }
        Err(failure) => failure,
    }
}
