pub mod arbiter;
pub mod normalize;

pub use arbiter::{Arbiter, Choice, Verdict, VerdictSource};
pub use normalize::{
    App, KeywordTable, Normalizer, ProviderPayload, RawProviderResult, RideOption, VehicleClass,
};

/// Normalized options plus the verdict drawn from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub options: Vec<RideOption>,
    pub choice: Choice,
}

/// Normalize the three raw results for `class` and let the arbiter pick a winner.
pub async fn compare_and_choose(
    normalizer: &Normalizer,
    arbiter: &Arbiter,
    uber: &RawProviderResult,
    ola: &RawProviderResult,
    rapido: &RawProviderResult,
    class: VehicleClass,
) -> Comparison {
    let options = normalizer.normalize(uber, ola, rapido, class);
    let choice = arbiter.choose(&options).await;
    Comparison { options, choice }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_no_matches_is_no_service() {
        let uber = json!([{"service": "Uber Go", "price": 300, "eta": 5}]);
        let comparison = compare_and_choose(
            &Normalizer::default(),
            &Arbiter::fallback_only(),
            &uber,
            &Value::Null,
            &json!({"error": "No JSON extracted"}),
            VehicleClass::Bike,
        )
        .await;

        assert!(comparison.options.is_empty());
        assert_eq!(comparison.choice, Choice::NoServiceFound);
    }

    #[tokio::test]
    async fn test_auto_scenario_picks_cheapest() {
        let uber = json!([{"service": "Uber Go", "price": 300, "eta": 5}]);
        let ola = json!({"success": true, "json": [{"service": "Auto", "price": 120, "eta": 6}]});
        let rapido = json!([{"ride_type": "Auto", "estimated_fare": "₹110", "eta": "8 mins"}]);

        let comparison = compare_and_choose(
            &Normalizer::default(),
            &Arbiter::fallback_only(),
            &uber,
            &ola,
            &rapido,
            VehicleClass::Auto,
        )
        .await;

        assert_eq!(comparison.options.len(), 2);
        assert_eq!(comparison.choice.winner(), Some(App::Rapido));
    }
}
