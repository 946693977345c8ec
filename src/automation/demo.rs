use async_trait::async_trait;
use std::time::Duration;

use super::{AgentOutcome, AutomationAgent, AutomationError};

const UBER_PRICES: &str = r#"[{"service":"Uber Go","price":325.14,"eta":2},{"service":"Auto","price":165.0,"eta":4},{"service":"Bike Saver","price":224.41,"eta":4}]"#;
const OLA_PRICES: &str = r#"[{"service":"Mini","price":310,"eta":6},{"service":"Auto","price":150,"eta":5},{"service":"Bike","price":95,"eta":3}]"#;
const RAPIDO_PRICES: &str = r#"[{"ride_type":"Cab Economy","estimated_fare":"₹298","eta":"7 mins"},{"ride_type":"Auto","estimated_fare":"₹142","eta":"6 mins"},{"ride_type":"Bike","estimated_fare":"₹88","time":"4 mins"}]"#;

/// Replies with canned price lists so the whole flow runs without a phone.
pub struct DemoAgent {
    delay: Duration,
}

impl DemoAgent {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(400),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for DemoAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutomationAgent for DemoAgent {
    fn name(&self) -> &str {
        "demo"
    }

    async fn run(&self, goal: &str) -> Result<AgentOutcome, AutomationError> {
        tokio::time::sleep(self.delay).await;

        let reason = if goal.contains("Vehicle type preference") {
            "Ride booked. Driver is on the way.".to_string()
        } else if goal.contains("Open Uber app") {
            UBER_PRICES.to_string()
        } else if goal.contains("Open Ola app") {
            OLA_PRICES.to_string()
        } else if goal.contains("Open Rapido app") {
            RAPIDO_PRICES.to_string()
        } else {
            return Ok(AgentOutcome {
                success: false,
                reason: Some("Unsupported goal".to_string()),
            });
        };

        Ok(AgentOutcome {
            success: true,
            reason: Some(reason),
        })
    }
}
