use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::{RideApp, CONFIRM_TAIL, RETURN_JSON_TAIL};
use crate::automation::{run_task, AutomationAgent, AutomationError, TaskResult};
use crate::compare::{App, RawProviderResult, VehicleClass};

pub struct Uber {
    agent: Arc<dyn AutomationAgent>,
}

impl Uber {
    pub fn new(agent: Arc<dyn AutomationAgent>) -> Self {
        Self { agent }
    }
}

pub fn price_goal(pickup: &str, destination: &str) -> String {
    format!(
        r#"Open Uber app.
Set pickup location to "{pickup}".
Set destination to "{destination}".
Wait until price options are visible.

Extract all available cab options with:
- service name
- price in INR
- ETA in minutes
Make sure all the details are extracted correctly, no missing fields or incorrect data.
Create a JSON array like:
[
  {{"service":"Uber Go","price":325.14,"eta":2}},
  {{"service":"Bike Saver","price":224.41,"eta":4}}
]

{RETURN_JSON_TAIL}"#
    )
}

pub fn booking_goal(pickup: &str, destination: &str, class: VehicleClass) -> String {
    format!(
        r#"Open Uber app.
If pickup or destination is not set,
Set pickup location to "{pickup}".
Set destination to "{destination}".
and if already set, verify they are correct.
if not correct, update them.
Vehicle type preference: {class}

If vehicle_type is:
- cab: choose Uber Go / Sedan / Mini / Prime
- auto: choose Auto
- bike: choose Bike Saver / Moto

Select the cheapest option in that category.

Tap Book or Confirm Ride button.

{CONFIRM_TAIL}"#
    )
}

#[async_trait]
impl RideApp for Uber {
    fn app(&self) -> App {
        App::Uber
    }

    /// The parsed list, or an error marker carrying the agent's raw text.
    async fn fetch_prices(
        &self,
        pickup: &str,
        destination: &str,
    ) -> Result<RawProviderResult, AutomationError> {
        let result = run_task(self.agent.as_ref(), &price_goal(pickup, destination)).await?;
        Ok(match result.json {
            Some(json) => json,
            None => json!({
                "error": "No JSON extracted",
                "reason": result.raw_reason,
            }),
        })
    }

    async fn book_ride(
        &self,
        pickup: &str,
        destination: &str,
        class: VehicleClass,
    ) -> Result<TaskResult, AutomationError> {
        run_task(self.agent.as_ref(), &booking_goal(pickup, destination, class)).await
    }
}
