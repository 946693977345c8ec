use async_trait::async_trait;
use std::sync::Arc;

use super::{RideApp, CONFIRM_TAIL, RETURN_JSON_TAIL};
use crate::automation::{run_task, AutomationAgent, AutomationError, TaskResult};
use crate::compare::{App, RawProviderResult, VehicleClass};

pub struct Rapido {
    agent: Arc<dyn AutomationAgent>,
}

impl Rapido {
    pub fn new(agent: Arc<dyn AutomationAgent>) -> Self {
        Self { agent }
    }
}

pub fn price_goal(pickup: &str, destination: &str) -> String {
    format!(
        r#"Open Rapido app.
Set pickup location to "{pickup}".
Set destination to "{destination}".
Wait for price info.

Extract all ride options.
Make sure all the details are extracted correctly, no missing fields or incorrect data.

Return JSON array.
{RETURN_JSON_TAIL}"#
    )
}

pub fn booking_goal(pickup: &str, destination: &str, class: VehicleClass) -> String {
    format!(
        r#"Open Rapido app.
Set pickup to "{pickup}".
Set destination to "{destination}".

Vehicle type preference: {class}

Select cheapest option in:
- cab → Cab Economy / Cab Priority
- auto → Auto
- bike → Bike

Tap Book Ride.

{CONFIRM_TAIL}"#
    )
}

#[async_trait]
impl RideApp for Rapido {
    fn app(&self) -> App {
        App::Rapido
    }

    async fn fetch_prices(
        &self,
        pickup: &str,
        destination: &str,
    ) -> Result<RawProviderResult, AutomationError> {
        let result = run_task(self.agent.as_ref(), &price_goal(pickup, destination)).await?;
        Ok(result.to_value())
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
