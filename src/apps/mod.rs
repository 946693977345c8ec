pub mod ola;
pub mod rapido;
pub mod uber;

use async_trait::async_trait;
use std::sync::Arc;

use crate::automation::{AutomationAgent, AutomationError, TaskResult};
use crate::compare::{App, RawProviderResult, VehicleClass};

pub use ola::Ola;
pub use rapido::Rapido;
pub use uber::Uber;

/// Shared tail of every price goal: hand back the list and leave the phone idle.
const RETURN_JSON_TAIL: &str = "DO NOT use remember().
Instead, return the JSON array directly as the reason in complete().

After that, go to the Android home screen.

Return ONLY the JSON array text.";

const CONFIRM_TAIL: &str = "the ride should be booked.
confirm booking everything should be managed by you.";

/// One ride-hailing app driven through the automation agent.
#[async_trait]
pub trait RideApp: Send + Sync {
    fn app(&self) -> App;

    async fn fetch_prices(
        &self,
        pickup: &str,
        destination: &str,
    ) -> Result<RawProviderResult, AutomationError>;

    async fn book_ride(
        &self,
        pickup: &str,
        destination: &str,
        class: VehicleClass,
    ) -> Result<TaskResult, AutomationError>;
}

/// Uber, Ola and Rapido in fetch order, all sharing one agent.
pub fn default_apps(agent: Arc<dyn AutomationAgent>) -> Vec<Arc<dyn RideApp>> {
    vec![
        Arc::new(Uber::new(agent.clone())),
        Arc::new(Ola::new(agent.clone())),
        Arc::new(Rapido::new(agent)),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::automation::AgentOutcome;
    use std::sync::Mutex;

    /// Records every goal and answers with a fixed reason.
    pub struct RecordingAgent {
        reason: Option<String>,
        pub goals: Mutex<Vec<String>>,
    }

    impl RecordingAgent {
        pub fn replying(reason: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reason: reason.map(str::to_string),
                goals: Mutex::new(Vec::new()),
            })
        }

        pub fn last_goal(&self) -> String {
            self.goals.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl AutomationAgent for RecordingAgent {
        fn name(&self) -> &str {
            "recording"
        }

        async fn run(&self, goal: &str) -> Result<AgentOutcome, AutomationError> {
            self.goals.lock().unwrap().push(goal.to_string());
            Ok(AgentOutcome {
                success: true,
                reason: self.reason.clone(),
            })
        }
    }
}
