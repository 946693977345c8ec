pub mod command;
pub mod demo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::providers::reply_parser::fenced_block;

pub use command::CommandAgent;
pub use demo::DemoAgent;

/// What the automation agent reports when a goal finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub success: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Automation command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to start automation agent: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Automation agent exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can carry out a natural-language goal on the phone.
#[async_trait]
pub trait AutomationAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, goal: &str) -> Result<AgentOutcome, AutomationError>;
}

/// Agent outcome plus a best-effort JSON reading of its reason.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub success: bool,
    pub json: Option<Value>,
    pub raw_reason: Option<String>,
}

impl TaskResult {
    pub fn from_outcome(outcome: AgentOutcome) -> Self {
        let json = outcome.reason.as_deref().and_then(parse_reason);
        Self {
            success: outcome.success,
            json,
            raw_reason: outcome.reason,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "success": self.success,
            "json": self.json,
            "raw_reason": self.raw_reason,
        })
    }
}

/// Run `goal` to completion and parse whatever the agent returned.
pub async fn run_task(agent: &dyn AutomationAgent, goal: &str) -> Result<TaskResult, AutomationError> {
    debug!("{} goal:\n{}", agent.name(), goal.trim());
    let outcome = agent.run(goal).await?;
    debug!("{} finished (success: {}): {:?}", agent.name(), outcome.success, outcome.reason);
    Ok(TaskResult::from_outcome(outcome))
}

fn parse_reason(reason: &str) -> Option<Value> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed)
        .ok()
        .or_else(|| fenced_block(trimmed).and_then(|block| serde_json::from_str(block).ok()))
}
