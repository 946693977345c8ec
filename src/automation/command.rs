use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AgentOutcome, AutomationAgent, AutomationError};
use crate::config::AutomationConfig;

const GOAL_PLACEHOLDER: &str = "{goal}";

/// Runs an external automation CLI (droidrun by default) once per goal.
pub struct CommandAgent {
    config: AutomationConfig,
}

impl CommandAgent {
    pub fn new(config: AutomationConfig) -> Self {
        Self { config }
    }

    pub fn is_available(&self) -> bool {
        which::which(&self.config.command).is_ok()
    }

    fn goal_in_args(&self) -> bool {
        self.config.args.iter().any(|arg| arg.contains(GOAL_PLACEHOLDER))
    }

    fn build_command(&self, goal: &str) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(
            self.config
                .args
                .iter()
                .map(|arg| arg.replace(GOAL_PLACEHOLDER, goal)),
        )
        .stdin(if self.goal_in_args() {
            Stdio::null()
        } else {
            Stdio::piped()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        cmd
    }
}

#[async_trait]
impl AutomationAgent for CommandAgent {
    fn name(&self) -> &str {
        &self.config.command
    }

    async fn run(&self, goal: &str) -> Result<AgentOutcome, AutomationError> {
        let mut child = self.build_command(goal).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AutomationError::CommandNotFound(self.config.command.clone())
            } else {
                AutomationError::Spawn(e)
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(goal.as_bytes()).await {
                Ok(()) => drop(stdin),
                // The agent may exit without reading its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin early", self.config.command)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(outcome) = parse_outcome(&stdout) {
            return Ok(outcome);
        }

        if !output.status.success() {
            warn!("{} exited with {}", self.config.command, output.status);
            return Err(AutomationError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let reason = stdout.trim();
        Ok(AgentOutcome {
            success: true,
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        })
    }
}

/// Structured outcome from the whole output, or else from the last line that holds one.
fn parse_outcome(stdout: &str) -> Option<AgentOutcome> {
    serde_json::from_str(stdout.trim()).ok().or_else(|| {
        stdout
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str(line.trim()).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_outcome() {
        let stdout = "step 1: open app\nstep 2: read prices\n{\"success\": true, \"reason\": \"[]\"}\n";
        assert_eq!(
            parse_outcome(stdout),
            Some(AgentOutcome {
                success: true,
                reason: Some("[]".to_string())
            })
        );
        assert_eq!(
            parse_outcome(r#"{"success": false}"#),
            Some(AgentOutcome {
                success: false,
                reason: None
            })
        );
        assert_eq!(parse_outcome("[1, 2, 3]"), None);
    }

    #[tokio::test]
    async fn test_missing_command() {
        let agent = CommandAgent::new(AutomationConfig {
            command: "smartcab-no-such-agent".to_string(),
            ..AutomationConfig::default()
        });
        assert!(!agent.is_available());
        assert!(matches!(
            agent.run("goal").await,
            Err(AutomationError::CommandNotFound(_))
        ));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> CommandAgent {
        CommandAgent::new(AutomationConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: HashMap::from([("SMARTCAB_FARE".to_string(), "120".to_string())]),
            demo_when_missing: false,
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_goal_goes_to_stdin_without_placeholder() {
        let outcome = shell("cat").run("Open Ola app.").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.reason.as_deref(), Some("Open Ola app."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_goal_substituted_into_args() {
        let agent = CommandAgent::new(AutomationConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "echo \"$0\"".to_string(), "{goal}".to_string()],
            env: HashMap::new(),
            demo_when_missing: false,
        });
        let outcome = agent.run("Open Rapido app.").await.unwrap();
        assert_eq!(outcome.reason.as_deref(), Some("Open Rapido app."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_structured_outcome_and_env() {
        let outcome = shell(r#"echo working; echo "{\"success\": false, \"reason\": \"fare $SMARTCAB_FARE\"}""#)
            .run("goal")
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.reason.as_deref(), Some("fare 120"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_is_an_error() {
        let err = shell("echo device offline >&2; exit 3").run("goal").await.unwrap_err();
        match err {
            AutomationError::Failed { stderr, .. } => assert_eq!(stderr, "device offline"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
