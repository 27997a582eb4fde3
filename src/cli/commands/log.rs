//! Log command implementation
//!
//! Records one event from the command line. Without a configured key every
//! invocation generates and persists a new key, like any other process.

use super::{load_config_or_report, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::core::AuditPipeline;
use crate::domain::UserAttributes;
use clap::Args;
use serde_json::{Map, Value};

/// Arguments for the log command
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Event type, e.g. "message" or "command"
    pub event_type: String,

    /// User attributes as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub user: String,

    /// Free-text payload, encrypted before storage
    #[arg(long, default_value = "")]
    pub content: String,

    /// Structured payload as a JSON object, encrypted before storage
    #[arg(long)]
    pub data: Option<String>,
}

impl LogArgs {
    /// Execute the log command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let (user, data) = match self.parse_inputs() {
            Ok(inputs) => inputs,
            Err(e) => {
                println!("❌ Invalid event input");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let pipeline = match AuditPipeline::from_config(&config) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Failed to initialize audit pipeline");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        match pipeline.log_event(&self.event_type, &user, &self.content, data.as_ref()) {
            Ok(event_id) => {
                println!("✅ Event recorded: {event_id}");
                Ok(EXIT_OK)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to record event");
                println!("❌ Event not recorded");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    fn parse_inputs(&self) -> anyhow::Result<(UserAttributes, Option<Map<String, Value>>)> {
        let user: UserAttributes = serde_json::from_str(&self.user)
            .map_err(|e| anyhow::anyhow!("--user is not a valid user object: {e}"))?;
        let data = self
            .data
            .as_deref()
            .map(serde_json::from_str::<Map<String, Value>>)
            .transpose()
            .map_err(|e| anyhow::anyhow!("--data is not a JSON object: {e}"))?;
        Ok((user, data))
    }
}
