//! Agents command handler.
//!
//! Lists the specialist roster the classifier routes against.

use agrimind_agents::AgentKind;
use agrimind_core::{config::AppConfig, AppResult};
use clap::Args;

/// List the specialist agent roster
#[derive(Args, Debug)]
pub struct AgentsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AgentsCommand {
    pub async fn execute(&self, _config: &AppConfig) -> AppResult<()> {
        if self.json {
            let roster: Vec<_> = AgentKind::ALL
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "name": kind.name(),
                        "description": kind.description(),
                        "imageCapable": kind.image_capable(),
                    })
                })
                .collect();

            println!(
                "{}",
                serde_json::to_string_pretty(&roster).unwrap_or_default()
            );
        } else {
            for kind in AgentKind::ALL {
                let marker = if kind.image_capable() { " [image]" } else { "" };
                println!("{}{}", kind.name(), marker);
                println!("    {}", kind.description());
            }
        }

        Ok(())
    }
}
