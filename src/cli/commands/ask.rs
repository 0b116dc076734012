//! One-shot assistant query

use crate::config::Config;
use crate::services::AssistantDomain;
use crate::state::SharedState;

pub async fn cmd_ask(config: Config, domain: &str, message: &str) -> anyhow::Result<()> {
    let domain = AssistantDomain::from_tag(domain);
    let state = SharedState::new(config).await?;

    println!("Asking the {domain} assistant...");
    println!();
    let reply = state.assistant.send_message("cli", message, domain).await;
    println!("{reply}");

    Ok(())
}
