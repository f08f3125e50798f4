use anyhow::Result;
use colored::Colorize;

use parley_application::ConversationManager;

pub async fn run(manager: &ConversationManager) -> Result<()> {
    let personas = manager.list_conversations().await;

    if personas.is_empty() {
        println!("{}", "No conversations yet.".bright_black());
        return Ok(());
    }

    println!("{}", "Conversations:".bright_magenta().bold());
    for persona in personas {
        println!("  {}", persona.bright_cyan());
    }
    Ok(())
}
