use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::services::username::find_unique_username;

pub async fn cmd_unique_username(config: &Config, base: &str) -> anyhow::Result<()> {
    let base = base.trim();
    if base.is_empty() {
        println!("Usage: campadmin unique-username <base>");
        return Ok(());
    }

    let store = Store::new(&config.general.database_path).await?;

    let username = find_unique_username(
        &store,
        base,
        None,
        config.security.username_max_attempts,
    )
    .await
    .context("Failed to resolve a unique username")?;

    println!("{username}");
    Ok(())
}
