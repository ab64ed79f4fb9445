//! Account management commands

use crate::state::SharedState;

pub async fn cmd_user_add(
    state: &SharedState,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let user = state.auth.register(username, password).await?;
    println!("✓ Usuario '{}' creado (id {})", user.username, user.id);
    Ok(())
}
