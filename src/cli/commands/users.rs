//! Account management command handlers

use std::io::Write;

use crate::config::Config;
use crate::db::Store;
use crate::models::Role;
use crate::services::{AuthError, AuthService, SeaOrmAuthService};

fn read_secret(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

async fn auth_service(config: &Config) -> anyhow::Result<SeaOrmAuthService> {
    let store = Store::new(&config.general.database_path).await?;
    Ok(SeaOrmAuthService::new(store, config.security.clone()))
}

pub async fn cmd_register(config: &Config, username: &str, role: &str) -> anyhow::Result<()> {
    let role: Role = role.parse()?;
    let password = read_secret("Password: ")?;
    let confirm = read_secret("Confirm password: ")?;
    if password != confirm {
        println!("Passwords do not match.");
        return Ok(());
    }

    let auth = auth_service(config).await?;
    match auth.register(username, &password, role).await {
        Ok(info) => println!("✓ Registered {} ({})", info.username, info.role),
        Err(AuthError::DuplicateUsername) => println!("Username '{username}' already exists."),
        Err(AuthError::Validation(msg)) => println!("{msg}"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub async fn cmd_passwd(config: &Config, username: &str) -> anyhow::Result<()> {
    let current = read_secret("Current password: ")?;
    let new_password = read_secret("New password: ")?;

    let auth = auth_service(config).await?;
    match auth.change_password(username, &current, &new_password).await {
        Ok(()) => println!("✓ Password updated for {username}"),
        Err(AuthError::InvalidCredentials) => println!("Current password is incorrect."),
        Err(AuthError::Validation(msg)) => println!("{msg}"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub async fn cmd_role(config: &Config, username: &str) -> anyhow::Result<()> {
    let auth = auth_service(config).await?;
    match auth.get_user_role(username).await? {
        Some(role) => println!("{username}: {role}"),
        None => println!("User '{username}' not found."),
    }
    Ok(())
}
