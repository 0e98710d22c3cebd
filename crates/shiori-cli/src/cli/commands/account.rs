//! Session, profile and account command handlers

use shiori_api::types::{ContactMessage, ProfileUpdate};
use shiori_api::ApiClient;
use shiori_core::models::Subject;
use shiori_core::session::Session;

use crate::cli::{prompt, Context};

pub async fn cmd_login(
    ctx: &mut Context,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };
    let client = ctx.client()?;
    let session = client.login(email, &password).await?;
    let session = with_user_id(&client, session).await;
    ctx.save_session(session)?;
    println!("✓ Logged in as {email}");
    Ok(())
}

pub async fn cmd_register(
    ctx: &mut Context,
    username: &str,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let (password, confirm) = match password {
        Some(p) => (p.clone(), p),
        None => (prompt("Password")?, prompt("Confirm password")?),
    };
    let client = ctx.client()?;
    let session = client
        .register(username, email, &password, &confirm)
        .await?;
    let session = with_user_id(&client, session).await;
    ctx.save_session(session)?;
    println!("✓ Registered and logged in as {username}");
    Ok(())
}

/// Look the user id up with the new token when the auth response lacked one.
async fn with_user_id(client: &ApiClient, mut session: Session) -> Session {
    if session.user_id.is_some() {
        return session;
    }
    let authed = client.with_credential(Some(session.token.clone()));
    match authed.fetch_profile(&Subject::Me).await {
        Ok(profile) => session.user_id = profile.id,
        Err(e) => tracing::warn!(error = %e, "could not look up user id"),
    }
    session
}

pub fn cmd_logout(ctx: &mut Context) -> anyhow::Result<()> {
    if ctx.session.is_none() {
        println!("Not logged in.");
        return Ok(());
    }
    ctx.clear_session()?;
    println!("✓ Logged out");
    Ok(())
}

pub async fn cmd_profile(ctx: &Context, subject: Subject) -> anyhow::Result<()> {
    let profile = ctx.authed_client()?.fetch_profile(&subject).await?;
    println!("{}", profile.username);
    println!("{:-<40}", "");
    if let Some(id) = &profile.id {
        println!("ID:     {id}");
    }
    if !profile.email.is_empty() {
        println!("Email:  {}", profile.email);
    }
    println!("Avatar: {}", profile.avatar);
    Ok(())
}

pub async fn cmd_edit_profile(
    ctx: &Context,
    username: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let client = ctx.authed_client()?;
    let current = client.fetch_profile(&Subject::Me).await?;
    let update = ProfileUpdate {
        username: username.unwrap_or(current.username),
        email: email.unwrap_or(current.email),
        avatar: avatar.unwrap_or(current.avatar),
        password,
    };
    let profile = client.update_profile(&update).await?;
    println!("✓ Profile updated: {}", profile.username);
    Ok(())
}

pub async fn cmd_delete_account(ctx: &mut Context, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!("This deletes your account and your whole list.");
        println!("Run again with --yes to confirm.");
        return Ok(());
    }
    ctx.authed_client()?.delete_account().await?;
    ctx.clear_session()?;
    println!("✓ Account deleted");
    Ok(())
}

pub async fn cmd_contact(
    ctx: &Context,
    name: String,
    email: String,
    message: String,
) -> anyhow::Result<()> {
    if [&name, &email, &message].iter().any(|f| f.trim().is_empty()) {
        anyhow::bail!("name, email and message are all required");
    }
    ctx.client()?
        .send_contact(&ContactMessage {
            name,
            email,
            message,
        })
        .await?;
    println!("✓ Message sent");
    Ok(())
}
