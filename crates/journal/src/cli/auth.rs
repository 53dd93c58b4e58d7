//! Account command handlers.
//!
//! Handles register, login, logout and whoami.

use super::Context;
use super::util::{prompt, report_error};

fn read_password(password: Option<String>) -> Option<String> {
    password.or_else(|| prompt("Password: "))
}

/// Handle the register command - create an account and keep its session.
pub async fn handle_register(
    ctx: &mut Context,
    username: &str,
    email: &str,
    password: Option<String>,
) -> bool {
    let Some(password) = read_password(password) else {
        eprintln!("✗ A password is required");
        return false;
    };

    println!("Registering with {}...", ctx.client.session().server_url());

    match ctx.client.register(username, email, &password).await {
        Ok(user) => {
            ctx.save_session();
            println!("✓ Registered and logged in as {} <{}>", user.username, user.email);
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

/// Handle the login command.
pub async fn handle_login(ctx: &mut Context, email: &str, password: Option<String>) -> bool {
    let Some(password) = read_password(password) else {
        eprintln!("✗ A password is required");
        return false;
    };

    match ctx.client.login(email, &password).await {
        Ok(user) => {
            ctx.save_session();
            println!("✓ Logged in as {} <{}>", user.username, user.email);
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            eprintln!();
            eprintln!("Please check:");
            eprintln!("  - Your email and password");
            eprintln!("  - The server URL is correct: {}", ctx.config.base_url());
            false
        }
    }
}

/// Handle the logout command - revoke the token and forget it locally.
pub async fn handle_logout(ctx: &mut Context) -> bool {
    if !ctx.client.is_authenticated() {
        println!("Not logged in.");
        return true;
    }

    if let Err(e) = ctx.client.logout().await {
        log::warn!("server-side logout failed: {}", e);
        eprintln!("Warning: Could not reach the server, the session was only removed locally");
    }

    ctx.save_session();
    println!("✓ Logged out");
    true
}

/// Handle the whoami command.
pub async fn handle_whoami(ctx: &Context) -> bool {
    match ctx.client.profile().await {
        Ok(profile) => {
            println!("Username: {}", profile.username);
            println!("Email:    {}", profile.email);
            println!("Server:   {}", ctx.config.base_url());
            println!("Joined:   {}", profile.created_at.format("%Y-%m-%d"));
            if let Some(last_login) = profile.last_login_date {
                println!("Last login: {}", last_login.format("%Y-%m-%d %H:%M UTC"));
            }
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}
