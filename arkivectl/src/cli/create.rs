//! Interactive create-user flow.

use anyhow::Result;

use arkive_core::auth::{AuthStore, InitInfo};
use arkive_core::validation;

use crate::cli::{Context, prompts};

/// Pre-filled fields from the command line; anything absent is prompted.
#[derive(Debug, Default)]
pub struct CreateArgs {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
}

/// Create a new user, performing the same validation as the web path.
///
/// Invalid input prints a diagnostic and aborts the flow without touching
/// any store.
pub async fn run(ctx: &Context, args: CreateArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => {
            println!("let's create a new user..");
            prompts::input("email")?
        }
    };

    if validation::validate_email_format(&email).is_err() {
        println!("valid email required!");
        return Ok(());
    }
    if ctx.users.has_user_email(&email).await? {
        println!("A user already exists with {email} email!");
        return Ok(());
    }

    let username = match args.username {
        Some(username) => username,
        None => prompts::input("username")?,
    };
    if username.is_empty() {
        println!("please enter a username!");
        return Ok(());
    }
    let existing = ctx.users.usernames().await?;
    if let Err(err) = validation::validate_username(&username, &existing) {
        println!("{err}");
        return Ok(());
    }

    let name = match args.name {
        Some(name) => name,
        None => prompts::input_optional("name (optional)")?,
    };

    let roles = ctx.auth.list_roles().await?;
    let role = match args.role {
        Some(role) if roles.iter().any(|r| r.name == role) => role,
        _ => prompts::choose_role(&roles)?,
    };

    let (passwd, passwd2) = match args.password {
        Some(passwd) => (passwd.clone(), passwd),
        None => (
            prompts::password("password")?,
            prompts::password("repeat password")?,
        ),
    };
    if let Err(err) = validation::validate_password(&passwd, &passwd2) {
        println!("{err}");
        return Ok(());
    }

    println!(
        "Creating user {username} with the email {email} and the role: '{role}'"
    );

    ctx.auth
        .create_record(&username, &passwd, &role, &email, &name)
        .await?;

    let init_info = InitInfo {
        email,
        name,
        move_info: None,
    };
    ctx.lifecycle.create_new_user(&username, init_info).await?;

    println!("All done!");
    Ok(())
}
