//! Interactive modify-user flow: role and email changes.

use anyhow::Result;

use arkive_core::auth::AuthStore;
use arkive_core::validation;

use crate::cli::{Context, prompts};

/// Modify an existing user. Each change is offered in turn; declining
/// both leaves every store untouched.
pub async fn run(ctx: &Context, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompts::input("username to modify")?,
    };

    let Some(record) = ctx.auth.user(&username).await? else {
        println!("{username} doesn't exist");
        return Ok(());
    };

    let mut has_modified = false;

    if prompts::confirm(&format!(
        "change role? currently {}",
        record.role
    ))? {
        let roles = ctx.auth.list_roles().await?;
        let new_role = prompts::choose_role(&roles)?;
        ctx.auth.set_role(&username, &new_role).await?;
        ctx.users.set_role(&username, &new_role).await?;
        has_modified = true;
        println!("assigned {username} with the new role: {new_role}");
    }

    if prompts::confirm(&format!(
        "update email? currently {}",
        record.email_addr
    ))? {
        let new_email = prompts::input("new email")?;

        if validation::validate_email_format(&new_email).is_err() {
            println!("valid email required!");
            return Ok(());
        }
        if ctx.users.has_user_email(&new_email).await? {
            println!("A user already exists with {new_email} email!");
            return Ok(());
        }

        // The list API cannot update an address in place, so when both
        // sides of the integration are on, drop the old address and
        // subscribe the new one.
        if ctx.mailing_list.is_enabled() && ctx.mailing_list.remove_on_delete()
        {
            ctx.mailing_list.unsubscribe(&record.email_addr).await;
            let name = ctx
                .users
                .get(&username)
                .await?
                .map(|rec| rec.name)
                .unwrap_or_default();
            ctx.mailing_list
                .subscribe(&username, &new_email, &name, None)
                .await;
        }

        ctx.auth.set_email(&username, &new_email).await?;
        ctx.users.set_email(&username, &new_email).await?;
        has_modified = true;
        println!("assigned {username} with the new email: {new_email}");
    }

    if has_modified {
        println!("All done!");
    }
    Ok(())
}
