//! Interactive delete-user flow with confirmation retype.

use anyhow::Result;

use crate::cli::{Context, prompts};

/// Delete a user after the operator retypes the username.
///
/// A mismatched confirmation aborts before any state is touched.
pub async fn run(ctx: &Context, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompts::input("username to delete")?,
    };

    println!(
        "** all data for the username `{username}` will be wiped! **"
    );
    let confirmation =
        prompts::input("please type the username again to confirm")?;

    if username != confirmation {
        println!("Username confirmation didn't match! Aborting..");
        return Ok(());
    }

    if !ctx.users.contains(&username).await? {
        println!("The username {username} doesn't exist..");
        return Ok(());
    }

    println!("removing {username}..");
    ctx.lifecycle.delete_user(&username).await?;
    Ok(())
}
