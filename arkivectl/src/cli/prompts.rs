//! Prompt helpers shared by the interactive flows.
//!
//! Prompts render on stderr so stdout stays clean for operator-facing
//! output.

use anyhow::Result;
use dialoguer::console::Term;
use dialoguer::{Confirm, Input, Password, Select};

use arkive_core::auth::RoleEntry;

/// Prompt for a required line of input.
pub fn input(prompt: &str) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .interact_text_on(&Term::stderr())?;
    Ok(answer.trim().to_string())
}

/// Prompt for input that may be left empty.
pub fn input_optional(prompt: &str) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text_on(&Term::stderr())?;
    Ok(answer.trim().to_string())
}

/// Prompt for a password without echoing it.
pub fn password(prompt: &str) -> Result<String> {
    let answer = Password::new()
        .with_prompt(prompt)
        .interact_on(&Term::stderr())?;
    Ok(answer)
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact_on(&Term::stderr())?;
    Ok(answer)
}

/// Menu over however many roles the system has; returns the chosen name.
pub fn choose_role(roles: &[RoleEntry]) -> Result<String> {
    let labels: Vec<String> = roles
        .iter()
        .map(|role| format!("{} (level {})", role.name, role.level))
        .collect();
    let choice = Select::new()
        .with_prompt("choose a role")
        .items(&labels)
        .default(0)
        .interact_on(&Term::stderr())?;
    Ok(roles[choice].name.clone())
}
