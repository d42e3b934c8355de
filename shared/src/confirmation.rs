use crate::types::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::io::IsTerminal;

/// Yes/no prompt. Without a terminal, or when the user presses Esc, the
/// default is taken.
pub fn ask_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(default_yes);
    }
    let choice = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default_yes)
        .show_default(true)
        .interact_opt()?;
    Ok(choice.unwrap_or(default_yes))
}

/// One line of free text, trimmed. Empty input is allowed.
pub fn ask_line(prompt: &str) -> Result<String> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(input.trim().to_string())
}
