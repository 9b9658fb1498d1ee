//! Prompts interativos (dialoguer).

use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::{GchatError, GchatResult};

fn prompt_error(err: dialoguer::Error) -> GchatError {
    GchatError::other(format!("prompt failed: {err}"))
}

/// Pede o código de autorização (ou a URL de redirecionamento inteira).
pub fn prompt_authorization_code() -> GchatResult<String> {
    let theme = ColorfulTheme::default();

    Input::<String>::with_theme(&theme)
        .with_prompt("Paste the authorization code or the full redirect URL")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("value must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(prompt_error)
}

/// Confirma a substituição de um token já salvo.
pub fn confirm_replace_token() -> GchatResult<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("A token is already stored. Replace it?")
        .default(false)
        .interact()
        .map_err(prompt_error)
}
