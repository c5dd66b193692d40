//! Interactive prompts. Every caller has a flag that bypasses them.

use crate::error::ApiError;
use dialoguer::{Confirm, Input, Select};
use std::io::IsTerminal;

fn input_error(e: dialoguer::Error) -> ApiError {
    ApiError::ConfigError(format!("Failed to get user input: {}", e))
}

/// Whether stdin is attached to a terminal.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool, ApiError> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(input_error)
}

/// Required free-text answer.
pub fn required_text(prompt: &str) -> Result<String, ApiError> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("A value is required")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(input_error)
}

pub fn text_with_default(prompt: &str, default: &str) -> Result<String, ApiError> {
    Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(input_error)
}

pub fn email(prompt: &str) -> Result<String, ApiError> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.contains('@') {
                Ok(())
            } else {
                Err("Please enter a valid email address")
            }
        })
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(input_error)
}

pub fn login_code(prompt: &str) -> Result<String, ApiError> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().chars().count() == 6 {
                Ok(())
            } else {
                Err("Please enter the 6-digit code")
            }
        })
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(input_error)
}

/// Index of the chosen item.
pub fn select(prompt: &str, items: &[&str], default: usize) -> Result<usize, ApiError> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()
        .map_err(input_error)
}
