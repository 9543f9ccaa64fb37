use anyhow::{Result, bail};
use dialoguer::{Confirm, Input, Password};
use zeroize::Zeroizing;

/// Env var holding the database password in non-interactive mode.
pub const DB_PASSWORD_ENV: &str = "GARGE_DB_PASSWORD";

/// Env var holding the MQTT password in non-interactive mode.
pub const PASSWORD_ENV: &str = "GARGE_PASSWORD";

/// Prompt for the database admin username unless one was given.
pub fn prompt_db_user(non_interactive: bool, given: Option<&str>) -> Result<String> {
    if let Some(user) = given {
        return Ok(user.to_string());
    }
    if non_interactive {
        bail!("--db-user (or GARGE_DB_USER) is required in non-interactive mode");
    }
    let user: String = Input::new()
        .with_prompt("PostgreSQL admin username")
        .interact_text()?;
    Ok(user)
}

/// Prompt for the database admin password (hidden input).
pub fn prompt_db_password(non_interactive: bool) -> Result<Zeroizing<String>> {
    if non_interactive {
        return secret_from_env(DB_PASSWORD_ENV);
    }
    let password: String = Password::new()
        .with_prompt("PostgreSQL admin password")
        .interact()?;
    Ok(Zeroizing::new(password))
}

/// Prompt for an MQTT username unless one was given.
pub fn prompt_username(non_interactive: bool, given: Option<String>) -> Result<String> {
    let username = match given {
        Some(username) => username,
        None if non_interactive => {
            bail!("--username is required in non-interactive mode");
        }
        None => Input::new().with_prompt("MQTT username").interact_text()?,
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        bail!("username must not be empty");
    }
    Ok(username)
}

/// Prompt for a device MAC address unless one was given.
pub fn prompt_mac(non_interactive: bool, given: Option<String>) -> Result<String> {
    match given {
        Some(mac) => Ok(mac),
        None if non_interactive => bail!("--mac is required in non-interactive mode"),
        None => Ok(Input::new()
            .with_prompt("Device MAC address")
            .interact_text()?),
    }
}

/// Prompt for a new MQTT password, asking twice.
///
/// Passwords are taken verbatim in every mode so `verify` recomputes the hash
/// over exactly the bytes that were stored.
pub fn prompt_new_password(non_interactive: bool) -> Result<Zeroizing<String>> {
    if non_interactive {
        return secret_from_env(PASSWORD_ENV);
    }
    let password: String = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    Ok(Zeroizing::new(password))
}

/// Prompt for an existing MQTT password.
pub fn prompt_password(non_interactive: bool) -> Result<Zeroizing<String>> {
    if non_interactive {
        return secret_from_env(PASSWORD_ENV);
    }
    let password: String = Password::new().with_prompt("Password").interact()?;
    Ok(Zeroizing::new(password))
}

/// Ask a yes/no question. Non-interactive runs take `default`.
pub fn confirm(non_interactive: bool, prompt: &str, default: bool) -> Result<bool> {
    if non_interactive {
        return Ok(default);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

fn secret_from_env(var: &str) -> Result<Zeroizing<String>> {
    secret_from(var, |key| std::env::var(key).ok())
}

fn secret_from<F>(var: &str, lookup: F) -> Result<Zeroizing<String>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.is_empty() => Ok(Zeroizing::new(value)),
        _ => bail!("{var} env var is required in non-interactive mode"),
    }
}
