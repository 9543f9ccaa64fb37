use std::io::Write;

use anyhow::Result;
use clap::Args;
use garge_core::provision::{
    ProvisionOutcome, ProvisionRequest, provision, sensor_rules, sensor_username,
};
use garge_crypto::generate_device_password;
use zeroize::Zeroizing;

use crate::prompt;
use crate::session::{DatabaseArgs, Session};

/// Arguments for the `sensor` subcommand.
#[derive(Debug, Args)]
pub struct SensorArgs {
    /// Device MAC address (e.g. `AA:BB:CC:DD:EE:FF`)
    #[arg(long)]
    pub mac: Option<String>,

    /// Ask for the password (or read GARGE_PASSWORD) instead of generating one
    #[arg(long)]
    pub password_prompt: bool,
}

/// Provision a sensor identity restricted to its own topic subtree.
pub async fn run(
    args: SensorArgs,
    db: &DatabaseArgs,
    non_interactive: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let session = Session::open(db, non_interactive).await?;
    let mac = prompt::prompt_mac(non_interactive, args.mac)?;
    let password = if args.password_prompt {
        Some(prompt::prompt_new_password(non_interactive)?)
    } else {
        None
    };
    execute(&session, &mac, password, out).await?;
    Ok(())
}

/// Write the sensor identity. A password is generated when none is given
/// and printed once; it cannot be recovered afterwards.
pub async fn execute(
    session: &Session,
    mac: &str,
    password: Option<Zeroizing<String>>,
    out: &mut dyn Write,
) -> Result<ProvisionOutcome> {
    let config = &session.config;
    let username = sensor_username(&config.project, mac)?;
    let generated = password.is_none();
    let password = match password {
        Some(password) => password,
        None => Zeroizing::new(generate_device_password(config.device.password_length)?),
    };

    let request = ProvisionRequest {
        rules: sensor_rules(&config.device.topic_prefix, &username),
        username,
        password,
        is_superuser: false,
    };
    let outcome = provision(&session.pool, &session.store, &config.hashing, &request).await?;

    writeln!(
        out,
        "Sensor '{}' {} ({} ACL rows)",
        outcome.username,
        crate::cli::describe(outcome.action),
        outcome.acl_rows,
    )?;
    writeln!(out, "  topic:    {}/{}/#", config.device.topic_prefix, outcome.username)?;
    writeln!(out, "  username: {}", outcome.username)?;
    if generated {
        writeln!(out, "  password: {}", request.password.as_str())?;
        writeln!(out, "Store this password on the device now; it is not shown again.")?;
    }
    Ok(outcome)
}
