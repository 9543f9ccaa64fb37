//! Command-line surface of `garge-provision`.

use std::io::Write;

use anyhow::Result;
use clap::{Parser, Subcommand};
use garge_core::provision::ProvisionAction;

use crate::admin::AdminArgs;
use crate::sensor::SensorArgs;
use crate::session::DatabaseArgs;
use crate::show::ShowArgs;
use crate::verify::VerifyArgs;

/// garge MQTT credential provisioning tool.
#[derive(Debug, Parser)]
#[command(name = "garge-provision", version, about)]
pub struct Cli {
    /// Run without interactive prompts (secrets come from GARGE_* env vars)
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create or update the MQTT admin (superuser) account
    Admin(AdminArgs),
    /// Create or update a sensor account from its MAC address
    Sensor(SensorArgs),
    /// Check a password against the stored hash
    Verify(VerifyArgs),
    /// Create the user and ACL tables if missing
    InitSchema,
    /// Print a user's flags and ACL rows
    Show(ShowArgs),
}

impl Cli {
    /// Dispatch to the selected subcommand.
    pub async fn run(self, out: &mut dyn Write) -> Result<()> {
        let db = &self.db;
        let non_interactive = self.non_interactive;
        match self.command {
            Commands::Admin(args) => crate::admin::run(args, db, non_interactive, out).await,
            Commands::Sensor(args) => crate::sensor::run(args, db, non_interactive, out).await,
            Commands::Verify(args) => crate::verify::run(args, db, non_interactive, out).await,
            Commands::InitSchema => crate::schema::run(db, non_interactive, out).await,
            Commands::Show(args) => crate::show::run(args, db, non_interactive, out).await,
        }
    }
}

pub(crate) const fn describe(action: ProvisionAction) -> &'static str {
    match action {
        ProvisionAction::Created => "created",
        ProvisionAction::Updated => "updated",
    }
}
