//! Resolved configuration plus an open database pool for one invocation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use garge_core::AclStore;
use garge_core::config::{Config, Environment, load_config};
use garge_core::db::open_pool;
use sqlx::AnyPool;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::prompt;

/// Configuration and database arguments shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    /// JSON config file (replaces the global config file)
    #[arg(long, global = true, env = "GARGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Deployment environment tag (dev, staging, prod, ...)
    #[arg(long, global = true)]
    pub environment: Option<String>,

    /// Database host
    #[arg(long, global = true)]
    pub db_host: Option<String>,

    /// Database port
    #[arg(long, global = true)]
    pub db_port: Option<u16>,

    /// Database admin username
    #[arg(long, global = true, env = "GARGE_DB_USER")]
    pub db_user: Option<String>,
}

impl DatabaseArgs {
    /// Apply CLI overrides on top of the file/env configuration.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(env) = &self.environment {
            config.environment = env.parse::<Environment>()?;
        }
        if let Some(host) = &self.db_host {
            config.database.host.clone_from(host);
        }
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        Ok(())
    }

    /// Resolve the full configuration for this invocation.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = load_config(self.config.as_deref())?;
        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

/// Everything a subcommand needs to talk to the authentication database.
pub struct Session {
    pub config: Config,
    pub pool: AnyPool,
    pub store: AclStore,
}

impl Session {
    /// Resolve config, ask for database credentials and connect.
    pub async fn open(args: &DatabaseArgs, non_interactive: bool) -> Result<Self> {
        let config = args.resolve()?;

        if config.hashing.is_weak()
            && !prompt::confirm(
                non_interactive,
                "The configured hash (salted SHA-256) is weak. Continue anyway?",
                true,
            )?
        {
            bail!("aborted by operator");
        }

        let url = if config.has_database_url() {
            Zeroizing::new(config.database_url("", ""))
        } else {
            let user = prompt::prompt_db_user(non_interactive, args.db_user.as_deref())?;
            let password = prompt::prompt_db_password(non_interactive)?;
            Zeroizing::new(config.database_url(&user, &password))
        };

        info!(
            host = %config.database.host,
            database = %config.database_name(),
            sslmode = config.database.effective_ssl_mode().as_str(),
            environment = config.environment.as_str(),
            "Connecting to authentication database"
        );
        let pool = open_pool(&url)
            .await
            .context("could not connect to the authentication database")?;

        Self::from_parts(config, pool)
    }

    /// Build a session from an already open pool.
    pub fn from_parts(config: Config, pool: AnyPool) -> Result<Self> {
        if config.hashing.is_weak() {
            warn!(
                algorithm = config.hashing.name(),
                "Credentials will be stored with a weak hash"
            );
        }
        let store = AclStore::new(config.store.clone())?;
        Ok(Self {
            config,
            pool,
            store,
        })
    }
}
