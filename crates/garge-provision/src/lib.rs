//! `garge-provision` library surface.
//!
//! Each subcommand exposes a `run` that prompts and connects, and an
//! `execute` that does the work against an open [`session::Session`].

pub mod admin;
pub mod cli;
pub mod prompt;
pub mod schema;
pub mod sensor;
pub mod session;
pub mod show;
pub mod verify;
