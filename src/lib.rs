//! ShellHit - an interactive shell with natural-language command translation.
//!
//! Lines starting with a built-in verb (`cd`, `pwd`, `ls`, `mkdir`, `rm`,
//! `exit`) run directly. Anything else is sent to a generative model that
//! answers with a single Windows command, which is then run through the
//! native command interpreter in the session directory.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management (API key, model, timeouts)
//! - [`elevation`] - Administrator check and elevated relaunch
//! - [`session`] - The session working directory
//! - [`builtins`] - Built-in commands
//! - [`command_router`] - Dispatch and the read-eval-print loop
//! - [`llm_translator`] - Natural language to command translation
//! - [`http_client`] - HTTP client abstraction
//! - [`confirm_ui`] - Optional confirmation before AI commands run
//! - [`executor`] - Runs commands through the interpreter
//!
//! # Example
//!
//! ```ignore
//! use shellhit::{command_router::CommandRouter, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let mut router = CommandRouter::from_config(&config)?;
//!     let stdin = std::io::stdin();
//!     router
//!         .run(&mut stdin.lock(), &mut std::io::stdout(), &mut std::io::stderr())
//!         .await
//! }
//! ```

pub mod builtins;
pub mod command_router;
pub mod config;
pub mod confirm_ui;
pub mod elevation;
pub mod executor;
pub mod http_client;
pub mod llm_translator;
pub mod session;
