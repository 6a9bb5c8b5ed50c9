//! Library root for `interaction-router`.
//!
//! The interaction router sits between a chat platform and a bot's handlers:
//! - Match incoming slash commands, buttons, modals and select menus to handlers
//! - Gate handlers on owner, trusted-user and guild-admin permissions
//! - Run each interaction on its own task, isolated from the others
//! - Report handler failures back to the user as an ephemeral message
//!
//! The platform connection and the reply transport sit behind traits, so the
//! core can run against any platform adapter. The bundled adapter reads
//! interactions from stdin and writes replies to stdout.

pub mod base;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the router runtime:
/// - Creates the routing context from the configuration
/// - Registers the built-in handlers
/// - Starts the event loop for processing interactions
pub async fn start(config: Config) -> Void {
    info!("Starting interaction-router ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
