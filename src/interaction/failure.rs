//! Failure reporting for handler errors.

use async_trait::async_trait;
use tracing::error;

use crate::base::{
    error::{DispatchError, IdentityError, InteractionError},
    types::Err,
};

use super::event::Interaction;

/// Turns a handler failure into a log entry and a user-visible message.
///
/// Implementations must not fail: anything that goes wrong while reporting is
/// logged and dropped.
#[async_trait]
pub trait FailureReporter: Send + Sync + 'static {
    async fn report(&self, err: &Err, interaction: &Interaction);
}

/// Logs the full error chain and tells the user, ephemerally, what category of
/// error occurred.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFailureReporter;

#[async_trait]
impl FailureReporter for DefaultFailureReporter {
    async fn report(&self, err: &Err, interaction: &Interaction) {
        error!("Error while handling {} `{}` for {} ({}): {:?}", interaction.kind.label(), interaction.action_id, interaction.actor.name, interaction.actor.id, err);

        let message = user_message(err);

        if let Err(send_err) = interaction.respond(&message, true).await {
            error!("Failed to report error to {}: {:?}", interaction.actor.id, send_err);
        }
    }
}

/// The ephemeral message shown to the user for `err`.
pub fn user_message(err: &Err) -> String {
    format!("There was an error handling your request ({}).\n{}", category(err), err)
}

/// Short category name of an error.
pub fn category(err: &Err) -> &'static str {
    if let Some(dispatch) = err.downcast_ref::<DispatchError>() {
        dispatch.category()
    } else if err.downcast_ref::<IdentityError>().is_some() {
        "IdentityError"
    } else if err.downcast_ref::<InteractionError>().is_some() {
        "InteractionError"
    } else {
        "HandlerError"
    }
}

// Tests.
