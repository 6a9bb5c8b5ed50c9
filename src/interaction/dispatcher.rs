//! Routes inbound interactions to their handlers.
//!
//! Every matched interaction runs on its own tokio task, so a slow or failing
//! handler never holds up other interactions. A semaphore caps how many
//! handlers execute at once; tasks beyond the cap wait for a permit without
//! blocking the caller of [`Dispatcher::dispatch`]. Within one task execution
//! is sequential. There is no ordering between tasks.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    base::{
        config::Config,
        error::DispatchError,
        types::Void,
    },
    runtime::Context,
};

use super::{
    event::{Interaction, InteractionKind},
    failure::FailureReporter,
    handler::{ButtonHandler, CommandHandler, ModalHandler, SelectHandler},
};

/// Tuning for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Maximum number of handlers executing at once.
    pub max_concurrent: usize,
    /// Deadline after which a handler is abandoned and reported as timed out.
    pub timeout: Option<Duration>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { max_concurrent: 64, timeout: None }
    }
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent_handlers,
            timeout: config.handler_timeout(),
        }
    }
}

/// A resolved handler of any kind.
#[derive(Clone)]
enum Resolved {
    Command(Arc<dyn CommandHandler>),
    Button(Arc<dyn ButtonHandler>),
    Modal(Arc<dyn ModalHandler>),
    Select(Arc<dyn SelectHandler>),
}

impl Resolved {
    async fn execute(&self, interaction: &Interaction) -> Void {
        match self {
            Resolved::Command(h) => h.execute(interaction).await,
            Resolved::Button(h) => h.execute(interaction).await,
            Resolved::Modal(h) => h.execute(interaction).await,
            Resolved::Select(h) => h.execute(interaction).await,
        }
    }
}

/// The event-listener surface of the router.
///
/// Trivially cloneable; clones share the context, reporter and concurrency cap.
#[derive(Clone)]
pub struct Dispatcher {
    context: Context,
    reporter: Arc<dyn FailureReporter>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(context: Context, reporter: Arc<dyn FailureReporter>, options: DispatchOptions) -> Self {
        Self {
            context,
            reporter,
            permits: Arc::new(Semaphore::new(options.max_concurrent.clamp(1, Semaphore::MAX_PERMITS))),
            timeout: options.timeout,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Handlers currently allowed to start without waiting.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Routes an interaction and starts its task.
    ///
    /// Returns `None`, without replying, when no handler matches: unmatched ids
    /// belong to another subsystem or are stale. Otherwise returns the handle of
    /// the task running the handler; the task never fails.
    pub fn dispatch(&self, interaction: Interaction) -> Option<JoinHandle<()>> {
        let actor = &interaction.actor;
        let target = if interaction.kind == InteractionKind::SlashCommand {
            format!("/{}", interaction.full_command_name())
        } else {
            format!("\"{}\"", interaction.action_id)
        };

        info!("{} ({}) used {} {}", actor.name, actor.id, interaction.kind.label(), target);

        let Some(handler) = self.resolve(&interaction) else {
            debug!("No handler for {} {}", interaction.kind.label(), target);
            return None;
        };

        let span = info_span!("interaction", id = %interaction.id, kind = interaction.kind.label(), action = %interaction.action_id);
        let interaction = Arc::new(interaction);
        let reporter = self.reporter.clone();
        let permits = self.permits.clone();
        let timeout = self.timeout;

        let task = async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!("Dispatcher is shutting down; dropping interaction.");
                return;
            };

            let result = run(&handler, &interaction, timeout).await;

            if let Err(err) = &result {
                reporter.report(err, &interaction).await;
            }
        };

        Some(tokio::spawn(task.instrument(span)))
    }

    fn resolve(&self, interaction: &Interaction) -> Option<Resolved> {
        let registries = &self.context.registries;
        let id = interaction.action_id.as_str();

        match interaction.kind {
            InteractionKind::SlashCommand | InteractionKind::MessageContext | InteractionKind::UserContext => registries.commands.resolve(id).map(Resolved::Command),
            InteractionKind::Button => registries.buttons.resolve(id).map(Resolved::Button),
            InteractionKind::Modal => registries.modals.resolve(id).map(Resolved::Modal),
            InteractionKind::StringSelect => registries.string_selects.resolve(id).map(Resolved::Select),
            InteractionKind::EntitySelect => registries.entity_selects.resolve(id).map(Resolved::Select),
        }
    }

    /// Stops accepting new work; queued tasks exit without running their handler.
    pub fn close(&self) {
        self.permits.close();
    }
}

/// Runs a handler, turning panics and deadline overruns into errors.
async fn run(handler: &Resolved, interaction: &Interaction, timeout: Option<Duration>) -> Void {
    let guarded = AssertUnwindSafe(handler.execute(interaction)).catch_unwind();

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(DispatchError::Timeout(limit).into()),
        },
        None => guarded.await,
    };

    outcome.unwrap_or_else(|panic| Err(DispatchError::Panicked(panic_message(panic.as_ref())).into()))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// Tests.
