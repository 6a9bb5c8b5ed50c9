//! Runtime services and shared state for the interaction router.

use std::{ops::Deref, sync::Arc};

use tokio::io::BufReader;
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{
        builtin,
        dispatcher::{DispatchOptions, Dispatcher},
        failure::DefaultFailureReporter,
    },
    service::{
        console::{self, ConsoleReplySink},
        identity::IdentityStore,
        permission::PermissionPolicy,
        registry::Registries,
        reply::ReplyClient,
    },
};

/// Shared routing state: identities, registries and the permission policy.
///
/// Built once at startup and handed to the dispatcher and to handler
/// constructors. It is designed to be trivially cloneable, allowing it to be
/// passed around without the need for `Arc` or `Mutex`.
#[derive(Clone, Debug)]
pub struct Context {
    pub inner: Arc<ContextInner>,
}

impl Deref for Context {
    type Target = ContextInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Default)]
pub struct ContextInner {
    /// Owner and trusted identities.
    pub identities: IdentityStore,
    /// Handler registries.
    pub registries: Registries,
    /// How permission checks treat the owner.
    pub policy: PermissionPolicy,
}

impl Context {
    /// Creates a context with an uninitialized identity store and empty registries.
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                policy,
                ..Default::default()
            }),
        }
    }
}

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, the routing context, the dispatcher
/// and the reply client.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The routing context.
    pub context: Context,
    /// The dispatcher instance.
    pub dispatcher: Dispatcher,
    /// The reply client instance.
    pub reply: ReplyClient,
}

impl Runtime {
    /// Create a new runtime that replies on stdout.
    pub fn new(config: Config) -> Res<Self> {
        Self::with_reply(config, ReplyClient::new(Arc::new(ConsoleReplySink::stdout())))
    }

    /// Create a new runtime with the given reply client.
    #[instrument(skip_all)]
    pub fn with_reply(config: Config, reply: ReplyClient) -> Res<Self> {
        let policy = PermissionPolicy {
            owner_is_implicitly_trusted: config.owner_is_implicitly_trusted,
        };

        // Initialize the identities.
        let context = Context::new(policy);
        context.identities.initialize(config.owner_id.clone(), config.trusted_ids.iter().cloned())?;

        // Register the built-in handlers.
        builtin::register_builtins(&context);
        info!("Registered {} commands", context.registries.commands.len());

        // Initialize the dispatcher.
        let dispatcher = Dispatcher::new(context.clone(), Arc::new(DefaultFailureReporter), DispatchOptions::from(&config));

        Ok(Self { config, context, dispatcher, reply })
    }

    /// Reads interactions from stdin until EOF or Ctrl-C, then waits for the
    /// interactions already dispatched.
    pub async fn start(&self) -> Void {
        let input = BufReader::new(tokio::io::stdin());

        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl-C; shutting down ..."),
                Err(err) => {
                    warn!("Unable to listen for Ctrl-C: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        let result = console::run(input, &self.dispatcher, self.reply.clone(), shutdown).await;

        self.dispatcher.close();

        result
    }
}

// Tests.
