//! Reply sink for interactions.
//!
//! The sink is the black-box channel back to the chat platform. It exposes the
//! two reply channels of an interaction (direct reply before acknowledgment,
//! hook after acknowledgment) plus the deferral that acknowledges without
//! content. Implementations are keyed by interaction id, so one sink serves
//! every interaction.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Void;

// Traits.

/// Generic reply sink that platform adapters must implement.
#[async_trait]
pub trait GenericReplySink: Send + Sync + 'static {
    /// Reply directly to an interaction that has not been acknowledged yet.
    async fn reply_direct(&self, interaction_id: &str, message: &str, ephemeral: bool) -> Void;

    /// Acknowledge an interaction without content; the reply follows through the hook.
    async fn defer_reply(&self, interaction_id: &str, ephemeral: bool) -> Void;

    /// Send a message through the hook of an acknowledged interaction.
    async fn reply_via_hook(&self, interaction_id: &str, message: &str, ephemeral: bool) -> Void;
}

// Structs.

/// Reply client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ReplyClient {
    inner: Arc<dyn GenericReplySink>,
}

impl Deref for ReplyClient {
    type Target = dyn GenericReplySink;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ReplyClient {
    pub fn new(inner: Arc<dyn GenericReplySink>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for ReplyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyClient").finish_non_exhaustive()
    }
}

// Test support.

#[cfg(test)]
pub(crate) mod recording {
    use parking_lot::Mutex;

    use super::*;

    /// Which channel a reply went through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Channel {
        Direct,
        Defer,
        Hook,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Sent {
        pub interaction_id: String,
        pub channel: Channel,
        pub message: Option<String>,
        pub ephemeral: bool,
    }

    /// Sink that records every call instead of talking to a platform.
    #[derive(Default)]
    pub struct RecordingSink {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingSink {
        pub fn client() -> (Arc<Self>, ReplyClient) {
            let sink = Arc::new(Self::default());
            let client = ReplyClient::new(sink.clone());
            (sink, client)
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().clone()
        }

        fn push(&self, interaction_id: &str, channel: Channel, message: Option<&str>, ephemeral: bool) {
            self.sent.lock().push(Sent {
                interaction_id: interaction_id.to_string(),
                channel,
                message: message.map(str::to_string),
                ephemeral,
            });
        }
    }

    #[async_trait]
    impl GenericReplySink for RecordingSink {
        async fn reply_direct(&self, interaction_id: &str, message: &str, ephemeral: bool) -> Void {
            self.push(interaction_id, Channel::Direct, Some(message), ephemeral);
            Ok(())
        }

        async fn defer_reply(&self, interaction_id: &str, ephemeral: bool) -> Void {
            self.push(interaction_id, Channel::Defer, None, ephemeral);
            Ok(())
        }

        async fn reply_via_hook(&self, interaction_id: &str, message: &str, ephemeral: bool) -> Void {
            self.push(interaction_id, Channel::Hook, Some(message), ephemeral);
            Ok(())
        }
    }
}
