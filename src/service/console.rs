//! Console event source for running the router without a platform connection.
//!
//! Interactions arrive as newline-delimited JSON on stdin, and every reply is
//! written as one JSON line on stdout. This stands in for the chat platform
//! session, which lives outside the router.

use std::{collections::BTreeMap, future::Future};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Stdout},
    sync::Mutex,
    task::JoinHandle,
};
use tracing::{info, instrument, warn};

use crate::{
    base::types::{Res, Void},
    interaction::{
        dispatcher::Dispatcher,
        event::{Actor, Interaction, InteractionKind, MemberContext},
    },
};

use super::reply::{GenericReplySink, ReplyClient};

// Types.

/// One inbound interaction as read from the console.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Interaction id; generated from the line number when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub kind: InteractionKind,
    pub user: Actor,
    pub action_id: String,
    #[serde(default)]
    pub sub_command: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub member: Option<MemberContext>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl Envelope {
    pub fn into_interaction(self, fallback_id: String, reply: ReplyClient) -> Interaction {
        let mut interaction = Interaction::new(self.id.unwrap_or(fallback_id), self.kind, self.user, self.action_id, reply)
            .with_values(self.values)
            .with_acknowledged(self.acknowledged);

        interaction.sub_command = self.sub_command;
        interaction.options = self.options;
        interaction.member = self.member;

        interaction
    }
}

/// Reply channel as written to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleChannel {
    Direct,
    Defer,
    Hook,
}

/// One outbound reply as written to the console.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyLine<'a> {
    pub interaction: &'a str,
    pub channel: ConsoleChannel,
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

// Sink.

/// Writes replies as JSON lines.
pub struct ConsoleReplySink<W = Stdout> {
    out: Mutex<W>,
}

impl ConsoleReplySink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleReplySink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write(&self, line: ReplyLine<'_>) -> Void {
        let mut json = serde_json::to_string(&line)?;
        json.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(json.as_bytes()).await?;
        out.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl<W> GenericReplySink for ConsoleReplySink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn reply_direct(&self, interaction_id: &str, message: &str, ephemeral: bool) -> Void {
        self.write(ReplyLine {
            interaction: interaction_id,
            channel: ConsoleChannel::Direct,
            ephemeral,
            message: Some(message),
        })
        .await
    }

    async fn defer_reply(&self, interaction_id: &str, ephemeral: bool) -> Void {
        self.write(ReplyLine {
            interaction: interaction_id,
            channel: ConsoleChannel::Defer,
            ephemeral,
            message: None,
        })
        .await
    }

    async fn reply_via_hook(&self, interaction_id: &str, message: &str, ephemeral: bool) -> Void {
        self.write(ReplyLine {
            interaction: interaction_id,
            channel: ConsoleChannel::Hook,
            ephemeral,
            message: Some(message),
        })
        .await
    }
}

// Source.

/// Parses one console line.
pub fn parse_line(line: &str) -> Res<Envelope> {
    Ok(serde_json::from_str(line)?)
}

/// Feeds every line of `input` to the dispatcher until EOF or until `shutdown`
/// completes, then waits for the interactions still in flight.
#[instrument(skip_all)]
pub async fn run<R, S>(input: R, dispatcher: &Dispatcher, reply: ReplyClient, shutdown: S) -> Void
where
    R: AsyncBufRead + Unpin,
    S: Future,
{
    let mut lines = input.lines();
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    let mut line_number = 0u64;

    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                info!("Shutdown requested; no longer reading console input.");
                break;
            }
        };

        let Some(line) = line else {
            info!("Console input closed.");
            break;
        };

        line_number += 1;

        if line.trim().is_empty() {
            continue;
        }

        let envelope = match parse_line(&line) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("Skipping malformed line {}: {}", line_number, err);
                continue;
            }
        };

        let interaction = envelope.into_interaction(format!("console-{line_number}"), reply.clone());

        in_flight.retain(|h| !h.is_finished());
        if let Some(handle) = dispatcher.dispatch(interaction) {
            in_flight.push(handle);
        }
    }

    info!("Waiting for {} interactions.", in_flight.len());

    for handle in in_flight {
        // Handler tasks never fail; a join error means the task was cancelled.
        if let Err(err) = handle.await {
            warn!("Interaction task ended abnormally: {}", err);
        }
    }

    Ok(())
}

// Tests.
