//! Inbound interaction model.
//!
//! An [`Interaction`] is what the platform adapter hands to the dispatcher:
//! who acted, what they acted on, and how to answer them. The core only reads
//! these fields; the adapter owns the wire format.

use std::{
    collections::BTreeMap,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    base::{
        error::InteractionError,
        types::{Identity, Void},
    },
    service::reply::ReplyClient,
};

/// The kind of an inbound interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    SlashCommand,
    MessageContext,
    UserContext,
    Button,
    Modal,
    StringSelect,
    EntitySelect,
}

impl InteractionKind {
    /// Whether this kind is routed through the command registry.
    pub fn is_command(&self) -> bool {
        matches!(self, InteractionKind::SlashCommand | InteractionKind::MessageContext | InteractionKind::UserContext)
    }

    /// Label used in the dispatch log line.
    pub fn label(&self) -> &'static str {
        match self {
            InteractionKind::SlashCommand => "slash command",
            InteractionKind::MessageContext => "message context command",
            InteractionKind::UserContext => "user context command",
            InteractionKind::Button => "button",
            InteractionKind::Modal => "modal",
            InteractionKind::StringSelect => "string select",
            InteractionKind::EntitySelect => "entity select",
        }
    }
}

/// The acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Identity,
    pub name: String,
}

/// The acting user's membership in the guild the interaction happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberContext {
    pub guild_id: String,
    /// Whether the member holds the administrator capability in that guild.
    #[serde(default)]
    pub administrator: bool,
}

/// An inbound interaction together with its reply capability.
pub struct Interaction {
    /// Platform interaction id, used by the reply sink.
    pub id: String,
    pub kind: InteractionKind,
    pub actor: Actor,
    /// Command name, button/select custom id, or modal id.
    pub action_id: String,
    /// Named sub-command of a slash command.
    pub sub_command: Option<String>,
    pub options: BTreeMap<String, Value>,
    /// Selected values of a select menu, or submitted modal fields.
    pub values: Vec<String>,
    pub member: Option<MemberContext>,
    acknowledged: AtomicBool,
    reply: ReplyClient,
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("actor", &self.actor)
            .field("action_id", &self.action_id)
            .field("sub_command", &self.sub_command)
            .field("acknowledged", &self.is_acknowledged())
            .finish_non_exhaustive()
    }
}

impl Interaction {
    /// Creates a fresh, unacknowledged interaction.
    pub fn new(id: impl Into<String>, kind: InteractionKind, actor: Actor, action_id: impl Into<String>, reply: ReplyClient) -> Self {
        Self {
            id: id.into(),
            kind,
            actor,
            action_id: action_id.into(),
            sub_command: None,
            options: BTreeMap::new(),
            values: Vec::new(),
            member: None,
            acknowledged: AtomicBool::new(false),
            reply,
        }
    }

    pub fn with_sub_command(mut self, name: impl Into<String>) -> Self {
        self.sub_command = Some(name.into());
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_member(mut self, member: MemberContext) -> Self {
        self.member = Some(member);
        self
    }

    /// Marks the interaction as already acknowledged by the platform.
    pub fn with_acknowledged(self, acknowledged: bool) -> Self {
        self.acknowledged.store(acknowledged, Ordering::Release);
        self
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire)
    }

    /// `name` or `name sub` for slash commands with a sub-command.
    pub fn full_command_name(&self) -> String {
        match &self.sub_command {
            Some(sub) => format!("{} {}", self.action_id, sub),
            None => self.action_id.clone(),
        }
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn option_bool(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(Value::as_bool)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    /// Replies through the direct channel. Only valid before acknowledgment.
    pub async fn reply(&self, message: &str, ephemeral: bool) -> Void {
        self.acknowledge()?;
        self.reply.reply_direct(&self.id, message, ephemeral).await
    }

    /// Acknowledges without content so that the answer can follow through the hook.
    pub async fn defer_reply(&self, ephemeral: bool) -> Void {
        self.acknowledge()?;
        self.reply.defer_reply(&self.id, ephemeral).await
    }

    /// Sends through the hook. Only valid after acknowledgment.
    pub async fn followup(&self, message: &str, ephemeral: bool) -> Void {
        if !self.is_acknowledged() {
            return Err(InteractionError::NotAcknowledged(self.id.clone()).into());
        }

        self.reply.reply_via_hook(&self.id, message, ephemeral).await
    }

    /// Sends through whichever channel is valid right now.
    pub async fn respond(&self, message: &str, ephemeral: bool) -> Void {
        if self.acknowledged.swap(true, Ordering::AcqRel) {
            self.reply.reply_via_hook(&self.id, message, ephemeral).await
        } else {
            self.reply.reply_direct(&self.id, message, ephemeral).await
        }
    }

    fn acknowledge(&self) -> Result<(), InteractionError> {
        if self.acknowledged.swap(true, Ordering::AcqRel) {
            return Err(InteractionError::AlreadyAcknowledged(self.id.clone()));
        }

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::reply::recording::{Channel, RecordingSink};

    fn interaction(reply: ReplyClient) -> Interaction {
        let actor = Actor { id: "U1".to_string(), name: "alice".to_string() };
        Interaction::new("I1", InteractionKind::SlashCommand, actor, "trusted", reply)
    }

    #[tokio::test]
    async fn respond_uses_direct_then_hook() {
        let (sink, client) = RecordingSink::client();
        let interaction = interaction(client);

        interaction.respond("first", true).await.unwrap();
        interaction.respond("second", false).await.unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].channel, Channel::Direct);
        assert_eq!(sent[1].channel, Channel::Hook);
        assert!(!sent[1].ephemeral);
        assert!(interaction.is_acknowledged());
    }

    #[tokio::test]
    async fn direct_reply_after_ack_is_rejected() {
        let (sink, client) = RecordingSink::client();
        let interaction = interaction(client);

        interaction.defer_reply(true).await.unwrap();
        let err = interaction.reply("late", true).await.unwrap_err();

        assert_eq!(err.downcast_ref::<InteractionError>(), Some(&InteractionError::AlreadyAcknowledged("I1".to_string())));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn followup_before_ack_is_rejected() {
        let (sink, client) = RecordingSink::client();
        let interaction = interaction(client);

        let err = interaction.followup("early", true).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<InteractionError>(), Some(InteractionError::NotAcknowledged(_))));
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn pre_acknowledged_interaction_responds_via_hook() {
        let (sink, client) = RecordingSink::client();
        let interaction = interaction(client).with_acknowledged(true);

        interaction.respond("hello", true).await.unwrap();

        assert_eq!(sink.sent()[0].channel, Channel::Hook);
    }

    #[test]
    fn options_and_names() {
        let (_, client) = RecordingSink::client();
        let interaction = interaction(client).with_sub_command("list").with_option("ephemeral", false).with_option("user", "U2");

        assert_eq!(interaction.full_command_name(), "trusted list");
        assert_eq!(interaction.option_bool("ephemeral"), Some(false));
        assert_eq!(interaction.option_str("user"), Some("U2"));
        assert_eq!(interaction.option_bool("missing"), None);
    }
}
