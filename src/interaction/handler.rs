//! Handler kinds and the command schema.
//!
//! Every handler kind shares the same capability: a routing key (exact id or
//! custom-id prefix) and an async `execute`. The registry is generic over
//! [`RouteKey`], which is implemented for each `dyn` handler kind below.

use async_trait::async_trait;
use serde::Serialize;

use crate::base::types::Void;

use super::event::Interaction;

// Traits.

/// The key a handler is registered and resolved under.
pub trait RouteKey: Send + Sync {
    fn route_key(&self) -> &str;
}

/// Handler for slash and context-menu commands, matched by exact name.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// The command name the handler is registered under.
    fn name(&self) -> &str;

    /// The schema published to the platform by the registration collaborator.
    fn data(&self) -> CommandData;

    async fn execute(&self, interaction: &Interaction) -> Void;
}

/// Handler for button presses, matched by custom-id prefix.
#[async_trait]
pub trait ButtonHandler: Send + Sync + 'static {
    /// Prefix of the custom ids routed to this handler, e.g. `"event-role:"`
    /// for a button with custom id `"event-role:join"`.
    fn id_prefix(&self) -> &str;

    async fn execute(&self, interaction: &Interaction) -> Void;

    /// Builds a full custom id for a component that should route back here.
    fn prefixed_id(&self, suffix: &str) -> String {
        format!("{}{}", self.id_prefix(), suffix)
    }
}

/// Handler for modal submissions, matched by exact modal id.
#[async_trait]
pub trait ModalHandler: Send + Sync + 'static {
    fn modal_id(&self) -> &str;

    async fn execute(&self, interaction: &Interaction) -> Void;
}

/// Handler for string and entity select menus, matched by custom-id prefix.
#[async_trait]
pub trait SelectHandler: Send + Sync + 'static {
    fn id_prefix(&self) -> &str;

    async fn execute(&self, interaction: &Interaction) -> Void;

    /// Builds a full custom id for a select menu that should route back here.
    fn prefixed_id(&self, suffix: &str) -> String {
        format!("{}{}", self.id_prefix(), suffix)
    }
}

/// A named sub-command of a slash command.
#[async_trait]
pub trait SubCommandHandler: Send + Sync + 'static {
    fn data(&self) -> &SubCommandData;

    async fn execute(&self, interaction: &Interaction) -> Void;
}

impl RouteKey for dyn CommandHandler {
    fn route_key(&self) -> &str {
        self.name()
    }
}

impl RouteKey for dyn ButtonHandler {
    fn route_key(&self) -> &str {
        self.id_prefix()
    }
}

impl RouteKey for dyn ModalHandler {
    fn route_key(&self) -> &str {
        self.modal_id()
    }
}

impl RouteKey for dyn SelectHandler {
    fn route_key(&self) -> &str {
        self.id_prefix()
    }
}

impl RouteKey for dyn SubCommandHandler {
    fn route_key(&self) -> &str {
        &self.data().name
    }
}

// Schema.

/// The flavor of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Slash,
    Message,
    User,
}

/// The value type of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl CommandOption {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required,
        }
    }

    /// The standard optional `ephemeral` flag. Responses are ephemeral when it is omitted.
    pub fn ephemeral() -> Self {
        Self::new(OptionKind::Boolean, "ephemeral", "Should the response be ephemeral? Default: true", false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubCommandData {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

impl SubCommandData {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandData {
    pub name: String,
    pub description: String,
    pub kind: CommandKind,
    pub options: Vec<CommandOption>,
    pub sub_commands: Vec<SubCommandData>,
    /// Guilds a guild-scoped command is published to; empty means every guild.
    pub guild_ids: Vec<String>,
}

impl CommandData {
    pub fn new(kind: CommandKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            options: Vec::new(),
            sub_commands: Vec::new(),
            guild_ids: Vec::new(),
        }
    }

    pub fn slash(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(CommandKind::Slash, name, description)
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_sub_commands(mut self, sub_commands: Vec<SubCommandData>) -> Self {
        self.sub_commands = sub_commands;
        self
    }

    pub fn with_guild_ids<I, S>(mut self, guild_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guild_ids = guild_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a guild-scoped command should be published to `guild_id`.
    pub fn targets_guild(&self, guild_id: &str) -> bool {
        self.guild_ids.is_empty() || self.guild_ids.iter().any(|g| g == guild_id)
    }
}
