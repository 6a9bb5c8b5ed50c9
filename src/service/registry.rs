//! Handler registries.
//!
//! One generic [`Registry`] serves every handler kind; the match mode is chosen
//! at construction. Commands and modals match exactly. Buttons and selects
//! match by prefix, and when several registered prefixes apply, the longest
//! one wins. An empty prefix therefore acts as a catch-all fallback.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::interaction::handler::{ButtonHandler, CommandData, CommandHandler, ModalHandler, RouteKey, SelectHandler};

/// How incoming ids are matched against registered keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Prefix,
}

/// Concurrent map of routing keys to handlers.
pub struct Registry<H: ?Sized> {
    mode: MatchMode,
    entries: DashMap<String, Arc<H>>,
}

impl<H: ?Sized> std::fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("mode", &self.mode).field("len", &self.entries.len()).finish()
    }
}

impl<H> Registry<H>
where
    H: RouteKey + ?Sized,
{
    pub fn new(mode: MatchMode) -> Self {
        Self { mode, entries: DashMap::new() }
    }

    pub fn exact() -> Self {
        Self::new(MatchMode::Exact)
    }

    pub fn prefix() -> Self {
        Self::new(MatchMode::Prefix)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Registers a handler under its route key, returning the handler it replaced.
    pub fn register(&self, handler: Arc<H>) -> Option<Arc<H>> {
        let key = handler.route_key().to_string();
        let previous = self.entries.insert(key.clone(), handler);

        if previous.is_some() {
            warn!("Replaced handler registered under `{}`", key);
        } else {
            debug!("Registered handler under `{}`", key);
        }

        previous
    }

    pub fn register_all<I>(&self, handlers: I)
    where
        I: IntoIterator<Item = Arc<H>>,
    {
        for handler in handlers {
            self.register(handler);
        }
    }

    /// Finds the handler for an incoming id.
    pub fn resolve(&self, incoming: &str) -> Option<Arc<H>> {
        match self.mode {
            MatchMode::Exact => self.entries.get(incoming).map(|e| e.value().clone()),
            MatchMode::Prefix => self
                .entries
                .iter()
                .filter(|e| incoming.starts_with(e.key().as_str()))
                .max_by_key(|e| e.key().len())
                .map(|e| e.value().clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted registered keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Handlers sorted by key.
    pub fn handlers(&self) -> Vec<Arc<H>> {
        let mut entries: Vec<(String, Arc<H>)> = self.entries.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, h)| h).collect()
    }
}

// Commands.

/// Where a command is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    /// Available in every guild the bot is in.
    Global,
    /// Published per guild, filtered by [`CommandData::guild_ids`].
    Guild,
}

/// Exact-match command registry split by scope.
///
/// Lookup checks global commands first, then guild commands.
#[derive(Debug)]
pub struct CommandRegistry {
    global: Registry<dyn CommandHandler>,
    guild: Registry<dyn CommandHandler>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self {
            global: Registry::exact(),
            guild: Registry::exact(),
        }
    }
}

impl CommandRegistry {
    pub fn register(&self, scope: CommandScope, handler: Arc<dyn CommandHandler>) -> Option<Arc<dyn CommandHandler>> {
        match scope {
            CommandScope::Global => self.global.register(handler),
            CommandScope::Guild => self.guild.register(handler),
        }
    }

    pub fn register_all<I>(&self, scope: CommandScope, handlers: I)
    where
        I: IntoIterator<Item = Arc<dyn CommandHandler>>,
    {
        for handler in handlers {
            self.register(scope, handler);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.global.resolve(name).or_else(|| self.guild.resolve(name))
    }

    /// Schemas of all global commands.
    pub fn global_commands(&self) -> Vec<CommandData> {
        self.global.handlers().iter().map(|h| h.data()).collect()
    }

    /// Schemas of the guild commands that target `guild_id`.
    pub fn guild_commands(&self, guild_id: &str) -> Vec<CommandData> {
        self.guild.handlers().iter().map(|h| h.data()).filter(|d| d.targets_guild(guild_id)).collect()
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.guild.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All registries of a process.
#[derive(Debug)]
pub struct Registries {
    pub commands: CommandRegistry,
    pub buttons: Registry<dyn ButtonHandler>,
    pub modals: Registry<dyn ModalHandler>,
    pub string_selects: Registry<dyn SelectHandler>,
    pub entity_selects: Registry<dyn SelectHandler>,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            commands: CommandRegistry::default(),
            buttons: Registry::prefix(),
            modals: Registry::exact(),
            string_selects: Registry::prefix(),
            entity_selects: Registry::prefix(),
        }
    }
}

// Tests.
