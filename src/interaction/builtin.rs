//! Built-in commands every deployment gets.
//!
//! - `/ping` answers with an ephemeral "Pong!".
//! - `/trusted list|add|remove` lets the owner manage the trusted identities.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::info;

use crate::{
    base::types::Void,
    runtime::Context,
    service::registry::CommandScope,
};

use super::{
    event::Interaction,
    handler::{CommandData, CommandHandler, CommandOption, OptionKind, SubCommandData, SubCommandHandler},
    sub_command::SubCommandGroup,
};

/// Option naming the target user of `/trusted add` and `/trusted remove`.
const USER_OPTION: &str = "user";

/// Registers the built-in commands as global commands.
pub fn register_builtins(context: &Context) {
    let commands = &context.registries.commands;

    commands.register(CommandScope::Global, Arc::new(Ping));
    commands.register(CommandScope::Global, Arc::new(trusted_command(context.clone())));
}

// Ping.

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    fn data(&self) -> CommandData {
        CommandData::slash("ping", "Check that the bot is responding.")
    }

    async fn execute(&self, interaction: &Interaction) -> Void {
        interaction.reply("Pong!", true).await
    }
}

// Trusted.

/// The owner-only `/trusted` command group.
pub fn trusted_command(context: Context) -> SubCommandGroup {
    SubCommandGroup::new(context.clone(), "trusted", "Manage trusted users.")
        .with(Arc::new(TrustedList::new(context.clone())))
        .with(Arc::new(TrustedAdd::new(context.clone())))
        .with(Arc::new(TrustedRemove::new(context)))
}

fn user_option(interaction: &Interaction) -> Result<&str, anyhow::Error> {
    interaction
        .option_str(USER_OPTION)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| anyhow!("Missing required option `{}`.", USER_OPTION))
}

fn mention(identity: &str) -> String {
    format!("<@{identity}>")
}

pub struct TrustedList {
    context: Context,
    data: SubCommandData,
}

impl TrustedList {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            data: SubCommandData::new("list", "List the trusted users."),
        }
    }
}

#[async_trait]
impl SubCommandHandler for TrustedList {
    fn data(&self) -> &SubCommandData {
        &self.data
    }

    async fn execute(&self, interaction: &Interaction) -> Void {
        let trusted = self.context.identities.trusted_identities()?;

        let message = if trusted.is_empty() {
            "No trusted users.".to_string()
        } else {
            let mentions: Vec<String> = trusted.iter().map(|t| mention(t)).collect();
            format!("Trusted users: {}", mentions.join(", "))
        };

        interaction.followup(&message, true).await
    }
}

pub struct TrustedAdd {
    context: Context,
    data: SubCommandData,
}

impl TrustedAdd {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            data: SubCommandData::new("add", "Trust a user.").with_option(CommandOption::new(OptionKind::User, USER_OPTION, "The user to trust.", true)),
        }
    }
}

#[async_trait]
impl SubCommandHandler for TrustedAdd {
    fn data(&self) -> &SubCommandData {
        &self.data
    }

    async fn execute(&self, interaction: &Interaction) -> Void {
        let user = user_option(interaction)?;

        let message = if self.context.identities.add_trusted(user)? {
            info!("{} ({}) trusted {}", interaction.actor.name, interaction.actor.id, user);
            format!("Added {} to the trusted users.", mention(user))
        } else {
            format!("{} is already trusted.", mention(user))
        };

        interaction.followup(&message, true).await
    }
}

pub struct TrustedRemove {
    context: Context,
    data: SubCommandData,
}

impl TrustedRemove {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            data: SubCommandData::new("remove", "Stop trusting a user.").with_option(CommandOption::new(OptionKind::User, USER_OPTION, "The user to stop trusting.", true)),
        }
    }
}

#[async_trait]
impl SubCommandHandler for TrustedRemove {
    fn data(&self) -> &SubCommandData {
        &self.data
    }

    async fn execute(&self, interaction: &Interaction) -> Void {
        let user = user_option(interaction)?;

        let message = if self.context.identities.remove_trusted(user)? {
            info!("{} ({}) untrusted {}", interaction.actor.name, interaction.actor.id, user);
            format!("Removed {} from the trusted users.", mention(user))
        } else {
            format!("{} was not trusted.", mention(user))
        };

        interaction.followup(&message, true).await
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interaction::event::{Actor, InteractionKind},
        service::{
            permission::PermissionPolicy,
            reply::{
                ReplyClient,
                recording::{Channel, RecordingSink},
            },
        },
    };

    fn context() -> Context {
        let context = Context::new(PermissionPolicy::default());
        context.identities.initialize("OWNER", ["U2"]).unwrap();
        register_builtins(&context);
        context
    }

    fn trusted(sub: &str, reply: ReplyClient) -> Interaction {
        let actor = Actor { id: "OWNER".to_string(), name: "owner".to_string() };
        Interaction::new("I1", InteractionKind::SlashCommand, actor, "trusted", reply).with_sub_command(sub)
    }

    async fn run(context: &Context, interaction: Interaction) -> Void {
        let command = context.registries.commands.resolve(&interaction.action_id).unwrap();
        command.execute(&interaction).await
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let context = context();
        let (sink, client) = RecordingSink::client();
        let actor = Actor { id: "U5".to_string(), name: "bob".to_string() };

        run(&context, Interaction::new("I1", InteractionKind::SlashCommand, actor, "ping", client)).await.unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, Channel::Direct);
        assert_eq!(sent[0].message.as_deref(), Some("Pong!"));
    }

    #[tokio::test]
    async fn add_list_remove() {
        let context = context();

        let (sink, client) = RecordingSink::client();
        run(&context, trusted("add", client).with_option("user", "U3")).await.unwrap();
        assert_eq!(sink.sent()[1].message.as_deref(), Some("Added <@U3> to the trusted users."));
        assert_eq!(context.identities.is_trusted("U3"), Ok(true));

        let (sink, client) = RecordingSink::client();
        run(&context, trusted("list", client)).await.unwrap();
        assert_eq!(sink.sent()[1].message.as_deref(), Some("Trusted users: <@U2>, <@U3>"));

        let (sink, client) = RecordingSink::client();
        run(&context, trusted("remove", client).with_option("user", "U2")).await.unwrap();
        assert_eq!(sink.sent()[1].message.as_deref(), Some("Removed <@U2> from the trusted users."));
        assert_eq!(context.identities.is_trusted("U2"), Ok(false));

        let (sink, client) = RecordingSink::client();
        run(&context, trusted("remove", client).with_option("user", "U2")).await.unwrap();
        assert_eq!(sink.sent()[1].message.as_deref(), Some("<@U2> was not trusted."));
    }

    #[tokio::test]
    async fn missing_user_is_an_error() {
        let context = context();
        let (_sink, client) = RecordingSink::client();

        let err = run(&context, trusted("add", client)).await.unwrap_err();

        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn builtins_are_global() {
        let context = context();
        let names: Vec<String> = context.registries.commands.global_commands().into_iter().map(|d| d.name).collect();

        assert_eq!(names, vec!["ping", "trusted"]);
    }
}
