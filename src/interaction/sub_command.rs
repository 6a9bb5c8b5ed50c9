//! Slash commands that fan out to named sub-commands.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    base::types::Void,
    runtime::Context,
    service::{permission::PermissionGate, registry::Registry},
};

use super::{
    event::{Interaction, InteractionKind},
    handler::{CommandData, CommandHandler, CommandOption, SubCommandHandler},
};

/// Name of the option that controls the visibility of the deferred reply.
pub const EPHEMERAL_OPTION: &str = "ephemeral";

/// Owner-only slash command that dispatches to its registered sub-commands.
///
/// On execution the group checks that the actor is the owner, defers the reply
/// (ephemeral unless the `ephemeral` option says otherwise) and runs the named
/// sub-command. Sub-commands answer through [`Interaction::followup`].
pub struct SubCommandGroup {
    context: Context,
    name: String,
    description: String,
    sub_commands: Registry<dyn SubCommandHandler>,
}

impl SubCommandGroup {
    pub fn new(context: Context, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
            description: description.into(),
            sub_commands: Registry::exact(),
        }
    }

    pub fn with(self, sub_command: Arc<dyn SubCommandHandler>) -> Self {
        self.register(sub_command);
        self
    }

    pub fn register(&self, sub_command: Arc<dyn SubCommandHandler>) -> Option<Arc<dyn SubCommandHandler>> {
        self.sub_commands.register(sub_command)
    }

    pub fn sub_commands(&self) -> &Registry<dyn SubCommandHandler> {
        &self.sub_commands
    }

    /// Visibility requested by the interaction; ephemeral when unspecified.
    pub fn is_ephemeral(interaction: &Interaction) -> bool {
        interaction.option_bool(EPHEMERAL_OPTION).unwrap_or(true)
    }
}

#[async_trait]
impl CommandHandler for SubCommandGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> CommandData {
        let sub_commands = self
            .sub_commands
            .handlers()
            .iter()
            .map(|s| {
                let mut data = s.data().clone();
                if !data.options.iter().any(|o| o.name == EPHEMERAL_OPTION) {
                    data.options.push(CommandOption::ephemeral());
                }
                data
            })
            .collect();

        CommandData::slash(&self.name, &self.description).with_sub_commands(sub_commands)
    }

    #[instrument(name = "SubCommandGroup::execute", skip_all, fields(command = %self.name))]
    async fn execute(&self, interaction: &Interaction) -> Void {
        if interaction.kind != InteractionKind::SlashCommand {
            return Ok(());
        }

        if !PermissionGate::new(interaction, &self.context).is_owner().await? {
            return Ok(());
        }

        interaction.defer_reply(Self::is_ephemeral(interaction)).await?;

        let Some(name) = interaction.sub_command.as_deref() else {
            debug!("No sub-command given for /{}", self.name);
            return Ok(());
        };

        match self.sub_commands.resolve(name) {
            Some(sub_command) => sub_command.execute(interaction).await,
            None => {
                debug!("Unknown sub-command /{} {}", self.name, name);
                Ok(())
            }
        }
    }
}

// Tests.
