//! Permission checks for interactions.
//!
//! Each predicate answers whether the acting user may proceed. A failed check
//! sends exactly one ephemeral "Missing permission" reply before returning
//! `false`; a passed check sends nothing. Callers gate their control flow on
//! the return value and must not run the same predicate twice for one
//! interaction.

use tracing::{debug, error};

use crate::{base::error::IdentityError, interaction::event::Interaction, runtime::Context};

/// Reply sent when a permission check fails.
pub const MISSING_PERMISSION: &str = "Missing permission";

/// How "trusted" checks treat the owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionPolicy {
    /// When set, the owner passes `is_trusted` even if absent from the trusted set.
    pub owner_is_implicitly_trusted: bool,
}

/// Permission checks bound to one interaction.
pub struct PermissionGate<'a> {
    interaction: &'a Interaction,
    context: &'a Context,
}

impl<'a> PermissionGate<'a> {
    pub fn new(interaction: &'a Interaction, context: &'a Context) -> Self {
        Self { interaction, context }
    }

    /// Whether the acting user is the owner.
    pub async fn is_owner(&self) -> Result<bool, IdentityError> {
        let check = self.actor_is_owner()?;
        Ok(self.reply_after_check(check, "owner").await)
    }

    /// Whether the acting user is trusted, honouring the configured owner policy.
    pub async fn is_trusted(&self) -> Result<bool, IdentityError> {
        let identities = &self.context.identities;
        let actor = self.interaction.actor.id.as_str();

        let mut check = identities.is_trusted(actor)?;
        if !check && self.context.policy.owner_is_implicitly_trusted {
            check = self.actor_is_owner()?;
        }

        Ok(self.reply_after_check(check, "trusted").await)
    }

    /// Whether the acting user administers the guild the interaction happened in.
    ///
    /// Interactions without a resolvable member are denied, and get the denial
    /// reply like any other failed check instead of a silent `false`.
    pub async fn is_guild_admin(&self) -> bool {
        let check = self.interaction.member.as_ref().is_some_and(|m| m.administrator);
        self.reply_after_check(check, "guild admin").await
    }

    fn actor_is_owner(&self) -> Result<bool, IdentityError> {
        Ok(self.context.identities.owner_identity()? == self.interaction.actor.id)
    }

    async fn reply_after_check(&self, check: bool, requirement: &str) -> bool {
        if check {
            return true;
        }

        debug!("Denied {} ({}): requires {}", self.interaction.actor.name, self.interaction.actor.id, requirement);

        if let Err(err) = self.interaction.respond(MISSING_PERMISSION, true).await {
            error!("Failed to send permission denial: {:?}", err);
        }

        false
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interaction::event::{Actor, InteractionKind, MemberContext},
        service::reply::{
            ReplyClient,
            recording::{Channel, RecordingSink},
        },
    };

    fn context(policy: PermissionPolicy) -> Context {
        let context = Context::new(policy);
        context.identities.initialize("U1", ["U2"]).unwrap();
        context
    }

    fn interaction(actor: &str, reply: ReplyClient) -> Interaction {
        let actor = Actor { id: actor.to_string(), name: format!("user-{actor}") };
        Interaction::new("I1", InteractionKind::SlashCommand, actor, "admin", reply)
    }

    fn assert_single_denial(sink: &RecordingSink, channel: Channel) {
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, channel);
        assert_eq!(sent[0].message.as_deref(), Some(MISSING_PERMISSION));
        assert!(sent[0].ephemeral);
    }

    #[tokio::test]
    async fn owner_passes_silently() {
        let context = context(PermissionPolicy::default());
        let (sink, client) = RecordingSink::client();
        let interaction = interaction("U1", client);

        assert_eq!(PermissionGate::new(&interaction, &context).is_owner().await, Ok(true));
        assert!(sink.sent().is_empty());
        assert!(!interaction.is_acknowledged());
    }

    #[tokio::test]
    async fn non_owner_gets_one_direct_denial() {
        let context = context(PermissionPolicy::default());
        let (sink, client) = RecordingSink::client();
        let interaction = interaction("U2", client);

        assert_eq!(PermissionGate::new(&interaction, &context).is_owner().await, Ok(false));
        assert_single_denial(&sink, Channel::Direct);
    }

    #[tokio::test]
    async fn denial_after_ack_goes_through_hook() {
        let context = context(PermissionPolicy::default());
        let (sink, client) = RecordingSink::client();
        let interaction = interaction("U3", client).with_acknowledged(true);

        assert_eq!(PermissionGate::new(&interaction, &context).is_owner().await, Ok(false));
        assert_single_denial(&sink, Channel::Hook);
    }

    #[tokio::test]
    async fn trusted_is_strict_by_default() {
        let context = context(PermissionPolicy::default());

        let (sink, client) = RecordingSink::client();
        let trusted = interaction("U2", client);
        assert_eq!(PermissionGate::new(&trusted, &context).is_trusted().await, Ok(true));
        assert!(sink.sent().is_empty());

        let (sink, client) = RecordingSink::client();
        let owner = interaction("U1", client);
        assert_eq!(PermissionGate::new(&owner, &context).is_trusted().await, Ok(false));
        assert_single_denial(&sink, Channel::Direct);
    }

    #[tokio::test]
    async fn owner_implicitly_trusted_when_configured() {
        let context = context(PermissionPolicy { owner_is_implicitly_trusted: true });

        let (sink, client) = RecordingSink::client();
        let owner = interaction("U1", client);
        assert_eq!(PermissionGate::new(&owner, &context).is_trusted().await, Ok(true));
        assert!(sink.sent().is_empty());

        let (sink, client) = RecordingSink::client();
        let stranger = interaction("U3", client);
        assert_eq!(PermissionGate::new(&stranger, &context).is_trusted().await, Ok(false));
        assert_single_denial(&sink, Channel::Direct);
    }

    #[tokio::test]
    async fn guild_admin_requires_member_context() {
        let context = context(PermissionPolicy::default());

        let (sink, client) = RecordingSink::client();
        let admin = interaction("U3", client).with_member(MemberContext { guild_id: "G1".to_string(), administrator: true });
        assert!(PermissionGate::new(&admin, &context).is_guild_admin().await);
        assert!(sink.sent().is_empty());

        let (sink, client) = RecordingSink::client();
        let member = interaction("U3", client).with_member(MemberContext { guild_id: "G1".to_string(), administrator: false });
        assert!(!PermissionGate::new(&member, &context).is_guild_admin().await);
        assert_single_denial(&sink, Channel::Direct);

        let (sink, client) = RecordingSink::client();
        let direct_message = interaction("U1", client);
        assert!(!PermissionGate::new(&direct_message, &context).is_guild_admin().await);
        assert_single_denial(&sink, Channel::Direct);
    }

    #[tokio::test]
    async fn uninitialized_store_is_an_error() {
        let context = Context::new(PermissionPolicy::default());
        let (sink, client) = RecordingSink::client();
        let interaction = interaction("U1", client);

        assert_eq!(PermissionGate::new(&interaction, &context).is_owner().await, Err(IdentityError::NotInitialized));
        assert!(sink.sent().is_empty());
    }
}
