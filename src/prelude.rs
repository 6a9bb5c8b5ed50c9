//! Common imports for handler implementations.

pub use crate::{
    base::{
        config::Config,
        error::{DispatchError, IdentityError, InteractionError},
        types::{Err, Identity, Res, Void},
    },
    interaction::{
        event::{Actor, Interaction, InteractionKind, MemberContext},
        handler::{ButtonHandler, CommandData, CommandHandler, CommandKind, CommandOption, ModalHandler, OptionKind, SelectHandler, SubCommandData, SubCommandHandler},
        sub_command::SubCommandGroup,
    },
    runtime::Context,
    service::{permission::PermissionGate, registry::CommandScope},
};
pub use anyhow::anyhow;
pub use async_trait::async_trait;
pub use tracing::{debug, error, info, instrument, warn};
