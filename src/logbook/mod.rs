use std::fmt;
use std::sync::Arc;

use actix::prelude::*;

mod auth;
mod drive;

pub use self::auth::{CredentialProvider, InstalledFlow, StaticToken};
pub use self::drive::Drive;

/// Text to add to this week's log document. Appends are fire-and-forget:
/// a failure is logged and never surfaced to the webhook sender.
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct Append {
    pub text: String,
}

pub struct Logbook {
    drive: Option<Arc<Drive>>,
}

impl fmt::Debug for Logbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct Disabled;

        f.debug_struct("Logbook")
            .field(
                "drive",
                match &self.drive {
                    Some(drive) => &drive.folder_id,
                    None => &Disabled,
                },
            )
            .finish()
    }
}

impl Logbook {
    pub fn new(drive: Option<Drive>) -> Self {
        Self {
            drive: drive.map(Arc::new),
        }
    }
}

impl Actor for Logbook {
    type Context = Context<Self>;
}

impl Handler<Append> for Logbook {
    type Result = <Append as Message>::Result;

    fn handle(&mut self, msg: Append, ctx: &mut Self::Context) -> Self::Result {
        if let Some(drive) = &self.drive {
            ctx.spawn(drive.clone().append(msg.text).into_actor(self));
        }
    }
}
