//! Invite modal: create an invitation to the community and copy its link.

use serde::Serialize;
use tracing::debug;

use cambiatus_types::{RemoteResource, TransportError};

use crate::context::Context;
use crate::effect::Effect;

/// A created invitation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InviteLink {
    pub id: String,
    pub url: String,
}

impl InviteLink {
    fn new(app_url: &str, id: String) -> Self {
        let url = format!("{}/invite/{}", app_url.trim_end_matches('/'), id);
        Self { id, url }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InviteMsg {
    Open,
    /// Invite mutation answered with the new invite id.
    Created(Result<String, TransportError>),
    Copy,
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InviteModal {
    #[default]
    Closed,
    Open {
        link: RemoteResource<TransportError, InviteLink>,
        copied: bool,
    },
}

impl InviteModal {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Apply one invite message.
    pub fn update(&mut self, msg: InviteMsg, ctx: &Context) -> Vec<Effect> {
        match msg {
            InviteMsg::Open => {
                if self.is_open() {
                    return Vec::new();
                }
                *self = Self::Open {
                    link: RemoteResource::Loading,
                    copied: false,
                };
                vec![Effect::CreateInvite {
                    symbol: ctx.session.community.clone(),
                    inviter: ctx.session.account.clone(),
                    auth: ctx.auth(),
                }]
            }
            InviteMsg::Created(result) => {
                let Self::Open { link, .. } = self else {
                    debug!("invite response after close ignored");
                    return Vec::new();
                };
                let result = result.map(|id| InviteLink::new(&ctx.config.app_url, id));
                if !link.resolve(result) {
                    debug!("late invite response ignored");
                }
                Vec::new()
            }
            InviteMsg::Copy => {
                let Self::Open { link, copied } = self else {
                    return Vec::new();
                };
                match link.success() {
                    Some(invite) => {
                        *copied = true;
                        vec![Effect::CopyToClipboard {
                            text: invite.url.clone(),
                        }]
                    }
                    None => Vec::new(),
                }
            }
            InviteMsg::Close => {
                *self = Self::Closed;
                Vec::new()
            }
        }
    }
}
