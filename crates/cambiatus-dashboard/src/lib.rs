//! # cambiatus-dashboard
//!
//! The member dashboard as a reducer: [`Dashboard::update`] maps one
//! [`Msg`] to a new state plus the [`Effect`]s the host must perform, and
//! [`Dashboard::view`] renders whatever subset of resources has resolved.
//!
//! ## Modules
//!
//! - [`context`]: session and configuration handed to the controller
//! - [`msg`] / [`effect`]: inputs and side-effect requests
//! - [`dashboard`]: the controller
//! - [`view`]: per-slot view model
//! - [`invite`] / [`contact`]: secondary modal flows

pub mod contact;
pub mod context;
pub mod dashboard;
pub mod effect;
pub mod invite;
pub mod msg;
pub mod view;

pub use contact::{Contact, ContactError, ContactForm, ContactKind, ContactModal, ContactMsg};
pub use context::{Context, DashboardConfig, Session};
pub use dashboard::{Dashboard, Dependent, Notice, NoticeKind};
pub use effect::{AuthToken, Effect};
pub use invite::{InviteLink, InviteModal, InviteMsg};
pub use msg::Msg;
pub use view::{DashboardView, Section};
