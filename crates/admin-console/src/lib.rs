//! B-Net admin console: the operations behind each console page, run
//! against an explicit [`AdminSession`] instead of a global handle.
//!
//! # Modules
//!
//! - [`session`]: Administrator sign-in and the per-navigation session context
//! - [`pages`]: Page loaders (dashboard, subscriptions, users/teams growth) and page state
//! - [`campaigns`]: One-off campaign subscription grant/revoke scripts
//! - [`announcements`]: In-app announcement create/list/delete
//! - [`moderation`]: User report review (resolve/reopen, open count)

pub mod announcements;
pub mod campaigns;
pub mod moderation;
pub mod pages;
pub mod session;

pub use announcements::AnnouncementDraft;
pub use campaigns::{GrantOutcome, RevokeOutcome};
pub use pages::PageState;
pub use session::{AdminIdentity, AdminSession, AllowListAuthenticator, Authenticator};
