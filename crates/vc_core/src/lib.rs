//! vc_core — the confession mailbox
//!
//! - `timelock`  — fixed unlock instant, pure `is_unlocked(now)` + countdown
//! - `mailbox`   — send / submit / reveal coordinator over the collaborators
//! - `settings`  — JSON settings stored in the data directory
//! - `paths`     — platform data directory resolution
//! - `share`     — recipient share links
//! - `error`     — `MailboxError`

pub mod error;
pub mod mailbox;
pub mod paths;
pub mod settings;
pub mod share;
pub mod timelock;

pub use error::MailboxError;
pub use mailbox::{DecryptedConfession, Mailbox, OutgoingConfession, ProvisionReport};
pub use timelock::{Countdown, TimeLock};
