//! Alert notification for finished health-check runs.
//!
//! - [`notifier`] finds the latest summary artifact and decides, by
//!   looking for the `CRIT:`/`WARN:` markers, whether to alert.
//! - [`email`] delivers the alert over an authenticated SMTP relay.

pub mod email;
pub mod notifier;

pub use email::{AlertSender, EmailConfig, EmailDelivery, EmailError};
pub use notifier::{inspect_latest, notify_latest, send_alert, Inspection, NotifyError, NotifyOutcome};
