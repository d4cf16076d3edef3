//! `pawtrol-core` — configuration, shared error type and the delivery
//! channel seam used by the notification engine.

pub mod channel;
pub mod config;
pub mod error;

pub use channel::{DeliveryChannel, SendOutcome};
pub use config::PawtrolConfig;
pub use error::{PawtrolError, Result};
