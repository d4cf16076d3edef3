//! `pawtrol-telegram` — Telegram implementation of the delivery channel.
//!
//! Missing bot token puts the channel in a permanently-unavailable state
//! instead of failing startup; the engine re-checks availability every
//! cycle.

pub mod channel;

pub use channel::TelegramChannel;
