//! `pawtrol-notify` — the reminder notification engine.
//!
//! # Overview
//!
//! [`engine::NotifierEngine`] polls the reminder store once a minute,
//! computes each candidate's fire time (event time minus configured lead),
//! renders a message and pushes it through a [`DeliveryChannel`]. A
//! successful attempt sets the reminder's `notification_sent` guard so the
//! primary path never re-notifies; a failed attempt leaves the guard clear
//! and the reminder is retried on later cycles until its event time leaves
//! the 25-hour scan window.
//!
//! [`engine::NotifierEngine::sweep_overdue`] is a separate, coarser catch-up
//! path over the last 24 hours that deliberately ignores the guard.
//!
//! [`DeliveryChannel`]: pawtrol_core::channel::DeliveryChannel

pub mod engine;
pub mod fire_time;
pub mod message;

pub use engine::{CycleStats, NotifierEngine};
pub use fire_time::compute_fire_time;
