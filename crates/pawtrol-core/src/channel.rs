use async_trait::async_trait;

/// Result of one delivery attempt.
///
/// Failure is an expected, frequent outcome here (flaky network, bad chat
/// id), so it travels as a value rather than an `Err`: callers decide
/// whether to retry, the channel only reports what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Diagnostic for the log line; never shown to end users.
    Failed(String),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }
}

/// Outbound push capability over an external messaging service.
///
/// Implementations must be `Send + Sync` so the engine can hold one behind
/// an `Arc` and drive it from its own Tokio task.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Whether the channel can attempt deliveries at all.
    ///
    /// A channel constructed without credentials stays unavailable for the
    /// lifetime of the process; callers check this once per cycle and skip
    /// sends entirely while it returns false.
    fn is_available(&self) -> bool;

    /// Deliver `text` to `recipient` (an opaque channel-specific address).
    ///
    /// Intentionally `&self` so a connected adapter can send concurrently
    /// without a mutable borrow.
    async fn send(&self, recipient: &str, text: &str) -> SendOutcome;
}
