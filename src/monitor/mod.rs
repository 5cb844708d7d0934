mod liveness;
mod subscriptions;
mod tracker;
mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use liveness::{AlertDecision, InactivityAlert, LivenessEvaluator, QuietReason, WorkablePolicy};
pub use subscriptions::SubscriptionManager;
pub use tracker::InactivityTracker;
pub use window::{WindowMode, resolve_active_network};
