//! Push event types and dispatching.

mod dispatcher;
mod types;

pub use dispatcher::{DispatcherStatsSnapshot, PushDispatcher};
pub use types::{DeliveryResult, PushEvent};
