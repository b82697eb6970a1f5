mod registry;
mod types;

pub use registry::SocketRegistry;
pub use types::{RegistryStats, SocketHandle};
