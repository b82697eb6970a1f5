use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtValidator;
use crate::config::Settings;
use crate::push::PushDispatcher;
use crate::registry::SocketRegistry;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub registry: Arc<SocketRegistry>,
    pub dispatcher: Arc<PushDispatcher>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));
        let registry = Arc::new(SocketRegistry::new());
        let dispatcher = Arc::new(PushDispatcher::new(registry.clone()));

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            registry,
            dispatcher,
            start_time: Instant::now(),
        }
    }
}
