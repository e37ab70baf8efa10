use std::sync::Arc;

use bookstore_authz::{AuthState, TokenService};
use bookstore_db::Store;
use bookstore_kernel::settings::Settings;

use crate::gateway::PaymentGateway;

/// Shared handles cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn Store>,
    pub auth: AuthState,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let tokens = Arc::new(TokenService::from_settings(&settings.auth));
        Self {
            auth: AuthState::new(tokens, store.clone()),
            settings,
            store,
            gateway,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.auth.tokens
    }
}
