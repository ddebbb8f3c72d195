use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::database::HealthCheck;
use crate::services::{PageLimits, ProductService};

/// Shared handler state. Every collaborator is injected; nothing is global.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub products: Arc<ProductService>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth: AuthService,
        products: ProductService,
        health: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            products: Arc::new(products),
            health,
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.config.api.default_page_size,
            max_page_size: self.config.api.max_page_size,
        }
    }
}
