use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::app::app;
use crate::audit::{AuditSink, ChannelAuditSink, DisabledAuditSink, LogAuditWriter, PgAuditWriter};
use crate::auth::{AuthError, AuthService, Role};
use crate::config::AppConfig;
use crate::database::models::account::CreateUserInput;
use crate::database::{
    AccountStore, DatabaseManager, HealthCheck, MemoryAccountStore, MemoryHealth, MemoryProductStore,
    PgAccountStore, PgProductStore, ProductStore,
};
use crate::services::ProductService;
use crate::state::AppState;

pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

struct Backend {
    products: Arc<dyn ProductStore>,
    accounts: Arc<dyn AccountStore>,
    health: Arc<dyn HealthCheck>,
    audit: Arc<dyn AuditSink>,
    audit_worker: Option<JoinHandle<()>>,
    db: Option<DatabaseManager>,
}

pub async fn handle(config: AppConfig, in_memory: bool, admin: Option<AdminSeed>) -> anyhow::Result<()> {
    info!("Starting KMCI API in {:?} mode", config.environment);

    let backend = if in_memory {
        warn!("using in-memory stores; data is lost on exit");
        memory_backend(&config)
    } else {
        postgres_backend(&config).await?
    };

    let auth = AuthService::new(&config.security, backend.accounts.clone()).context("invalid security configuration")?;
    if let Some(admin) = admin {
        seed_admin(&auth, admin).await?;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let products = ProductService::new(backend.products.clone(), backend.audit.clone());
    let state = AppState::new(config, auth, products, backend.health.clone());
    drop(backend.audit);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("KMCI API listening on http://{}", bind_addr);

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router (and every audit sender it held) is gone; let the worker drain.
    if let Some(worker) = backend.audit_worker {
        if tokio::time::timeout(Duration::from_secs(5), worker).await.is_err() {
            warn!("audit worker did not drain within 5s");
        }
    }
    if let Some(db) = backend.db {
        db.close().await;
    }
    info!("shutdown complete");
    Ok(())
}

fn memory_backend(config: &AppConfig) -> Backend {
    let (audit, audit_worker): (Arc<dyn AuditSink>, Option<JoinHandle<()>>) = if config.security.enable_audit_logging {
        let (sink, worker) = ChannelAuditSink::spawn(Arc::new(LogAuditWriter));
        (Arc::new(sink), Some(worker))
    } else {
        (Arc::new(DisabledAuditSink), None)
    };

    Backend {
        products: Arc::new(MemoryProductStore::new()),
        accounts: Arc::new(MemoryAccountStore::new()),
        health: Arc::new(MemoryHealth::default()),
        audit,
        audit_worker,
        db: None,
    }
}

async fn postgres_backend(config: &AppConfig) -> anyhow::Result<Backend> {
    let db = DatabaseManager::open(&config.database)
        .await
        .context("failed to connect to database")?;

    let mut products = PgProductStore::new(db.clone());
    if config.database.enable_slow_query_warning {
        products = products.with_slow_query_warning(Duration::from_millis(config.database.slow_query_threshold_ms));
    }

    let (audit, audit_worker): (Arc<dyn AuditSink>, Option<JoinHandle<()>>) = if config.security.enable_audit_logging {
        let (sink, worker) = ChannelAuditSink::spawn(Arc::new(PgAuditWriter::new(db.clone())));
        (Arc::new(sink), Some(worker))
    } else {
        (Arc::new(DisabledAuditSink), None)
    };

    Ok(Backend {
        products: Arc::new(products),
        accounts: Arc::new(PgAccountStore::new(db.clone())),
        health: Arc::new(db.clone()),
        audit,
        audit_worker,
        db: Some(db),
    })
}

async fn seed_admin(auth: &AuthService, admin: AdminSeed) -> anyhow::Result<()> {
    let result = auth
        .create_user(CreateUserInput {
            email: Some(admin.email.clone()),
            password: Some(admin.password),
            display_name: Some("Administrator".to_string()),
            role: Some(Role::SuperAdmin.as_str().to_string()),
        })
        .await;

    match result {
        Ok(user) => info!(email = %user.email, "seeded super_admin account"),
        Err(AuthError::DuplicateEmail) => info!(email = %admin.email, "super_admin account already exists"),
        Err(err) => return Err(err).context("failed to seed super_admin account"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
