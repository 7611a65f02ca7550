use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use campus_notification_server::adapter::handler::{router, AppDependencies, AppState};
use campus_notification_server::adapter::repository::{
    AuditEntryPostgresRepository, DeliveryRecordPostgresRepository, InMemoryAuditEntryRepository,
    InMemoryDeliveryRecordRepository, InMemoryRecipientRepository, RecipientPostgresRepository,
};
use campus_notification_server::domain::repository::{
    AuditEntryRepository, DeliveryRecordRepository, RecipientRepository,
};
use campus_notification_server::infrastructure::config::Config;
use campus_notification_server::infrastructure::event_bus::{
    EventBusConfig, NotificationEventBus, TracingEventHandler,
};
use campus_notification_server::infrastructure::jwt_verifier::JwtVerifier;
use campus_notification_server::infrastructure::{database, delivery, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    telemetry::init_telemetry(&cfg.app.name, &cfg.observability)?;

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting campus notification server"
    );

    let recipient_repo: Arc<dyn RecipientRepository>;
    let record_repo: Arc<dyn DeliveryRecordRepository>;
    let audit_repo: Arc<dyn AuditEntryRepository>;
    let db_pool = if let Some(ref db_cfg) = cfg.database {
        let pool = database::connect(db_cfg).await?;
        database::migrate(&pool).await?;
        info!(host = %db_cfg.host, name = %db_cfg.name, "connected to PostgreSQL");
        let shared = Arc::new(pool.clone());
        recipient_repo = Arc::new(RecipientPostgresRepository::new(shared.clone()));
        record_repo = Arc::new(DeliveryRecordPostgresRepository::new(shared.clone()));
        audit_repo = Arc::new(AuditEntryPostgresRepository::new(shared));
        Some(pool)
    } else {
        tracing::warn!("no database configured, delivery records and audit entries are kept in memory");
        recipient_repo = match cfg.recipients_path {
            Some(ref path) => Arc::new(InMemoryRecipientRepository::load(path)?),
            None => Arc::new(InMemoryRecipientRepository::new(Vec::new())),
        };
        record_repo = Arc::new(InMemoryDeliveryRecordRepository::new());
        audit_repo = Arc::new(InMemoryAuditEntryRepository::new());
        None
    };

    let event_bus = Arc::new(NotificationEventBus::new(EventBusConfig {
        handler_timeout: cfg.dispatch.event_handler_timeout(),
    }));
    let _log_subscription = event_bus.subscribe(Arc::new(TracingEventHandler));

    let state = AppState::build(AppDependencies {
        recipient_repo,
        record_repo,
        audit_repo,
        channel: delivery::build_channel(&cfg.channel)?,
        token_verifier: Arc::new(JwtVerifier::from_config(&cfg.auth)),
        event_bus,
        retry_policy: cfg.dispatch.retry_policy(),
        inter_send_delay: cfg.dispatch.inter_send_delay(),
        db_pool,
    })?;
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "REST server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
