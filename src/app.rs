use std::sync::Arc;

use anyhow::Context;

use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::{
    gateway::{PaymentGateway, StripeGateway},
    modules,
    state::AppState,
};

/// Registry holding every route module, bound to `state`
pub fn build_registry(state: &AppState) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state)?;
    Ok(registry)
}

async fn connect_state(settings: Arc<Settings>) -> anyhow::Result<AppState> {
    let store = bookstore_db::connect(&settings.database).await?;
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(StripeGateway::from_settings(&settings.payments)?);
    Ok(AppState::new(settings, store, gateway))
}

/// Apply pending module migrations and return how many ran
pub async fn migrate(settings: Settings) -> anyhow::Result<usize> {
    settings.validate()?;
    let state = connect_state(Arc::new(settings)).await?;
    let registry = build_registry(&state)?;

    let applied = state
        .store
        .apply_migrations(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;

    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

/// Full server lifecycle: connect, migrate, serve, then stop modules
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    bookstore_telemetry::init(&settings.telemetry)?;
    settings.validate()?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "bookstore bootstrap starting"
    );

    let settings = Arc::new(settings);
    let state = connect_state(settings.clone()).await?;
    let registry = build_registry(&state)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;

    let applied = state
        .store
        .apply_migrations(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, modules = registry.len(), "migrations applied");

    registry.start_all(&ctx).await?;

    let app = bookstore_http::build_router(&registry, &settings);
    let served = bookstore_http::start_server(app, &settings).await;

    registry.stop_all().await?;
    served
}
