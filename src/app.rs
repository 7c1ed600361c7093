//! Application bootstrap: database, modules, migrations and the HTTP server.

use anyhow::Context;
use bookshop_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;
use crate::state::AppState;

/// Wired application: shared state plus every registered module.
pub struct App {
    pub state: AppState,
    pub registry: ModuleRegistry,
}

impl App {
    /// Open the database, register modules and apply pending migrations.
    pub async fn bootstrap(settings: &Settings) -> anyhow::Result<Self> {
        let db = bookshop_db::connect(&settings.database).await?;
        let state = AppState::new(db, settings);

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &state);

        let applied = bookshop_db::run_migrations(&state.db, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, modules = registry.module_count(), "application bootstrapped");

        Ok(Self { state, registry })
    }

    pub fn router(&self, settings: &Settings) -> axum::Router {
        bookshop_http::build_router(&self.registry, settings)
    }
}

/// Serve HTTP until Ctrl-C, driving the module lifecycle around it.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    bookshop_telemetry::init(&settings.telemetry);

    tracing::info!(env = ?settings.environment, db = %settings.database.url, "bookshop starting");

    let app = App::bootstrap(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };
    app.registry.init_modules(&ctx).await?;
    app.registry.start_modules(&ctx).await?;

    let served = bookshop_http::start_server(&app.registry, &settings, shutdown_signal()).await;

    app.registry.stop_modules().await?;
    app.state.db.close().await;
    served
}

/// Apply migrations and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings).await?;
    app.state.db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
