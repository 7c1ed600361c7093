use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Core module trait that all bookshop modules implement
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module, also the mount path segment
    fn name(&self) -> &'static str;

    /// Called once at startup, after migrations have been applied
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `/api/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` relative to the mount point, plus
    /// `components.schemas`) merged into the served document
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// SQL migrations owned by this module, applied in `id` order after the
    /// migrations of every module registered before it
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called after every module is initialized, before the server binds
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the server has drained, in reverse registration order
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
