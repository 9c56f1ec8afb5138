use forge::prelude::*;

mod channel;
mod config;
mod error;
mod functions;
mod hub;
mod pipeline;
mod realtime;
mod repo;
mod schema;
mod service;
mod state;

use async_trait::async_trait;
use channel::{ChannelEvent, EventSink};
use config::Config;
use hub::BroadcastHub;
use pipeline::EventPipeline;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Forwards to whichever [`EventPipeline`] is installed once startup wiring
/// finishes. The Session Manager needs a sink before the pipeline that will
/// become that sink can be built (the pipeline itself needs the manager), so
/// this breaks the cycle instead of changing either constructor's shape.
struct PipelineSink {
    pipeline: tokio::sync::OnceCell<Arc<EventPipeline>>,
}

impl PipelineSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            pipeline: tokio::sync::OnceCell::new(),
        })
    }

    fn set(&self, pipeline: Arc<EventPipeline>) {
        self.pipeline
            .set(pipeline)
            .unwrap_or_else(|_| panic!("pipeline sink set twice"));
    }
}

#[async_trait]
impl EventSink for PipelineSink {
    async fn handle(&self, inbox_id: Uuid, event: ChannelEvent) {
        if let Some(pipeline) = self.pipeline.get() {
            pipeline.handle(inbox_id, event).await;
        } else {
            tracing::warn!(%inbox_id, "channel event dropped before startup finished wiring the pipeline");
        }
    }
}

async fn bootstrap(app_config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db = sqlx::PgPool::connect(&app_config.database_url).await?;

    let hub = BroadcastHub::new(app_config.hub_buffer_size);
    let sink = PipelineSink::new();
    let manager = Arc::new(channel::manager::SessionManager::new(
        app_config.whatsapp_store_path.clone(),
        app_config.media_dir.clone(),
        sink.clone(),
        Duration::from_millis(app_config.restore_stagger_ms),
    ));
    let pipeline = EventPipeline::new(db.clone(), hub.clone(), manager.clone(), app_config.media_dir.clone());
    sink.set(pipeline.clone());

    let state = Arc::new(AppState { db, hub, manager, pipeline });
    state::install(state.clone());
    Ok(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app_config = Config::from_env().map_err(|e| ForgeError::Internal(e.to_string()))?;
    let state = bootstrap(&app_config)
        .await
        .map_err(|e| ForgeError::Internal(e.to_string()))?;

    let restore = service::inbox_service::list_for_restore(&state.db)
        .await
        .map_err(|e| ForgeError::Internal(e.to_string()))?;
    state.manager.restore_connections(restore).await;

    realtime::spawn(state.hub.clone(), app_config.ws_port);

    let config = ForgeConfig::from_file("forge.toml")?;
    let builder = Forge::builder();

    let manager_for_shutdown = state.manager.clone();
    tokio::select! {
        result = builder.config(config).build()?.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, disconnecting channel sessions");
            manager_for_shutdown.shutdown().await;
            Ok(())
        }
    }
}
