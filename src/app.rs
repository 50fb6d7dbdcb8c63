use crate::{
    config::Config,
    image_store::ImageStore,
    model_service::EmotionModel,
    ort_service::OrtModelService,
    pipeline::PredictionPipeline,
    prediction_log::PredictionLog,
    server::{HttpServer, SharedState},
    telemetry::Metrics,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::signal;

/// Builds the process-scoped state shared by every request. Only the image
/// directory is fatal here: an unusable prediction log is reported and the
/// service keeps running without it.
pub fn build_state(model: impl EmotionModel, config: &Config) -> anyhow::Result<SharedState> {
    let image_store = ImageStore::open(&config.storage.image_dir).with_context(|| {
        format!(
            "failed to create image directory {:?}",
            config.storage.image_dir
        )
    })?;

    let prediction_log = PredictionLog::new(&config.storage.database_path);
    if let Err(e) = prediction_log.init() {
        tracing::error!("Database init error: {}", e);
    }

    let metrics = Metrics::new()?;

    Ok(SharedState {
        pipeline: Arc::new(PredictionPipeline::new(model, image_store, prediction_log)),
        metrics: Arc::new(metrics),
    })
}

pub async fn start_app(config: Config) -> anyhow::Result<()> {
    let model = match OrtModelService::new(&config.model) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("Failed to load emotion model: {}", e);
            return Err(e.into());
        }
    };

    let state = build_state(model, &config)?;
    let server = HttpServer::new(state, &config).await?;

    server
        .run(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown.");
        })
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
