mod api;
mod cache;
mod classifier;
mod config;
mod error;
mod redis;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::{PredictionCache, cache_namespace};
use classifier::{ClassifierClientConfig, HttpClassifier};
use config::Config;
use server::SymptomServer;
use symptom_engine::EngineContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting symptom MCP server");

    let config = Config::from_env()?;
    info!(
        data_dir = %config.data_dir,
        overrides = config.overrides_path.as_deref().unwrap_or("builtin"),
        top_n = config.top_n,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let redis_cache = redis::RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }

    let engine = Arc::new(EngineContext::load(
        &config.data_paths(),
        config.scoring_rules()?,
    )?);

    let classifier_config = ClassifierClientConfig::from_env();
    let namespace = cache_namespace(&config.cache_namespace(), classifier_config.as_ref());
    let cache = Arc::new(PredictionCache::new(redis_cache, namespace));
    info!(enabled = cache.is_enabled(), "prediction cache ready");

    let classifier = match classifier_config {
        Some(classifier_config) => {
            info!(
                url = %classifier_config.base_url,
                schema_version = %classifier_config.schema_version,
                "classifier endpoint configured"
            );
            Some(Arc::new(HttpClassifier::new(classifier_config)?))
        }
        None => {
            info!("CLASSIFIER_URL not set, predict_with_classifier disabled");
            None
        }
    };

    let server = SymptomServer::new(engine, classifier, cache);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
