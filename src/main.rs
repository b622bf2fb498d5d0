use std::sync::Arc;

use anyhow::Context;

use email_operator::config::ControllerConfig;
use email_operator::dispatch::DispatchCycle;
use email_operator::error::SetupError;
use email_operator::store::KubeStore;
use email_operator::transport::SmtpRelay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage (kube and lettre both use rustls)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| SetupError::Tls("a rustls crypto provider is already installed".into()))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ControllerConfig::from_env().context("invalid controller configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        namespace = %config.namespace,
        email = %config.email_name,
        sender = config.sender_name.as_deref().unwrap_or("(from Email)"),
        relay = %format!("{}:{}", config.relay.host, config.relay.port),
        "Email operator starting"
    );

    let store = Arc::new(
        KubeStore::try_default()
            .await
            .context("cannot connect to the Kubernetes API")?,
    );

    let cycle = DispatchCycle::new(
        store.clone(),
        store,
        Arc::new(SmtpRelay::new(config.relay.clone())),
    )
    .with_api_group(config.api.clone())
    .with_token_key(config.token_key.clone());

    let outcome = cycle
        .run(
            &config.namespace,
            &config.email_name,
            config.sender_name.as_deref(),
        )
        .await
        .context("reconciliation cycle failed")?;

    tracing::info!(
        delivery_status = outcome
            .status
            .delivery_status()
            .map_or("", |s| s.as_str()),
        "Done"
    );
    Ok(())
}
