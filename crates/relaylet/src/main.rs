//! Relaylet - virtual kubelet backed by a remote cluster
//!
//! Registers a virtual node in the host cluster, relays pods scheduled onto
//! it to the remote cluster, and serves the kubelet daemon endpoint.
//!
//! # Configuration
//!
//! - `PROVIDER_CONFIG`: YAML file with `LocalKubeConfig` and `RemoteKubeConfig`
//! - `KUBE_CONFIG_PATH`: kubeconfig used when the file leaves a path empty
//! - `VKUBELET_NODE_NAME`, `VKUBELET_POD_IP`, `KUBELET_PORT`, `LISTEN_ADDR`
//!
//! See `relaylet --help` for every flag.

use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaylet::{create_router, Cli, DaemonState, NodeHeartbeat, PodSync};
use relaylet_client::{ClusterClients, KubeconfigSource, ProviderConfig};
use relaylet_provider::RemoteProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relaylet=debug,relaylet_provider=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let listen_addr = cli.listen_addr();

    tracing::info!(
        node = %cli.node_name,
        provider_config = %cli.provider_config.display(),
        listen_addr = %listen_addr,
        local_in_cluster = cli.local_in_cluster,
        "Starting relaylet"
    );

    let config = ProviderConfig::load(&cli.provider_config)?;
    let clients = if cli.local_in_cluster {
        let remote =
            KubeconfigSource::resolve(config.remote_kubeconfig.as_deref(), "remote")?;
        ClusterClients::from_sources(&KubeconfigSource::InCluster, &remote).await?
    } else {
        ClusterClients::from_config(&config).await?
    };

    let provider = Arc::new(RemoteProvider::from_client(
        clients.remote.clone(),
        cli.node_info(),
    ));
    let cancel = CancellationToken::new();

    let heartbeat = NodeHeartbeat::new(
        Arc::clone(&provider),
        clients.local.clone(),
        cli.node_name.clone(),
        cli.node_status_interval(),
    );
    heartbeat.register().await?;

    let sync = PodSync::new(
        Arc::clone(&provider),
        clients.local.clone(),
        cli.node_name.clone(),
        cli.pod_status_interval(),
    );

    let heartbeat_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { heartbeat.run(cancel).await }
    });
    let sync_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { sync.run(cancel).await }
    });

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown requested");
            cancel.cancel();
        }
    });

    let app = create_router(DaemonState::new(provider, cancel.clone()));

    tracing::info!(listen_addr = %listen_addr, "Starting daemon endpoint");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await?;

    cancel.cancel();
    let (heartbeat_result, sync_result) = tokio::join!(heartbeat_task, sync_task);
    report_task("node heartbeat", heartbeat_result);
    report_task("pod sync", sync_result);

    tracing::info!("Relaylet stopped");
    Ok(())
}

/// Log a background task that panicked or was aborted. Returns whether it
/// finished cleanly.
fn report_task(task: &str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(task, error = %e, "Background task failed");
            false
        }
    }
}
