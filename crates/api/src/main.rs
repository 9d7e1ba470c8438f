use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulsefit_api::config::ServerConfig;
use pulsefit_api::engine::{JobStatusAggregator, QueueDispatcher, SimulatedProcessor};
use pulsefit_api::router::build_app_router;
use pulsefit_api::{state, ws};
use pulsefit_core::Capability;
use pulsefit_events::{JobEventBus, ProgressNotifier};
use pulsefit_queue::{MemoryQueue, Processor, WorkQueue};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulsefit_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Event bus ---
    let event_bus = Arc::new(JobEventBus::default());
    tracing::info!("Job event bus created");

    // --- Work queues + workers ---
    // One queue per capability, all publishing onto the shared bus. The
    // binary binds the simulated processor; real generation backends
    // replace it at the same seam.
    let worker_cancel = tokio_util::sync::CancellationToken::new();
    let processor: Arc<dyn Processor> = Arc::new(SimulatedProcessor::new());

    let mut queues: HashMap<Capability, Arc<dyn WorkQueue>> = HashMap::new();
    let mut worker_handles = Vec::new();
    for capability in Capability::ALL {
        let queue = Arc::new(MemoryQueue::new(capability, Arc::clone(&event_bus)));
        worker_handles.extend(queue.start_workers(
            Arc::clone(&processor),
            config.queue_concurrency,
            worker_cancel.clone(),
        ));
        queues.insert(capability, queue);
    }
    tracing::info!(
        queues = queues.len(),
        concurrency = config.queue_concurrency,
        "Work queues started"
    );

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(
        Arc::clone(&ws_manager),
        Duration::from_secs(config.ws_heartbeat_secs),
    );

    // --- Progress notifier ---
    // Routes job lifecycle events from the bus into WebSocket rooms.
    let notifier = ProgressNotifier::new(Arc::new(ws::WsRoomSender::new(Arc::clone(&ws_manager))));
    let notifier_handle = tokio::spawn(notifier.run(event_bus.subscribe()));
    tracing::info!("Progress notifier started");

    // --- Engine ---
    let dispatcher = Arc::new(QueueDispatcher::new(queues.clone()));
    let aggregator = Arc::new(JobStatusAggregator::new(queues));

    // --- App state ---
    let state = AppState {
        ws_manager: Arc::clone(&ws_manager),
        dispatcher,
        aggregator,
        event_bus: Arc::clone(&event_bus),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop queue workers first (they may have in-flight jobs).
    worker_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    for handle in worker_handles {
        let _ = tokio::time::timeout(shutdown_timeout, handle).await;
    }
    tracing::info!("Queue workers stopped");

    // Drop the event bus sender to close the broadcast channel.
    // This signals the notifier to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), notifier_handle).await;
    tracing::info!("Progress notifier shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
