use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::ws::manager::WsManager;

/// Spawn the keepalive task: pings every connected client at the
/// configured interval (`WS_HEARTBEAT_SECS`).
///
/// Proxies and load balancers drop WebSocket connections that stay
/// silent; the periodic Ping keeps them open and gives clients a way to
/// detect a dead server. The task runs until aborted during shutdown.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() yields its first tick immediately; consume it so
        // the first real ping lands one full interval after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let count = ws_manager.connection_count().await;
            if count == 0 {
                continue;
            }
            tracing::trace!(count, "Pinging WebSocket connections");
            ws_manager.ping_all().await;
        }
    })
}
