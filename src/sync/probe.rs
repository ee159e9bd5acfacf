//! Reachability probe: periodically checks the server and feeds the result
//! into a [`Reachability`] signal.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use offline_queue_core::Reachability;

/// Upper bound for a single probe request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Returns true if `url` answers at all. Any HTTP status counts as
/// reachable; only connection-level failures count as offline.
pub async fn check_server(client: &reqwest::Client, url: &str) -> bool {
    client
        .get(url)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .is_ok()
}

/// Probes `url` every `interval` until `shutdown` flips to true.
pub fn spawn_probe(
    reachability: Reachability,
    url: String,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        tracing::debug!("Reachability probe started for {}", url);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let online = check_server(&client, &url).await;
            reachability.set_online(online);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::debug!("Reachability probe stopped");
    })
}
