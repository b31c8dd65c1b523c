mod host_info;
mod logging;
mod node;
mod probe;
mod process;
mod server;
mod settings;
mod store;

use crate::host_info::HostInfo;
use crate::node::{DockerCli, NodeController};
use crate::probe::ConnectionProber;
use crate::server::{AppState, DashboardServer, shutdown_signal};
use crate::store::JsonProfileStore;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a single node log read.
const LOG_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let settings = settings::load_settings();
    let store = Arc::new(JsonProfileStore::new(settings.profiles_path.clone()));
    log::info!(
        "Managing container '{}', profiles in {}",
        settings.container_name,
        store.path().display()
    );

    let runtime = Arc::new(DockerCli::new(
        settings.container_name.clone(),
        settings.runtime_timeout(),
    ));
    let node = Arc::new(NodeController::new(runtime, settings.node.to_details()));
    let prober = ConnectionProber::new(settings.probe_timeout(), settings.websocket_path.clone());
    let host_info = HostInfo::new(settings.node_log_path.clone(), LOG_READ_TIMEOUT);

    let state = AppState::new(store, node, prober, host_info);
    let server = DashboardServer::bind(&settings.bind_address, settings.port, state).await?;
    server.run_until(shutdown_signal()).await
}
