use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::models::event::{SpeedAlert, StoreEvent};
use crate::observability::metrics::Metrics;
use crate::oracle::RouteOracle;
use crate::store::DocumentStore;

pub struct AppState {
    pub store: DocumentStore,
    pub oracle: Arc<dyn RouteOracle>,
    pub alerts_tx: broadcast::Sender<SpeedAlert>,
    pub metrics: Metrics,
    pub max_speed_kmh: f64,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(
        oracle: Arc<dyn RouteOracle>,
        max_speed_kmh: f64,
        api_token: Option<String>,
        event_queue_size: usize,
        alert_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<StoreEvent>) {
        let (change_tx, change_rx) = mpsc::channel(event_queue_size);
        let (alerts_tx, _unused_rx) = broadcast::channel(alert_buffer_size);

        (
            Self {
                store: DocumentStore::new(change_tx),
                oracle,
                alerts_tx,
                metrics: Metrics::new(),
                max_speed_kmh,
                api_token,
            },
            change_rx,
        )
    }
}
