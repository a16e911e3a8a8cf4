use std::sync::Arc;
use tokio::sync::RwLock;

use releasekit_core::{BatchPipeline, Config, ConversionClient, SanitizedConfig};

use crate::api::WsBroadcaster;

/// A batch as held by the server, running against a shared client.
pub type Batch = BatchPipeline<dyn ConversionClient>;

/// Shared application state
pub struct AppState {
    config: Config,
    client: Arc<dyn ConversionClient>,
    /// Batches in creation order. Memory only.
    batches: RwLock<Vec<Arc<Batch>>>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        client: Arc<dyn ConversionClient>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            client,
            batches: RwLock::new(Vec::new()),
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn client(&self) -> Arc<dyn ConversionClient> {
        Arc::clone(&self.client)
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }

    /// Registers a new batch.
    pub async fn insert_batch(&self, batch: Arc<Batch>) {
        self.batches.write().await.push(batch);
    }

    /// Looks up a batch by id.
    pub async fn batch(&self, id: &str) -> Option<Arc<Batch>> {
        self.batches
            .read()
            .await
            .iter()
            .find(|b| b.id() == id)
            .cloned()
    }

    /// Drops a batch from the store, returning it if it was present.
    pub async fn remove_batch(&self, id: &str) -> Option<Arc<Batch>> {
        let mut batches = self.batches.write().await;
        let pos = batches.iter().position(|b| b.id() == id)?;
        Some(batches.remove(pos))
    }

    /// All batches, oldest first.
    pub async fn batches(&self) -> Vec<Arc<Batch>> {
        self.batches.read().await.clone()
    }
}
