//! Application context shared by all route handlers via Axum state.

use std::sync::Arc;

use mc_av::{Converter, ToolRegistry};
use mc_core::config::Config;

use crate::publisher::ArtifactPublisher;
use crate::storage::StorageLayout;
use crate::upload::UploadReceiver;

/// Cheaply cloneable: every component sits behind an `Arc`.
///
/// Nothing in here is mutated after construction, so concurrent requests
/// share it without locking.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub storage: Arc<StorageLayout>,
    pub tools: Arc<ToolRegistry>,
    pub uploads: Arc<UploadReceiver>,
    pub converter: Arc<Converter>,
    pub publisher: Arc<ArtifactPublisher>,
}

impl AppContext {
    /// Wire the pipeline components from configuration and resolved tools.
    pub fn new(config: Config, tools: ToolRegistry) -> Self {
        let storage = StorageLayout::new(&config.storage);
        let uploads = UploadReceiver::new(storage.clone(), config.storage.max_upload_bytes);
        let converter = Converter::new(tools.ffmpeg_program(), config.conversion.clone());
        let publisher = ArtifactPublisher::new(storage.clone());

        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            tools: Arc::new(tools),
            uploads: Arc::new(uploads),
            converter: Arc::new(converter),
            publisher: Arc::new(publisher),
        }
    }
}
