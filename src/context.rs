//! Shared state every front-end wrapper needs a handle to: the resource
//! manager. One [`Context`] is created per [`crate::instance::GpuInstance`]
//! and cloned (via `Arc`) into every resource created under it, mirroring
//! the original's single process-wide `ResourceManager` instance.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::resource_manager::ResourceManager;

pub(crate) struct Context {
    pub(crate) resources: Mutex<ResourceManager>,
}

impl Context {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            resources: Mutex::new(ResourceManager::new()),
        })
    }
}

pub(crate) type SharedContext = Arc<Context>;
