use std::sync::Arc;

use crate::core::config::Settings;
use crate::repositories::{Backend, DynRepository};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    repo: DynRepository,
}

impl AppState {
    pub(crate) fn new(settings: Settings, repo: DynRepository) -> Self {
        Self { inner: Arc::new(InnerState { settings, repo }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn repo(&self) -> &DynRepository {
        &self.inner.repo
    }

    pub(crate) fn backend(&self) -> Backend {
        self.inner.repo.backend()
    }
}
