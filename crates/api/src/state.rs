use std::sync::Arc;

use kana_core::generation::{ContentGenerator, ImageFetcher};
use kana_pipeline::{
    EnhanceProcessor, ExportManager, JobEventBus, JobStore, PlannerSession, SettingsHandle,
};
use kana_store::{AccountService, BlobStore, MemoryAccountRepo, MemoryPlannerRepo, PlannerStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job status events published by the job store.
    pub events: Arc<JobEventBus>,
    /// Enhancement job records and selection.
    pub jobs: Arc<JobStore>,
    /// The shared enhancement settings.
    pub settings: Arc<SettingsHandle>,
    /// Single-job and batch enhancement driver.
    pub processor: Arc<EnhanceProcessor>,
    /// Download planning and artifact production.
    pub export: Arc<ExportManager>,
    /// The live grid planner.
    pub planner: Arc<PlannerSession>,
    /// Remote content generation, for the standalone content endpoints.
    pub generator: Arc<dyn ContentGenerator>,
    /// Profile documents.
    pub accounts: Arc<AccountService>,
    /// Blob storage shared by accounts and the planner.
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    /// Wire every service around the given collaborators.
    pub fn new(
        config: ServerConfig,
        generator: Arc<dyn ContentGenerator>,
        fetcher: Arc<dyn ImageFetcher>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let events = Arc::new(JobEventBus::default());
        let jobs = Arc::new(JobStore::new(Arc::clone(&events)));
        let settings = Arc::new(SettingsHandle::default());

        let processor = Arc::new(EnhanceProcessor::new(
            Arc::clone(&jobs),
            Arc::clone(&settings),
            Arc::clone(&generator),
        ));
        let export = Arc::new(ExportManager::new(
            Arc::clone(&jobs),
            Arc::clone(&settings),
            Arc::clone(&fetcher),
        ));
        let planner = Arc::new(PlannerSession::new(
            Arc::clone(&generator),
            fetcher,
            PlannerStore::new(Arc::new(MemoryPlannerRepo::new()), Arc::clone(&blobs)),
        ));
        let accounts = Arc::new(AccountService::new(
            Arc::new(MemoryAccountRepo::new()),
            Arc::clone(&blobs),
        ));

        Self {
            config: Arc::new(config),
            events,
            jobs,
            settings,
            processor,
            export,
            planner,
            generator,
            accounts,
            blobs,
        }
    }
}
