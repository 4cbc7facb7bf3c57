//! Dependency wiring: builds the adapters named by [`AppConfig`] and hands
//! them to the use cases.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use kd_app::{
    default_profile_steps, AppStartup, DraftStore, ProfileSynchronizer, SaveRetryPolicy,
    SessionService, StepController, StepControllerDeps,
};
use kd_core::config::AppConfig;
use kd_core::ports::{LocalDraftPort, ProfileRecordPort};
use kd_infra::record_store::RestStoreConfig;
use kd_infra::{
    FileDraftCacheRepository, FileIdentityStore, FileProfileRecordStore, RestProfileRecordStore,
    TracingWizardEventPort,
};

const PROFILES_DIR: &str = "profiles";

/// Everything a front end needs for one wizard.
pub struct AppRuntime {
    pub config: AppConfig,
    pub session: Arc<SessionService>,
    pub controller: Arc<StepController>,
    pub startup: AppStartup,
}

pub fn wire_dependencies(config: AppConfig) -> anyhow::Result<AppRuntime> {
    let records = build_record_store(&config)?;
    let cache: Arc<dyn LocalDraftPort> =
        Arc::new(FileDraftCacheRepository::with_defaults(config.data_dir.clone()));
    let session = Arc::new(
        SessionService::new(Arc::new(FileIdentityStore::new(config.data_dir.clone())))
            .with_draft_cache(cache.clone()),
    );

    let steps = default_profile_steps(config.min_age).context("Invalid onboarding steps")?;
    let controller = StepController::from_deps(StepControllerDeps {
        draft_store: DraftStore::for_sequence(&steps).arc(),
        steps,
        synchronizer: Arc::new(ProfileSynchronizer::new(records).with_local_cache(cache)),
        identity: session.clone(),
        events: Arc::new(TracingWizardEventPort),
        retry: SaveRetryPolicy::new(
            config.save_retry_attempts,
            Duration::from_millis(config.save_retry_backoff_ms),
        ),
    });

    let startup = AppStartup::new().with_service(session.clone());

    Ok(AppRuntime {
        config,
        session,
        controller: Arc::new(controller),
        startup,
    })
}

fn build_record_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ProfileRecordPort>> {
    if config.has_remote_backend() {
        info!(
            url = %config.backend_url,
            table = %config.backend_table,
            "using remote profile backend"
        );
        let store = RestProfileRecordStore::new(RestStoreConfig {
            base_url: config.backend_url.clone(),
            api_key: Some(config.backend_api_key.clone()).filter(|key| !key.is_empty()),
            table: config.backend_table.clone(),
            timeout: Duration::from_secs(config.backend_timeout_secs),
        })?;
        Ok(Arc::new(store))
    } else {
        let dir = config.data_dir.join(PROFILES_DIR);
        info!(dir = %dir.display(), "no backend configured, using local profile files");
        Ok(Arc::new(FileProfileRecordStore::new(dir)))
    }
}
