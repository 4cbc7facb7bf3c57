//! # kd-infra
//!
//! Adapters for the Kindred onboarding ports: profile record stores (memory,
//! local JSON files, hosted REST table), the on-device draft cache, the
//! signed-in identity file and the tracing-backed wizard event sink.

pub mod draft_cache;
pub mod fs;
pub mod identity_store;
pub mod record_store;
pub mod wizard_events;

pub use draft_cache::FileDraftCacheRepository;
pub use identity_store::FileIdentityStore;
pub use record_store::{FileProfileRecordStore, InMemoryProfileRecordStore, RestProfileRecordStore};
pub use wizard_events::TracingWizardEventPort;
