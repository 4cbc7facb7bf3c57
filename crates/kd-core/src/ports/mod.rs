//! Port interfaces for the application layer.
//!
//! Ports define the contract between the onboarding use cases and their
//! infrastructure implementations (record stores, local caches, identity
//! persistence, UI event sinks). Use cases depend only on these traits.

pub mod draft_cache;
pub mod identity_store;
pub mod profile_record;
pub mod wizard_event;

pub use draft_cache::{DraftCacheError, LocalDraftPort};
pub use identity_store::{IdentityStoreError, IdentityStorePort};
pub use profile_record::{ProfileRecordPort, RecordStoreError};
pub use wizard_event::WizardEventPort;
