mod service;

pub use service::{IdentityProvider, SessionError, SessionService};
