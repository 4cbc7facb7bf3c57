//! Application startup fan-out.
//!
//! Services with their own one-time initialization (session restore, etc.)
//! implement [`Initialize`] and are started together by [`AppStartup`].

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, info, info_span, Instrument};

#[async_trait]
pub trait Initialize: Send + Sync {
    fn name(&self) -> &'static str;

    async fn initialize(&self) -> Result<()>;
}

#[derive(Debug)]
pub struct StartupError {
    pub failures: Vec<(&'static str, anyhow::Error)>,
}

impl StartupError {
    pub fn names(&self) -> Vec<&'static str> {
        self.failures.iter().map(|(name, _)| *name).collect()
    }
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "services failed to initialize: {}", self.names().join(", "))
    }
}

impl std::error::Error for StartupError {}

/// Runs every registered service's `initialize` concurrently and waits for all.
#[derive(Default)]
pub struct AppStartup {
    services: Vec<Arc<dyn Initialize>>,
}

impl AppStartup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: Arc<dyn Initialize>) -> Self {
        self.services.push(service);
        self
    }

    /// All services are started even if some fail; failures are collected.
    pub async fn initialize_all(&self) -> Result<(), StartupError> {
        let span = info_span!("usecase.app_startup.initialize_all", services = self.services.len());
        async {
            let results = join_all(self.services.iter().map(|service| async move {
                (service.name(), service.initialize().await)
            }))
            .await;

            let failures: Vec<_> = results
                .into_iter()
                .filter_map(|(name, result)| match result {
                    Ok(()) => {
                        info!(service = name, "service initialized");
                        None
                    }
                    Err(err) => {
                        error!(service = name, error = %err, "service failed to initialize");
                        Some((name, err))
                    }
                })
                .collect();

            if failures.is_empty() {
                Ok(())
            } else {
                Err(StartupError { failures })
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        name: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingService {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Initialize for CountingService {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn initialize(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("{} is down", self.name);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_initialize_all_runs_every_service() {
        let a = CountingService::new("a", false);
        let b = CountingService::new("b", false);
        let startup = AppStartup::new().with_service(a.clone()).with_service(b.clone());

        startup.initialize_all().await.unwrap();

        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_services() {
        let bad = CountingService::new("bad", true);
        let good = CountingService::new("good", false);
        let startup = AppStartup::new()
            .with_service(bad.clone())
            .with_service(good.clone());

        let err = startup.initialize_all().await.unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].0, "bad");
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("bad"));
    }
}
