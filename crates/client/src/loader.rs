//! Lazily loaded external resources.
//!
//! [`SingleFlight`] keeps at most one load in flight: concurrent callers join
//! the pending load instead of starting their own. A success is cached for
//! the owner's lifetime; a failure clears the slot so the next call retries.
//! There is no cancellation: once started, a load runs to completion on the
//! tokio runtime even if every waiter goes away.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use iterbene_shared::LoadError;

use crate::config::AppConfig;

type SharedLoad<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

enum Slot<T, E> {
    Empty,
    Loading(SharedLoad<T, E>),
    Ready(T),
}

pub struct SingleFlight<T, E> {
    slot: Arc<Mutex<Slot<T, E>>>,
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Empty)),
        }
    }

    /// Return the cached value, join the in-flight load, or start one with
    /// `load`. `load` is only called when nothing is cached or pending. Must be
    /// called within a tokio runtime.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let pending = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Ready(value) => return Ok(value.clone()),
                Slot::Loading(pending) => pending.clone(),
                Slot::Empty => {
                    let pending = load().boxed().shared();
                    *slot = Slot::Loading(pending.clone());

                    // Drive the load independently of the waiters
                    let driver_slot = self.slot.clone();
                    let driven = pending.clone();
                    tokio::spawn(async move {
                        let result = driven.clone().await;
                        settle(&driver_slot, &driven, &result);
                    });
                    pending
                }
            }
        };

        let result = pending.clone().await;
        settle(&self.slot, &pending, &result);
        result
    }

    pub fn get(&self) -> Option<T> {
        match &*self.lock() {
            Slot::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*self.lock(), Slot::Loading(_))
    }

    /// Forget a cached value. An in-flight load is left to finish.
    pub fn reset(&self) {
        let mut slot = self.lock();
        if matches!(&*slot, Slot::Ready(_)) {
            *slot = Slot::Empty;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T, E>> {
        lock_slot(&self.slot)
    }
}

fn lock_slot<T, E>(slot: &Mutex<Slot<T, E>>) -> MutexGuard<'_, Slot<T, E>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Record the outcome of `load`. The driver task and every waiter call this;
/// only the first call for a given load changes anything.
fn settle<T: Clone, E: Clone>(
    slot: &Mutex<Slot<T, E>>,
    load: &SharedLoad<T, E>,
    result: &Result<T, E>,
) {
    let mut slot = lock_slot(slot);
    if let Slot::Loading(current) = &*slot {
        if current.ptr_eq(load) {
            *slot = match result {
                Ok(value) => Slot::Ready(value.clone()),
                Err(_) => Slot::Empty,
            };
        }
    }
}

impl<T, E> Default for SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The map provider's bootstrap script.
#[derive(Debug, Clone, PartialEq)]
pub struct MapsScript {
    pub url: String,
    pub source: Arc<str>,
}

/// What the UI should render for the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No API key configured; the map stays hidden.
    MissingKey,
    Idle,
    Loading,
    Loaded,
    Failed(LoadError),
}

/// Loads the map provider script at most once per owner.
pub struct MapsScriptLoader {
    http: reqwest::Client,
    script_url: String,
    api_key: Option<String>,
    cache: SingleFlight<MapsScript, LoadError>,
    last_error: Mutex<Option<LoadError>>,
}

impl MapsScriptLoader {
    pub fn new(script_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            script_url: script_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            cache: SingleFlight::new(),
            last_error: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.maps_script_url.clone(), config.maps_api_key.clone())
    }

    pub fn status(&self) -> LoadStatus {
        if self.api_key.is_none() {
            return LoadStatus::MissingKey;
        }
        if self.cache.get().is_some() {
            return LoadStatus::Loaded;
        }
        if self.cache.is_loading() {
            return LoadStatus::Loading;
        }
        match self.last_error_slot().clone() {
            Some(err) => LoadStatus::Failed(err),
            None => LoadStatus::Idle,
        }
    }

    /// Fetch the script, joining any load already in flight.
    pub async fn load(&self) -> Result<MapsScript, LoadError> {
        let Some(key) = self.api_key.clone() else {
            crate::log_warn!("Map provider key missing; not loading {}", self.script_url);
            return Err(LoadError::MissingApiKey);
        };

        let http = self.http.clone();
        let url = self.script_url.clone();
        let result = self
            .cache
            .get_or_load(move || fetch_script(http, url, key))
            .await;

        *self.last_error_slot() = result.as_ref().err().cloned();
        result
    }

    fn last_error_slot(&self) -> MutexGuard<'_, Option<LoadError>> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn fetch_script(
    http: reqwest::Client,
    url: String,
    key: String,
) -> Result<MapsScript, LoadError> {
    crate::log_debug!("Fetching map provider script from {}", url);
    let resp = http
        .get(&url)
        .query(&[("key", key.as_str())])
        .send()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        crate::log_error!("Map provider script returned HTTP {}", status.as_u16());
        return Err(LoadError::Http {
            status: status.as_u16(),
        });
    }

    let source = resp
        .text()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;
    crate::log_info!("Loaded map provider script ({} bytes)", source.len());
    Ok(MapsScript {
        url,
        source: source.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::join_all;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let flight: SingleFlight<u32, String> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let waiters = (0..8).map(|_| {
            let calls = calls.clone();
            flight.get_or_load(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(7)
            })
        });
        let results = join_all(waiters).await;

        assert!(results.iter().all(|r| r == &Ok(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.get(), Some(7));
    }

    #[tokio::test]
    async fn load_finishes_after_its_only_waiter_is_dropped() {
        let flight: SingleFlight<u32, String> = SingleFlight::new();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            flight.get_or_load(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(5)
            }),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(flight.is_loading());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!flight.is_loading());
        assert_eq!(flight.get(), Some(5));
    }

    #[tokio::test]
    async fn failure_clears_the_slot() {
        let flight: SingleFlight<u32, String> = SingleFlight::new();

        let first = flight
            .get_or_load(|| async { Err::<u32, _>("offline".to_string()) })
            .await;
        assert_eq!(first, Err("offline".to_string()));
        assert!(!flight.is_loading());
        assert_eq!(flight.get(), None);

        let second = flight.get_or_load(|| async { Ok(3) }).await;
        assert_eq!(second, Ok(3));
    }

    #[tokio::test]
    async fn cached_value_skips_the_loader() {
        let flight: SingleFlight<u32, String> = SingleFlight::new();
        flight.get_or_load(|| async { Ok(1) }).await.unwrap();

        let again = flight
            .get_or_load(|| async { Err::<u32, _>("loader must not run".to_string()) })
            .await;
        assert_eq!(again, Ok(1));

        flight.reset();
        assert_eq!(flight.get_or_load(|| async { Ok(2) }).await, Ok(2));
    }

    #[tokio::test]
    async fn script_is_fetched_once_for_concurrent_loads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/js"))
            .and(query_param("key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("window.maps = {};")
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let loader = MapsScriptLoader::new(
            format!("{}/maps/api/js", server.uri()),
            Some("test-key".to_string()),
        );
        assert_eq!(loader.status(), LoadStatus::Idle);

        let results = join_all((0..5).map(|_| loader.load())).await;
        for result in &results {
            assert_eq!(result.as_ref().unwrap().source.as_ref(), "window.maps = {};");
        }
        assert_eq!(loader.status(), LoadStatus::Loaded);

        // Served from cache
        loader.load().await.unwrap();
    }

    #[tokio::test]
    async fn abandoned_script_load_still_completes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("window.maps = {};")
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let loader = MapsScriptLoader::new(format!("{}/js", server.uri()), Some("k".into()));
        let abandoned = tokio::time::timeout(Duration::from_millis(10), loader.load()).await;
        assert!(abandoned.is_err());
        assert_eq!(loader.status(), LoadStatus::Loading);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(loader.status(), LoadStatus::Loaded);

        // Cached; no second request
        let script = loader.load().await.unwrap();
        assert_eq!(script.source.as_ref(), "window.maps = {};");
    }

    #[tokio::test]
    async fn failed_script_load_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/js"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .with_priority(2)
            .mount(&server)
            .await;

        let loader = MapsScriptLoader::new(format!("{}/js", server.uri()), Some("k".into()));

        let err = loader.load().await.unwrap_err();
        assert_eq!(err, LoadError::Http { status: 500 });
        assert_eq!(loader.status(), LoadStatus::Failed(LoadError::Http { status: 500 }));

        let script = loader.load().await.unwrap();
        assert_eq!(script.source.as_ref(), "ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_key_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let loader = MapsScriptLoader::new(format!("{}/js", server.uri()), Some("  ".into()));
        assert_eq!(loader.status(), LoadStatus::MissingKey);
        assert_eq!(loader.load().await, Err(LoadError::MissingApiKey));
    }
}
