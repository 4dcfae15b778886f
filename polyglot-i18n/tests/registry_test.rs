//! Registry lifecycle, hook and middleware ordering tests

use async_trait::async_trait;
use parking_lot::Mutex;
use polyglot_i18n::prelude::*;
use polyglot_i18n::{FnHook, MemorySource, Next, ProviderFactory, ProviderState, TranslateRequest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

/// Echoes `language:key` and can be told to fail lifecycle calls.
struct Spy {
    name: String,
    fail_start: bool,
    fail_stop: bool,
    state: Mutex<ProviderState>,
}

#[async_trait]
impl Provider for Spy {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_language(&self) -> &str {
        "en"
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["en".into()]
    }

    fn state(&self) -> ProviderState {
        *self.state.lock()
    }

    async fn translate(&self, key: &str, language: &str, _params: &Params) -> Result<String> {
        if *self.state.lock() != ProviderState::Started {
            return Err(I18nError::NotStarted(self.name.clone()));
        }
        Ok(format!("{}:{}", language, key))
    }

    async fn translate_plural(
        &self,
        key: &str,
        language: &str,
        count: i64,
        params: &Params,
    ) -> Result<String> {
        let value = self.translate(key, language, params).await?;
        Ok(format!("{}#{}", value, count))
    }

    fn has_translation(&self, _key: &str, _language: &str) -> bool {
        true
    }

    async fn load_translations(&self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    async fn start(&self, _cancel: &CancellationToken) -> Result<()> {
        if self.fail_start {
            *self.state.lock() = ProviderState::Failed;
            return Err(I18nError::Load(format!("{} cannot start", self.name)));
        }
        *self.state.lock() = ProviderState::Started;
        Ok(())
    }

    async fn stop(&self, _cancel: &CancellationToken) -> Result<()> {
        *self.state.lock() = ProviderState::Stopped;
        if self.fail_stop {
            return Err(I18nError::Unhealthy(format!("{} stuck", self.name)));
        }
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }

    fn loaded_languages(&self) -> Vec<String> {
        vec!["en".into()]
    }

    fn loaded_keys(&self, _language: &str) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Default, Clone)]
struct SpyFactory {
    name: &'static str,
    fail_start: bool,
    fail_stop: bool,
}

impl ProviderFactory for SpyFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn create(&self, _config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
        Ok(Arc::new(Spy {
            name: self.name.to_string(),
            fail_start: self.fail_start,
            fail_stop: self.fail_stop,
            state: Mutex::new(ProviderState::Created),
        }))
    }
}

fn spy_factory(name: &'static str) -> Arc<dyn ProviderFactory> {
    Arc::new(SpyFactory {
        name,
        ..Default::default()
    })
}

/// Wait until spawned hook deliveries have logged `len` entries.
async fn wait_for_log(log: &Log, len: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while log.lock().len() < len {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("hooks never ran");
}

fn recording_hook(log: &Log, name: &str, priority: i32) -> Arc<dyn Hook> {
    let log = Arc::clone(log);
    let label = name.to_string();
    Arc::new(FnHook::new(name, priority, move |event: &ProviderEvent| {
        log.lock().push(format!("{}:{}", label, event.kind()));
        Ok(())
    }))
}

struct Recording {
    name: &'static str,
    log: Log,
    veto_start: bool,
}

#[async_trait]
impl Middleware for Recording {
    fn name(&self) -> &str {
        self.name
    }

    async fn wrap_translate(&self, request: TranslateRequest, next: Next) -> Result<String> {
        self.log.lock().push(format!("{}:wrap", self.name));
        next(request).await
    }

    async fn on_event(&self, event: &ProviderEvent) -> Result<()> {
        self.log.lock().push(format!("{}:{}", self.name, event.kind()));
        if self.veto_start && event.kind() == "start" {
            return Err(I18nError::Middleware {
                name: self.name.to_string(),
                message: "maintenance window".into(),
            });
        }
        Ok(())
    }
}

fn recording_middleware(log: &Log, name: &'static str) -> Arc<dyn Middleware> {
    Arc::new(Recording {
        name,
        log: Arc::clone(log),
        veto_start: false,
    })
}

#[tokio::test]
async fn test_hooks_fire_in_priority_order() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry.register_provider(spy_factory("spy")).unwrap();
    registry.add_hook(recording_hook(&log, "three", 3)).unwrap();
    registry.add_hook(recording_hook(&log, "one", 1)).unwrap();
    registry.add_hook(recording_hook(&log, "two", 2)).unwrap();

    let provider = registry.create_provider("spy", &ProviderConfig::default()).unwrap();
    provider.start(&CancellationToken::new()).await.unwrap();
    log.lock().clear();

    provider.translate("k", "en", &Params::new()).await.unwrap();
    wait_for_log(&log, 3).await;
    assert_eq!(*log.lock(), vec!["one:translate", "two:translate", "three:translate"]);
}

/// Sleeps before recording, like a hook shipping events to a slow sink.
struct SlowHook {
    log: Log,
}

#[async_trait]
impl Hook for SlowHook {
    fn name(&self) -> &str {
        "slow"
    }

    async fn on_event(&self, event: &ProviderEvent) -> Result<()> {
        if event.kind() == "translate" {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        self.log.lock().push(format!("slow:{}", event.kind()));
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_hook_does_not_delay_translate() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry.register_provider(spy_factory("spy")).unwrap();
    registry
        .add_hook(Arc::new(SlowHook {
            log: Arc::clone(&log),
        }))
        .unwrap();

    let provider = registry.create_provider("spy", &ProviderConfig::default()).unwrap();
    provider.start(&CancellationToken::new()).await.unwrap();
    log.lock().clear();

    let started = std::time::Instant::now();
    assert_eq!(provider.translate("k", "en", &Params::new()).await.unwrap(), "en:k");
    assert!(started.elapsed() < Duration::from_millis(100));

    wait_for_log(&log, 1).await;
    assert_eq!(*log.lock(), vec!["slow:translate"]);
}

#[tokio::test]
async fn test_last_middleware_is_outermost() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry.register_provider(spy_factory("spy")).unwrap();
    registry.add_middleware(recording_middleware(&log, "A")).unwrap();
    registry.add_middleware(recording_middleware(&log, "B")).unwrap();

    let provider = registry.create_provider("spy", &ProviderConfig::default()).unwrap();
    provider.start(&CancellationToken::new()).await.unwrap();
    log.lock().clear();

    let value = provider.translate_plural("k", "en", 2, &Params::new()).await.unwrap();
    assert_eq!(value, "en:k#2");
    assert_eq!(*log.lock(), vec!["B:wrap", "A:wrap"]);
}

#[tokio::test]
async fn test_hooks_see_only_successful_translations() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry.register_provider(spy_factory("spy")).unwrap();
    registry.add_hook(recording_hook(&log, "audit", 0)).unwrap();

    let provider = registry.create_provider("spy", &ProviderConfig::default()).unwrap();
    assert!(provider.translate("k", "en", &Params::new()).await.is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_failing_hooks_are_swallowed() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry.register_provider(spy_factory("spy")).unwrap();
    registry
        .add_hook(Arc::new(FnHook::new("broken", 0, |_: &ProviderEvent| {
            Err(I18nError::Load("hook down".into()))
        })))
        .unwrap();
    registry.add_hook(recording_hook(&log, "after", 1)).unwrap();

    let provider = registry.create_provider("spy", &ProviderConfig::default()).unwrap();
    provider.start(&CancellationToken::new()).await.unwrap();
    assert_eq!(provider.translate("k", "en", &Params::new()).await.unwrap(), "en:k");
    wait_for_log(&log, 2).await;
    provider.stop(&CancellationToken::new()).await.unwrap();

    assert_eq!(*log.lock(), vec!["after:start", "after:translate", "after:stop"]);
}

#[tokio::test]
async fn test_middleware_can_veto_start() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry.register_provider(spy_factory("spy")).unwrap();
    registry.add_hook(recording_hook(&log, "hook", 0)).unwrap();
    registry
        .add_middleware(Arc::new(Recording {
            name: "gate",
            log: Arc::clone(&log),
            veto_start: true,
        }))
        .unwrap();

    let provider = registry.create_provider("spy", &ProviderConfig::default()).unwrap();
    let err = provider.start(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, I18nError::Middleware { .. }));
    assert_eq!(provider.state(), ProviderState::Created);
    assert_eq!(*log.lock(), vec!["gate:start"]);
}

#[tokio::test]
async fn test_start_failure_notifies_error() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry
        .register_provider(Arc::new(SpyFactory {
            name: "broken",
            fail_start: true,
            ..Default::default()
        }))
        .unwrap();
    registry.add_hook(recording_hook(&log, "hook", 0)).unwrap();
    registry.add_middleware(recording_middleware(&log, "mw")).unwrap();

    let provider = registry.create_provider("broken", &ProviderConfig::default()).unwrap();
    assert!(provider.start(&CancellationToken::new()).await.is_err());
    assert_eq!(provider.state(), ProviderState::Failed);
    assert_eq!(*log.lock(), vec!["mw:start", "hook:error", "mw:error"]);
}

#[tokio::test]
async fn test_stop_notifies_even_on_failure() {
    let log: Log = Arc::default();
    let registry = Registry::new();
    registry
        .register_provider(Arc::new(SpyFactory {
            name: "sticky",
            fail_stop: true,
            ..Default::default()
        }))
        .unwrap();
    registry.add_hook(recording_hook(&log, "hook", 0)).unwrap();
    registry.add_middleware(recording_middleware(&log, "mw")).unwrap();

    let provider = registry.create_provider("sticky", &ProviderConfig::default()).unwrap();
    assert!(provider.stop(&CancellationToken::new()).await.is_err());
    assert_eq!(*log.lock(), vec!["hook:stop", "mw:stop", "hook:error", "mw:error"]);
}

#[tokio::test]
async fn test_shutdown_aggregates_errors() {
    let registry = Registry::new();
    registry.register_provider(spy_factory("ok")).unwrap();
    for name in ["bad1", "bad2"] {
        registry
            .register_provider(Arc::new(SpyFactory {
                name,
                fail_stop: true,
                ..Default::default()
            }))
            .unwrap();
    }

    let ok = registry.create_provider("ok", &ProviderConfig::default()).unwrap();
    registry.create_provider("bad1", &ProviderConfig::default()).unwrap();
    registry.create_provider("bad2", &ProviderConfig::default()).unwrap();
    assert_eq!(registry.instance_count(), 3);

    let err = registry.shutdown(&CancellationToken::new()).await.unwrap_err();
    match err {
        I18nError::Aggregate(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected aggregate error, got {}", other),
    }
    assert_eq!(registry.instance_count(), 0);
    assert_eq!(ok.state(), ProviderState::Stopped);

    // Nothing left to stop.
    assert!(registry.shutdown(&CancellationToken::new()).await.is_ok());
}

#[tokio::test]
async fn test_stopped_provider_rejects_translations() {
    let source = Arc::new(MemorySource::new().with_file("en.json", r#"{ "k": "v {{x}}" }"#));
    let registry = Registry::new();
    registry
        .register_provider(Arc::new(DocumentProviderFactory::new().with_source(source)))
        .unwrap();

    let config = ProviderConfig::default().with_cache(CacheConfig::default());
    let provider = registry.create_provider("document", &config).unwrap();
    let cancel = CancellationToken::new();
    let p = params([("x", json!(1))]);

    assert!(matches!(
        provider.translate("k", "en", &p).await,
        Err(I18nError::NotStarted(_))
    ));
    provider.start(&cancel).await.unwrap();
    assert_eq!(provider.translate("k", "en", &p).await.unwrap(), "v 1");

    registry.shutdown(&cancel).await.unwrap();
    assert!(matches!(
        provider.translate("k", "en", &p).await,
        Err(I18nError::NotStarted(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_start_timeout_leaves_provider_unstarted() {
    let config = ProviderConfig::new("en").with_load_timeout(Duration::from_millis(100));

    struct Stalled;

    #[async_trait]
    impl polyglot_i18n::DocumentSource for Stalled {
        async fn read(&self, _path: &str) -> Result<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(b"{}".to_vec())
        }
    }

    let registry = Registry::new();
    registry
        .register_provider(Arc::new(DocumentProviderFactory::new().with_source(Arc::new(Stalled))))
        .unwrap();
    let provider = registry.create_provider("document", &config).unwrap();

    let err = provider.start(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, I18nError::Timeout(_)));
    assert_ne!(provider.state(), ProviderState::Started);
    assert!(provider.health().await.is_err());
}
