//! Concurrent batch translation.
//!
//! A fixed pool of worker tasks pulls `(index, request)` jobs from one shared
//! channel and reports `(index, response)` pairs back, so responses come out
//! in request order whatever order workers finish in. Keys and languages are
//! interned, so a batch repeating the same few strings shares one allocation
//! per distinct value. The interner is cleared before a batch once it holds
//! more than [`DEFAULT_INTERNER_LIMIT`] strings (see
//! [`BatchTranslator::with_interner_limit`]).

use crate::config::ProviderConfig;
use crate::intern::StringInterner;
use crate::interpolate::Params;
use crate::provider::Provider;
use crate::{I18nError, Result};
use futures::FutureExt;
use polyglot_log::{debug, trace, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Interned strings kept across batches before the interner is cleared.
pub const DEFAULT_INTERNER_LIMIT: usize = 10_000;

/// One translation in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub key: String,
    pub language: String,
    pub params: Params,
    /// Resolve a plural variant for this count
    pub count: Option<i64>,
}

impl BatchRequest {
    /// Request `key` in `language` without parameters.
    pub fn new(key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            language: language.into(),
            params: Params::new(),
            count: None,
        }
    }

    /// Set interpolation parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Resolve the plural variant for `count`.
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Outcome of one batch item.
#[derive(Debug)]
pub struct BatchResponse {
    /// Interned request key
    pub key: Arc<str>,
    /// Interned request language
    pub language: Arc<str>,
    /// Translation; empty when `error` is set
    pub value: String,
    pub error: Option<I18nError>,
}

impl BatchResponse {
    /// Whether the item translated successfully.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into the item's result.
    pub fn into_result(self) -> Result<String> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

/// Translates many requests concurrently through one provider.
pub struct BatchTranslator {
    provider: Arc<dyn Provider>,
    workers: usize,
    interner: Arc<StringInterner>,
    interner_limit: usize,
}

impl BatchTranslator {
    /// Create a translator running up to `workers` concurrent lookups.
    pub fn new(provider: Arc<dyn Provider>, workers: usize) -> Self {
        Self {
            provider,
            workers: workers.max(1),
            interner: Arc::new(StringInterner::new()),
            interner_limit: DEFAULT_INTERNER_LIMIT,
        }
    }

    /// Create a translator sized by `config.workers`.
    pub fn from_config(provider: Arc<dyn Provider>, config: &ProviderConfig) -> Self {
        Self::new(provider, config.workers)
    }

    /// Share an interner with other translators.
    pub fn with_interner(mut self, interner: Arc<StringInterner>) -> Self {
        self.interner = interner;
        self
    }

    /// Clear the interner before a batch once it holds more than `limit`
    /// strings. Responses already handed out keep their strings alive.
    pub fn with_interner_limit(mut self, limit: usize) -> Self {
        self.interner_limit = limit;
        self
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The interner keys and languages go through.
    pub fn interner(&self) -> &Arc<StringInterner> {
        &self.interner
    }

    /// Translate `requests`, returning one response per request in the same
    /// order.
    ///
    /// Item failures are reported in that item's response. The whole call
    /// fails only when `cancel` fires before every item is done; work already
    /// finished, such as cache writes, is kept.
    pub async fn translate_batch(
        &self,
        cancel: &CancellationToken,
        requests: Vec<BatchRequest>,
    ) -> Result<Vec<BatchResponse>> {
        let total = requests.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(I18nError::Cancelled);
        }

        if self.interner.len() > self.interner_limit {
            debug!("Clearing interner holding {} strings", self.interner.len());
            self.interner.clear();
        }

        let workers = self.workers.min(total);
        debug!("Translating batch of {} on {} workers", total, workers);

        let (job_tx, job_rx) = mpsc::channel::<(usize, BatchRequest)>(workers);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<(usize, BatchResponse)>(workers);

        // Dropping the set aborts whatever is still running.
        let mut tasks = JoinSet::new();

        for id in 0..workers {
            tasks.spawn(worker(
                id,
                Arc::clone(&self.provider),
                Arc::clone(&self.interner),
                Arc::clone(&job_rx),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        tasks.spawn(async move {
            for job in requests.into_iter().enumerate() {
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        let mut slots: Vec<Option<BatchResponse>> = (0..total).map(|_| None).collect();
        let mut received = 0;

        while received < total {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Batch cancelled after {} of {} items", received, total);
                    tasks.abort_all();
                    return Err(I18nError::Cancelled);
                }
                next = result_rx.recv() => match next {
                    Some((idx, response)) => {
                        slots[idx] = Some(response);
                        received += 1;
                    }
                    None => break,
                },
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| I18nError::Load("batch worker exited before finishing".into()))
    }
}

async fn worker(
    id: usize,
    provider: Arc<dyn Provider>,
    interner: Arc<StringInterner>,
    jobs: Arc<Mutex<mpsc::Receiver<(usize, BatchRequest)>>>,
    results: mpsc::Sender<(usize, BatchResponse)>,
) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some((idx, request)) = job else {
            break;
        };

        trace!("Batch worker {} took item {}", id, idx);
        let response = translate_one(provider.as_ref(), &interner, request).await;
        if results.send((idx, response)).await.is_err() {
            break;
        }
    }
}

async fn translate_one(
    provider: &dyn Provider,
    interner: &StringInterner,
    request: BatchRequest,
) -> BatchResponse {
    let key = interner.intern(&request.key);
    let language = interner.intern(&request.language);

    let call = async {
        match request.count {
            Some(count) => {
                provider
                    .translate_plural(&key, &language, count, &request.params)
                    .await
            }
            None => provider.translate(&key, &language, &request.params).await,
        }
    };
    let result = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("Provider panicked translating {} ({}): {}", key, language, message);
            Err(I18nError::Panicked(message))
        }
    };

    match result {
        Ok(value) => BatchResponse {
            key,
            language,
            value,
            error: None,
        },
        Err(e) => BatchResponse {
            key,
            language,
            value: String::new(),
            error: Some(e),
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
