//! Serialized access to the single recognition engine.
//!
//! The engine lives behind one async mutex. Tokio's mutex hands out the lock
//! in request order, so waiting callers are served FIFO, and the engine call
//! itself runs on a blocking worker while the guard is held. Callers beyond
//! `max_pending`, or that wait longer than `queue_timeout`, get
//! [`RecognitionError::Busy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};
use tokio::task;
use tracing::{debug, error, info, warn};

use ocrgate_core::{
    AssetSource, DecodedImage, Mode, RecognitionEngine, RecognitionError, RecognitionResult,
};

type EngineSlot = Arc<Mutex<Box<dyn RecognitionEngine>>>;

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Longest a request may wait for the engine before it is answered `Busy`.
    pub queue_timeout: Duration,
    /// Requests allowed to be waiting for or inside the engine at once.
    pub max_pending: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_timeout: Duration::from_secs(30),
            max_pending: 16,
        }
    }
}

/// Owner of the engine and its readiness flag. Cheap to clone.
#[derive(Clone)]
pub struct InferenceDispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    engine: EngineSlot,
    engine_name: String,
    ready: AtomicBool,
    closing: AtomicBool,
    pending: Arc<Semaphore>,
    settings: DispatchSettings,
}

impl InferenceDispatcher {
    pub fn new(engine: Box<dyn RecognitionEngine>, settings: DispatchSettings) -> Self {
        let engine_name = engine.name().to_string();
        Self {
            inner: Arc::new(Inner {
                engine: Arc::new(Mutex::new(engine)),
                engine_name,
                ready: AtomicBool::new(false),
                closing: AtomicBool::new(false),
                pending: Arc::new(Semaphore::new(settings.max_pending.max(1))),
                settings,
            }),
        }
    }

    pub fn engine_name(&self) -> &str {
        &self.inner.engine_name
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    pub fn is_closing(&self) -> bool {
        self.inner.closing.load(Ordering::Acquire)
    }

    /// Accept work again after a previous shutdown.
    pub fn reopen(&self) {
        self.inner.closing.store(false, Ordering::Release);
    }

    /// Refuse new work. Calls already holding the engine run to completion.
    pub fn begin_shutdown(&self) {
        self.inner.closing.store(true, Ordering::Release);
    }

    /// Load the engine's models on a blocking worker.
    ///
    /// Readiness is only raised on success and only while the dispatcher is
    /// open, so an initialization that outlives a shutdown cannot revive it.
    /// The closing check and the readiness store happen under the engine
    /// lock, which `release` also takes before unloading.
    pub async fn initialize(&self, assets: AssetSource) -> bool {
        let started = Instant::now();
        let slot = Arc::clone(&self.inner.engine);
        let mut engine = slot.lock_owned().await;

        let outcome = task::spawn_blocking(move || {
            let ok = engine.initialize(&assets);
            (ok, engine)
        })
        .await;

        let (ok, engine) = match outcome {
            Ok((ok, engine)) => (ok, Some(engine)),
            Err(e) => {
                error!(engine = %self.inner.engine_name, error = %e, "Engine initialization panicked");
                (false, None)
            }
        };

        let raised = ok && !self.is_closing();
        if raised {
            self.inner.ready.store(true, Ordering::Release);
        }
        drop(engine);

        if raised {
            info!(
                engine = %self.inner.engine_name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Recognition engine ready"
            );
        } else if !ok {
            error!(engine = %self.inner.engine_name, "Recognition engine failed to initialize; serving 503 until restart");
        }
        ok
    }

    /// Run one recognition. The image is dropped before this returns, on
    /// every path.
    pub async fn submit(
        &self,
        image: DecodedImage,
        mode: Mode,
    ) -> Result<RecognitionResult, RecognitionError> {
        if self.is_closing() || !self.is_ready() {
            return Err(RecognitionError::EngineNotReady);
        }

        let Ok(permit) = Arc::clone(&self.inner.pending).try_acquire_owned() else {
            warn!("Inference queue full");
            return Err(RecognitionError::Busy);
        };

        let queued = Instant::now();
        let slot = Arc::clone(&self.inner.engine);
        let mut engine =
            match tokio::time::timeout(self.inner.settings.queue_timeout, slot.lock_owned()).await
            {
                Ok(guard) => guard,
                Err(_) => {
                    warn!(
                        waited_ms = queued.elapsed().as_millis() as u64,
                        "Timed out waiting for the recognition engine"
                    );
                    return Err(RecognitionError::Busy);
                }
            };

        if self.is_closing() || !self.is_ready() {
            return Err(RecognitionError::EngineNotReady);
        }
        debug!(waited_ms = queued.elapsed().as_millis() as u64, mode = mode.code(), "Engine acquired");

        let outcome = task::spawn_blocking(move || {
            let result = engine.infer(&image, mode);
            drop(image);
            drop(engine);
            result
        })
        .await;
        drop(permit);

        match outcome {
            Ok(result) => result.map_err(RecognitionError::from),
            Err(e) => {
                error!(engine = %self.inner.engine_name, error = %e, "Engine call panicked");
                Err(RecognitionError::Inference("engine call aborted".into()))
            }
        }
    }

    /// Release the engine's models and clear readiness.
    ///
    /// Waits up to `grace` for a call that still holds the engine; after that
    /// the release is abandoned and the call is left to finish on its own.
    pub async fn release(&self, grace: Duration) {
        self.begin_shutdown();
        self.inner.ready.store(false, Ordering::Release);

        let slot = Arc::clone(&self.inner.engine);
        let mut engine = match tokio::time::timeout(grace, slot.lock_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "Engine still busy; skipping release");
                return;
            }
        };
        // An initialization that held the lock before `closing` was set may
        // have raised readiness in the meantime.
        self.inner.ready.store(false, Ordering::Release);

        let released = task::spawn_blocking(move || engine.release()).await;
        if let Err(e) = released {
            error!(error = %e, "Engine release panicked");
        }
        info!(engine = %self.inner.engine_name, "Recognition engine released");
    }
}
