//! Per-worker predictor instances.
//!
//! Matchers keep mutable scratch buffers, so a single instance must never be
//! used by two threads at once. Each live thread gets its own instance, built
//! lazily from the factory the first time that thread asks for one and reused
//! for every later task on the same thread. Once a thread exits its instance
//! may be handed to a thread started later, but never to two live threads.

use std::cell::RefCell;
use std::sync::Arc;

use thread_local::ThreadLocal;

use super::{PromoterPredictor, Sigma70Matcher};

/// Builds a fresh predictor for a worker.
pub type PredictorFactory = Arc<dyn Fn() -> Box<dyn PromoterPredictor> + Send + Sync>;

/// Factory for the default sigma70 matcher at the given confidence.
pub fn sigma70_factory(confidence: f64) -> PredictorFactory {
    Arc::new(move || Box::new(Sigma70Matcher::new(confidence)) as Box<dyn PromoterPredictor>)
}

pub struct PredictorPool {
    factory: PredictorFactory,
    instances: ThreadLocal<RefCell<Box<dyn PromoterPredictor>>>,
}

impl PredictorPool {
    pub fn new(factory: PredictorFactory) -> Self {
        Self {
            factory,
            instances: ThreadLocal::new(),
        }
    }

    /// Run `f` with the calling thread's predictor.
    pub fn with_predictor<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut dyn PromoterPredictor) -> R,
    {
        let cell = self.instances.get_or(|| {
            log::trace!(
                "Creating predictor for worker {:?}",
                std::thread::current().name().unwrap_or("unnamed")
            );
            RefCell::new((self.factory)())
        });
        let mut predictor = cell.borrow_mut();
        f(predictor.as_mut())
    }

    /// Number of instances built so far. This can be lower than the number of
    /// threads that ever used the pool, since exited threads' instances are
    /// reused.
    pub fn instances_created(&mut self) -> usize {
        self.instances.iter_mut().count()
    }
}

impl std::fmt::Debug for PredictorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorPool").finish_non_exhaustive()
    }
}
