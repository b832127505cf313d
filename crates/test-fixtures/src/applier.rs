use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use stride_core::errors::ApplyError;
use stride_core::traits::{Mutation, RemoteApplier};

/// What a single `apply` call does.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok,
    Fail(ApplyError),
    /// Never completes; the caller's timeout has to fire.
    Hang,
}

/// Replays queued outcomes, then falls back to a default outcome.
/// Every call is recorded as `(idempotency_key, mutation)`.
#[derive(Debug)]
pub struct ScriptedApplier<M> {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Mutex<Outcome>,
    calls: Mutex<Vec<(String, M)>>,
}

impl<M: Mutation + Clone> ScriptedApplier<M> {
    pub fn with_fallback(fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::with_fallback(Outcome::Ok)
    }

    pub fn always_fail(error: ApplyError) -> Self {
        Self::with_fallback(Outcome::Fail(error))
    }

    pub fn always_hang() -> Self {
        Self::with_fallback(Outcome::Hang)
    }

    /// Queue outcomes for the next calls, in order.
    pub fn push(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().unwrap().extend(outcomes);
    }

    pub fn set_fallback(&self, outcome: Outcome) {
        *self.fallback.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> Vec<(String, M)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Idempotency keys of every call, in call order.
    pub fn keys(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }

    fn next_outcome(&self) -> Outcome {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

#[async_trait]
impl<M: Mutation + Clone> RemoteApplier<M> for ScriptedApplier<M> {
    async fn apply(&self, idempotency_key: &str, mutation: &M) -> Result<(), ApplyError> {
        self.calls
            .lock()
            .unwrap()
            .push((idempotency_key.to_string(), mutation.clone()));
        match self.next_outcome() {
            Outcome::Ok => Ok(()),
            Outcome::Fail(e) => Err(e),
            Outcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}
