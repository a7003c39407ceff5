//! Executes screen effects off the interactive loop.
//!
//! Each effect runs on the tokio runtime racing its attempt's cancellation
//! token and a deadline. Results come back over a channel as messages; an
//! aborted attempt sends nothing.

use std::future::Future;
use std::time::Duration;

use jjin_core::NetworkError;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::ui_state::Attempt;

pub struct EffectRunner<M> {
    tx: UnboundedSender<M>,
    deadline: Duration,
}

impl<M: Send + 'static> EffectRunner<M> {
    pub fn new(tx: UnboundedSender<M>, deadline: Duration) -> Self {
        Self { tx, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `effect` for `attempt`, delivering `wrap(seq, result)` when it
    /// finishes or times out. Must be called from within a tokio runtime.
    pub fn spawn<T, F, W>(&self, attempt: Attempt, effect: F, wrap: W) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, String>> + Send + 'static,
        W: FnOnce(u64, Result<T, String>) -> M + Send + 'static,
    {
        self.spawn_with_deadline(attempt, self.deadline, effect, wrap)
    }

    /// Same as [`spawn`](Self::spawn) with an explicit deadline.
    pub fn spawn_with_deadline<T, F, W>(
        &self,
        attempt: Attempt,
        deadline: Duration,
        effect: F,
        wrap: W,
    ) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, String>> + Send + 'static,
        W: FnOnce(u64, Result<T, String>) -> M + Send + 'static,
    {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let Attempt { seq, cancel } = attempt;

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(seq, "Attempt aborted");
                    return;
                }
                outcome = tokio::time::timeout(deadline, effect) => match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(seq, "Attempt timed out after {:?}", deadline);
                        Err(NetworkError::Timeout.user_message().to_string())
                    }
                },
            };

            if tx.send(wrap(seq, result)).is_err() {
                tracing::debug!(seq, "UI channel closed, dropping result");
            }
        })
    }
}
