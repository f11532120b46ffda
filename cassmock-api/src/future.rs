/// Handle returned by [`Session::execute_async`](crate::Session::execute_async)
///
/// Execution has already finished by the time the handle exists, so the
/// future is ready on first poll.

use crate::ResultSet;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone)]
pub struct ResponseFuture {
    result: ResultSet,
}

impl ResponseFuture {
    pub(crate) fn resolved(result: ResultSet) -> Self {
        Self { result }
    }

    /// Materialized rows
    pub fn result(&self) -> ResultSet {
        self.result.clone()
    }

    /// Always true
    pub fn is_done(&self) -> bool {
        true
    }

    /// Run `callback` with the rows; if it fails, hand the error to `errback`
    pub fn add_callbacks<F, E>(&self, callback: F, errback: E)
    where
        F: FnOnce(&ResultSet) -> anyhow::Result<()>,
        E: FnOnce(anyhow::Error),
    {
        if let Err(err) = callback(&self.result) {
            tracing::debug!(error = %err, "result callback failed, invoking errback");
            errback(err);
        }
    }
}

impl Future for ResponseFuture {
    type Output = ResultSet;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready(std::mem::take(&mut self.get_mut().result))
    }
}
