use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a guarded future did not run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    TimedOut(Duration),
}

#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Races the future against `token`; the future is dropped if the token fires first.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Interrupted>;

    /// Like [`OrCancelExt::or_cancel`] but also gives up after `limit`.
    async fn or_cancel_within(
        self,
        token: &CancellationToken,
        limit: Duration,
    ) -> Result<Self::Output, Interrupted>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Interrupted> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Interrupted::Cancelled),
            res = self => Ok(res),
        }
    }

    async fn or_cancel_within(
        self,
        token: &CancellationToken,
        limit: Duration,
    ) -> Result<Self::Output, Interrupted> {
        match tokio::time::timeout(limit, self.or_cancel(token)).await {
            Ok(res) => res,
            Err(_) => Err(Interrupted::TimedOut(limit)),
        }
    }
}
