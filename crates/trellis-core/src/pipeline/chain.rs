//! Interceptor chain execution with continuation-passing semantics.
//!
//! The concatenated interceptor sequence of a pipeline is driven as a chain
//! of [`Next`] frames. Each interceptor receives the call and a `Next`; code
//! before `next.proceed(call).await` runs on the way *down* the chain, code
//! after it runs on the way back *up*, once everything downstream has
//! finished. Dropping the `Next` without proceeding short-circuits the chain:
//! the call is considered handled as of its current state.
//!
//! Errors are not a side channel. A failing downstream interceptor surfaces
//! as the `Err` return of `proceed` in every upstream frame that already
//! proceeded, so each of them may log, transform, or swallow it before the
//! engine sees it.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::call::BoxedCall;
use crate::error::BoxError;

/// A unit of behavior attached to a phase.
///
/// Interceptors are stored type-erased and shared; the closure receives the
/// call and the continuation for the remainder of the chain.
pub type Interceptor =
    Arc<dyn Fn(BoxedCall, Next) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// The continuation handle for the remainder of an interceptor chain.
///
/// `proceed` consumes the handle, so each interceptor frame can drive the
/// remainder at most once. An interceptor that never proceeds ends the chain
/// at its position.
pub struct Next {
    chain: Arc<[Interceptor]>,
    index: usize,
}

impl Next {
    /// Entry frame for a freshly concatenated chain.
    pub(crate) fn new(chain: Arc<[Interceptor]>) -> Self {
        Self { chain, index: 0 }
    }

    /// Runs the remainder of the chain to completion.
    ///
    /// Returns once everything downstream has finished — successfully, by
    /// short-circuit, or with an error. This is the chain's only suspension
    /// point; awaiting it does not affect other in-flight calls.
    pub async fn proceed(self, call: BoxedCall) -> Result<(), BoxError> {
        let Some(interceptor) = self.chain.get(self.index) else {
            return Ok(());
        };
        let interceptor = Arc::clone(interceptor);
        let next = Next {
            chain: self.chain,
            index: self.index + 1,
        };
        interceptor(call, next).await
    }
}
