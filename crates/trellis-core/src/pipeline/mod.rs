//! The phased interception pipeline.
//!
//! A [`Pipeline`] is a [`PhaseGraph`] plus an execution engine. Features
//! mutate the graph while the application is being assembled — inserting
//! phases relative to the well-known ones and appending interceptors — and
//! every incoming call is then driven through the concatenated chain with
//! continuation-passing ("proceed") semantics.
//!
//! Graph mutation is not synchronized against concurrent execution: the host
//! is responsible for finishing installation before traffic begins. The
//! `RwLock` here keeps the shared handle usable from `&self`, it is not a
//! license to reconfigure a live pipeline.

pub mod chain;
pub mod phase;

pub use chain::{Interceptor, Next};
pub use phase::{Phase, PhaseGraph};

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, span};

use crate::call::BoxedCall;
use crate::error::{BoxError, PipelineError};

/// A phased interceptor pipeline for one application.
#[derive(Default)]
pub struct Pipeline {
    graph: RwLock<PhaseGraph>,
}

impl Pipeline {
    /// Creates a pipeline with no phases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a phase at the end of the sequence.
    pub fn register_phase(&self, name: impl Into<String>) -> Result<(), PipelineError> {
        self.graph.write().register(name)
    }

    /// Inserts a new phase before an existing one.
    pub fn insert_phase_before(
        &self,
        existing: &str,
        new: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.graph.write().insert_before(existing, new)
    }

    /// Inserts a new phase after an existing one.
    pub fn insert_phase_after(
        &self,
        existing: &str,
        new: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.graph.write().insert_after(existing, new)
    }

    /// Appends an interceptor to the named phase.
    pub fn intercept(&self, phase: &str, interceptor: Interceptor) -> Result<(), PipelineError> {
        self.graph.write().intercept(phase, interceptor)
    }

    /// Returns `true` if the named phase exists.
    pub fn has_phase(&self, name: &str) -> bool {
        self.graph.read().contains(name)
    }

    /// Phase names in execution order.
    pub fn phase_names(&self) -> Vec<String> {
        self.graph.read().phase_names()
    }

    /// Total number of installed interceptors across all phases.
    pub fn interceptor_count(&self) -> usize {
        self.graph.read().concatenate().len()
    }

    /// Drives a call through the concatenated interceptor chain.
    ///
    /// The chain runs at most once per call: a second `execute` of the same
    /// call fails with [`PipelineError::CallAlreadyExecuted`] without running
    /// anything. An error no interceptor recovered is returned to the caller
    /// and the call is marked finished-with-error; the engine itself never
    /// swallows it.
    pub async fn execute(&self, call: BoxedCall) -> Result<(), BoxError> {
        if !call.state().try_begin() {
            return Err(PipelineError::CallAlreadyExecuted.into());
        }

        let chain: Arc<[Interceptor]> = {
            let graph = self.graph.read();
            graph.concatenate().into()
        };

        let span = span!(Level::DEBUG, "call", method = %call.method(), path = %call.path());
        let _enter = span.enter();

        let result = Next::new(chain).proceed(Arc::clone(&call)).await;
        if result.is_err() {
            call.state().mark_failed();
        }
        result
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("phases", &self.graph.read().phase_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::call::{Call, CallState, StatusCode};

    struct ProbeCall {
        state: CallState,
    }

    impl ProbeCall {
        fn boxed() -> BoxedCall {
            Arc::new(ProbeCall {
                state: CallState::new(),
            })
        }
    }

    impl Call for ProbeCall {
        fn method(&self) -> &str {
            "GET"
        }

        fn path(&self) -> &str {
            "/probe"
        }

        fn status(&self) -> Option<StatusCode> {
            None
        }

        fn header(&self, _name: &str) -> Option<String> {
            None
        }

        fn state(&self) -> &CallState {
            &self.state
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn tagging(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Interceptor {
        let log = Arc::clone(log);
        Arc::new(move |call, next| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push(tag);
                next.proceed(call).await
            })
        })
    }

    #[tokio::test]
    async fn execution_follows_phase_order() {
        let pipeline = Pipeline::new();
        pipeline.register_phase("infrastructure").unwrap();
        pipeline.insert_phase_before("infrastructure", "logging").unwrap();
        pipeline.register_phase("call").unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline.intercept("call", tagging(&log, "call")).unwrap();
        pipeline.intercept("logging", tagging(&log, "logging")).unwrap();
        pipeline
            .intercept("infrastructure", tagging(&log, "infra"))
            .unwrap();

        pipeline.execute(ProbeCall::boxed()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["logging", "infra", "call"]);
    }

    #[tokio::test]
    async fn a_call_executes_at_most_once() {
        let pipeline = Pipeline::new();
        pipeline.register_phase("call").unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&counter);
            pipeline
                .intercept(
                    "call",
                    Arc::new(move |call, next| {
                        let counter = Arc::clone(&counter);
                        Box::pin(async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            next.proceed(call).await
                        })
                    }),
                )
                .unwrap();
        }

        let call = ProbeCall::boxed();
        pipeline.execute(Arc::clone(&call)).await.unwrap();
        let again = pipeline.execute(call).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let err = again.unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::CallAlreadyExecuted)
        );
    }

    #[tokio::test]
    async fn short_circuit_affects_only_its_own_call() {
        let pipeline = Arc::new(Pipeline::new());
        pipeline.register_phase("gate").unwrap();
        pipeline.register_phase("call").unwrap();

        // Short-circuits /probe by never proceeding; everything else passes.
        pipeline
            .intercept(
                "gate",
                Arc::new(|call, next| {
                    Box::pin(async move {
                        if call.path() == "/probe" {
                            return Ok(());
                        }
                        next.proceed(call).await
                    })
                }),
            )
            .unwrap();

        let reached = Arc::new(AtomicUsize::new(0));
        {
            let reached = Arc::clone(&reached);
            pipeline
                .intercept(
                    "call",
                    Arc::new(move |call, next| {
                        let reached = Arc::clone(&reached);
                        Box::pin(async move {
                            reached.fetch_add(1, Ordering::SeqCst);
                            next.proceed(call).await
                        })
                    }),
                )
                .unwrap();
        }

        struct OtherCall {
            state: CallState,
        }
        impl Call for OtherCall {
            fn method(&self) -> &str {
                "GET"
            }
            fn path(&self) -> &str {
                "/other"
            }
            fn status(&self) -> Option<StatusCode> {
                None
            }
            fn header(&self, _name: &str) -> Option<String> {
                None
            }
            fn state(&self) -> &CallState {
                &self.state
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let blocked = ProbeCall::boxed();
        let passed: BoxedCall = Arc::new(OtherCall {
            state: CallState::new(),
        });

        let (a, b) = tokio::join!(
            pipeline.execute(blocked),
            pipeline.execute(passed)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unhandled_error_marks_the_call_failed() {
        let pipeline = Pipeline::new();
        pipeline.register_phase("call").unwrap();
        pipeline
            .intercept(
                "call",
                Arc::new(|_call, _next| Box::pin(async { Err::<(), BoxError>("boom".into()) })),
            )
            .unwrap();

        let call = ProbeCall::boxed();
        let result = pipeline.execute(Arc::clone(&call)).await;

        assert!(result.is_err());
        assert!(call.state().is_failed());
    }
}
