//! Application lifecycle event bus.
//!
//! Four ordered subscriber lists — one per lifecycle transition — on which
//! features register callbacks at install time and clean themselves up at
//! shutdown. Subscribing returns an opaque [`Subscription`] handle;
//! unsubscription takes the handle back, never the original closure, so
//! there is no closure-equality pitfall.
//!
//! Firing iterates over a snapshot taken under the lock: a handler may
//! unsubscribe itself (or any other handler) while its slot is firing
//! without corrupting iteration. The removal takes effect from the next
//! transition onward; siblings in the current firing still run exactly once.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::application::Application;

/// One of the four application lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    Starting,
    Started,
    Stopping,
    Stopped,
}

impl LifecycleStage {
    /// All stages in transition order.
    pub const ALL: [LifecycleStage; 4] = [
        LifecycleStage::Starting,
        LifecycleStage::Started,
        LifecycleStage::Stopping,
        LifecycleStage::Stopped,
    ];

    fn index(self) -> usize {
        match self {
            LifecycleStage::Starting => 0,
            LifecycleStage::Started => 1,
            LifecycleStage::Stopping => 2,
            LifecycleStage::Stopped => 3,
        }
    }

    /// Lower-case stage name, as used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStage::Starting => "starting",
            LifecycleStage::Started => "started",
            LifecycleStage::Stopping => "stopping",
            LifecycleStage::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle returned by [`LifecycleEvents::subscribe`].
///
/// The handle records which slot it belongs to, so unsubscription needs
/// nothing besides the handle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    stage: LifecycleStage,
    id: u64,
}

impl Subscription {
    /// The stage this subscription is attached to.
    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }
}

type Handler = std::sync::Arc<dyn Fn(&Application) + Send + Sync>;

/// The per-application lifecycle event bus.
pub struct LifecycleEvents {
    slots: [Mutex<Vec<(u64, Handler)>>; 4],
    next_id: AtomicU64,
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self {
            slots: [const { Mutex::new(Vec::new()) }; 4],
            next_id: AtomicU64::new(0),
        }
    }
}

impl LifecycleEvents {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the given stage's subscriber list.
    ///
    /// Handlers fire in subscription order, synchronously, each completing
    /// before the next begins.
    pub fn subscribe(
        &self,
        stage: LifecycleStage,
        handler: impl Fn(&Application) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots[stage.index()]
            .lock()
            .push((id, std::sync::Arc::new(handler)));
        debug!(stage = %stage, id, "Lifecycle handler subscribed");
        Subscription { stage, id }
    }

    /// Removes the handler behind `subscription`.
    ///
    /// Returns `false` if it was already removed. Safe to call from inside a
    /// firing handler; the removal applies from the next transition onward.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut slot = self.slots[subscription.stage.index()].lock();
        let before = slot.len();
        slot.retain(|(id, _)| *id != subscription.id);
        let removed = slot.len() < before;
        if removed {
            debug!(stage = %subscription.stage, id = subscription.id, "Lifecycle handler unsubscribed");
        }
        removed
    }

    /// Number of handlers currently subscribed to a stage.
    pub fn subscriber_count(&self, stage: LifecycleStage) -> usize {
        self.slots[stage.index()].lock().len()
    }

    /// Fires every handler subscribed to `stage`, in subscription order.
    ///
    /// Iterates a snapshot: handlers added or removed during the firing
    /// affect later transitions, not this one.
    pub(crate) fn fire(&self, stage: LifecycleStage, application: &Application) {
        let snapshot: Vec<Handler> = self.slots[stage.index()]
            .lock()
            .iter()
            .map(|(_, handler)| std::sync::Arc::clone(handler))
            .collect();
        debug!(stage = %stage, handlers = snapshot.len(), application = %application, "Firing lifecycle stage");
        for handler in snapshot {
            handler(application);
        }
    }
}

impl std::fmt::Debug for LifecycleEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts = f.debug_struct("LifecycleEvents");
        for stage in LifecycleStage::ALL {
            counts.field(stage.as_str(), &self.subscriber_count(stage));
        }
        counts.finish()
    }
}
