//! Publish/subscribe bus with a cancelable pre-event phase

use crate::Result;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Which half of the two-phase emission a subscription listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fired before the host's default processing; may be canceled
    Pre,
    /// Fired after default processing; never cancelable
    Final,
}

/// Outcome of a pre-event emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Run the host's default processing
    #[default]
    Proceed,
    /// A subscriber asked the host to skip its default processing
    Cancel,
}

impl Verdict {
    pub fn is_canceled(self) -> bool {
        self == Verdict::Cancel
    }
}

/// Result returned synchronously to the emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmissionResult {
    /// At least one handler was invoked
    pub ran: bool,
    /// Some handler canceled a cancelable emission
    pub canceled: bool,
}

/// Mutable context handed to each handler of one emission
#[derive(Debug)]
pub struct Invocation<'a> {
    topic: &'a str,
    phase: Phase,
    cancelable: bool,
    canceled: bool,
}

impl<'a> Invocation<'a> {
    fn new(topic: &'a str, phase: Phase, cancelable: bool) -> Self {
        Invocation {
            topic,
            phase,
            cancelable,
            canceled: false,
        }
    }

    /// The concrete topic that fired (useful for multi-topic handlers)
    pub fn topic(&self) -> &str {
        self.topic
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Current cancellation flag, as left by earlier handlers
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    pub fn set_canceled(&mut self, canceled: bool) {
        self.canceled = canceled;
    }
}

/// A subscribed callback
pub type Handler<P> = Box<dyn FnMut(&P, &mut Invocation<'_>) -> Result<()>>;

/// Topic-keyed publish/subscribe bus
///
/// Handlers run synchronously in registration order. A handler registered
/// under several topics is stored once and routed to from each topic.
/// Subscriptions live as long as the bus.
pub struct EventBus<P> {
    handlers: Vec<Handler<P>>,
    routes: FxHashMap<(Phase, String), SmallVec<[usize; 4]>>,
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        EventBus {
            handlers: Vec::new(),
            routes: FxHashMap::default(),
        }
    }

    /// Subscribe to the final phase of one or more space-separated topics
    pub fn subscribe<F>(&mut self, topics: &str, handler: F)
    where
        F: FnMut(&P, &mut Invocation<'_>) -> Result<()> + 'static,
    {
        self.register(Phase::Final, topics, Box::new(handler));
    }

    /// Subscribe to the cancelable pre-event phase of one or more topics
    pub fn subscribe_pre<F>(&mut self, topics: &str, handler: F)
    where
        F: FnMut(&P, &mut Invocation<'_>) -> Result<()> + 'static,
    {
        self.register(Phase::Pre, topics, Box::new(handler));
    }

    fn register(&mut self, phase: Phase, topics: &str, handler: Handler<P>) {
        let index = self.handlers.len();
        self.handlers.push(handler);
        for topic in topics.split_whitespace() {
            self.routes
                .entry((phase, topic.to_string()))
                .or_default()
                .push(index);
        }
    }

    /// Emit on the final phase of `topic`
    ///
    /// When `cancelable` is set, handlers may cancel; every handler still
    /// runs and the result reports the cancellation to the caller. The
    /// first handler error aborts the rest of this emission and is returned.
    pub fn emit(&mut self, topic: &str, payload: &P, cancelable: bool) -> Result<EmissionResult> {
        self.dispatch(Phase::Final, topic, payload, cancelable)
    }

    /// Emit the pre-event phase and return the cancellation decision
    pub fn emit_pre(&mut self, topic: &str, payload: &P) -> Result<Verdict> {
        let result = self.dispatch(Phase::Pre, topic, payload, true)?;
        Ok(if result.canceled {
            Verdict::Cancel
        } else {
            Verdict::Proceed
        })
    }

    /// Emit the unconditional final phase
    pub fn emit_final(&mut self, topic: &str, payload: &P) -> Result<EmissionResult> {
        self.dispatch(Phase::Final, topic, payload, false)
    }

    fn dispatch(
        &mut self,
        phase: Phase,
        topic: &str,
        payload: &P,
        cancelable: bool,
    ) -> Result<EmissionResult> {
        let Some(indices) = self.routes.get(&(phase, topic.to_string())) else {
            return Ok(EmissionResult::default());
        };

        let mut invocation = Invocation::new(topic, phase, cancelable);
        for &index in indices {
            (self.handlers[index])(payload, &mut invocation)?;
        }

        Ok(EmissionResult {
            ran: !indices.is_empty(),
            canceled: cancelable && invocation.canceled,
        })
    }

    /// Whether anything listens to `topic` in `phase`
    pub fn has_subscribers(&self, phase: Phase, topic: &str) -> bool {
        self.routes
            .get(&(phase, topic.to_string()))
            .is_some_and(|indices| !indices.is_empty())
    }

    /// Number of registered handlers (multi-topic handlers count once)
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}
