//! In-process typed pub/sub with ordered dispatch and fault isolation.
//!
//! Dispatch is synchronous and depth-first: a publish issued from inside a
//! handler runs to completion before the outer publish returns. Handlers
//! therefore must release any context borrow before publishing, and should
//! re-read slots afterwards.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use uuid::Uuid;

use tutorkit_types::{Event, EventPayload, EventType, SessionContext, SharedClock};

/// The session context handle shared by the bus and every handler
pub type SharedContext = Rc<RefCell<SessionContext>>;

type Handler = Box<dyn FnMut(&Event, &EventBus) -> anyhow::Result<()>>;

pub struct EventBus {
    id: Uuid,
    ctx: SharedContext,
    clock: SharedClock,
    handlers: RefCell<HashMap<EventType, Vec<Rc<RefCell<Handler>>>>>,
    log_limit: usize,
}

impl EventBus {
    pub fn new(ctx: SharedContext, clock: SharedClock, log_limit: usize) -> Self {
        let id = Uuid::new_v4();
        ctx.borrow_mut().progress.event_bus_mut().id = id;
        Self {
            id,
            ctx,
            clock,
            handlers: RefCell::new(HashMap::new()),
            log_limit,
        }
    }

    /// Stable per-session bus id, also visible in the EventBus slot.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> SharedContext {
        Rc::clone(&self.ctx)
    }

    pub fn clock(&self) -> SharedClock {
        Rc::clone(&self.clock)
    }

    /// Register a handler. Handlers for a type run in registration order,
    /// stable across publishes.
    pub fn subscribe<F>(&self, event_type: EventType, handler: F)
    where
        F: FnMut(&Event, &EventBus) -> anyhow::Result<()> + 'static,
    {
        self.handlers
            .borrow_mut()
            .entry(event_type)
            .or_default()
            .push(Rc::new(RefCell::new(Box::new(handler))));
    }

    /// Publish an event: run every registered handler in order, then append
    /// a keys-only record to the bounded bus log.
    pub fn publish(&self, source: &str, payload: EventPayload) {
        let event = Event::new(source, self.clock.now_ts(), payload);
        tracing::trace!(
            event_type = event.event_type.name(),
            source = event.source,
            "dispatch"
        );

        // Snapshot the handler list so a handler subscribing mid-dispatch
        // does not observe the event that registered it.
        let registered: Vec<Rc<RefCell<Handler>>> = self
            .handlers
            .borrow()
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        for entry in registered {
            let result = match entry.try_borrow_mut() {
                Ok(mut handler) => handler(&event, self),
                // A handler transitively re-entered itself; treated as a
                // handler bug, not a bus failure.
                Err(_) => Err(anyhow::anyhow!("handler re-entered during dispatch")),
            };
            if let Err(err) = result {
                self.report_failure(&event, err);
            }
        }

        let record = event.to_log_record();
        self.ctx
            .borrow_mut()
            .progress
            .event_bus_mut()
            .push(record, self.log_limit);
    }

    /// A failing handler never blocks the remaining handlers; it becomes an
    /// `error` event instead. Failures inside `error` handlers are swallowed
    /// so the bus cannot recurse.
    fn report_failure(&self, during: &Event, err: anyhow::Error) {
        if during.event_type == EventType::Error {
            tracing::warn!(%err, "error handler failed; swallowed");
            return;
        }
        tracing::warn!(
            during = during.event_type.name(),
            %err,
            "handler failed; publishing error event"
        );
        self.publish(
            "bus",
            EventPayload::Error {
                reason: err.to_string(),
                during: during.event_type.name().to_string(),
            },
        );
    }
}
