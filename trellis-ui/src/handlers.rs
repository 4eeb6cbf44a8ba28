use crate::dispatch::EventContext;
use crate::error::HandlerError;
use crate::ui::Ui;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use trellis_types::{EventKind, WidgetId};

pub type HandlerResult = Result<(), HandlerError>;

/// Application callback for one `(widget, event type)` channel.
pub type Handler = Arc<dyn Fn(EventContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Identifies a registration so it can be disconnected later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

/// Wrap an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(EventContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Wrap a closure that runs inside a single critical section on the UI.
///
/// The closure already holds the UI lock, so it must use the `&mut Ui` it
/// is given. Calling `ctx.update` or locking `ctx.ui` from inside it
/// deadlocks; handlers that need several critical sections belong in
/// [`handler`].
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(&mut Ui, &EventContext) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(move |ctx: EventContext| {
        let result = {
            let mut ui = ctx.ui.lock();
            f(&mut ui, &ctx)
        };
        future::ready(result).boxed()
    })
}

type Slot = SmallVec<[(HandlerId, Handler); 2]>;

/// Table of handlers keyed by `(widget id, event type)`.
///
/// Handlers sharing a key run in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    slots: HashMap<(WidgetId, EventKind), Slot>,
    next_id: u64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, widget: WidgetId, kind: EventKind, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.slots
            .entry((widget, kind))
            .or_default()
            .push((id, handler));
        id
    }

    /// Returns false if the registration was already gone.
    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        let mut found = false;
        self.slots.retain(|_, slot| {
            let before = slot.len();
            slot.retain(|(h, _)| *h != id);
            found |= slot.len() != before;
            !slot.is_empty()
        });
        found
    }

    /// Handlers for a key, cloned so they can run without borrowing the registry.
    pub fn handlers_for(&self, widget: &WidgetId, kind: &EventKind) -> Vec<Handler> {
        self.slots
            .get(&(widget.clone(), kind.clone()))
            .map(|slot| slot.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    /// Drop every handler attached to `widget`.
    pub fn remove_widget(&mut self, widget: &WidgetId) {
        self.slots.retain(|(w, _), _| w != widget);
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(|slot| slot.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
