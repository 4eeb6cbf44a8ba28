//! Server-side routing of client events to widget handlers.

use crate::error::{DispatchError, HandlerError};
use crate::handlers::Handler;
use crate::navigation::{NAVIGATED_FROM, NAVIGATED_TO, PageRef};
use crate::ui::{SharedUi, Ui};
use tracing::{debug, warn};
use trellis_types::{ClientEvent, EventData, EventKind, WidgetId};

/// Hooks that keep navigating are cut off after this many rounds.
const MAX_HOOK_ROUNDS: usize = 16;

/// What a handler receives for one event.
#[derive(Clone)]
pub struct EventContext {
    pub ui: SharedUi,
    pub target: WidgetId,
    pub kind: EventKind,
    pub data: EventData,
}

impl EventContext {
    /// Run `f` inside one critical section on the UI.
    pub fn update<R>(&self, f: impl FnOnce(&mut Ui) -> R) -> R {
        let mut ui = self.ui.lock();
        f(&mut ui)
    }

    pub fn value(&self) -> Option<&str> {
        self.data.value()
    }

    /// Path of the page involved, for `navigate` events and page hooks.
    pub fn path(&self) -> Option<&str> {
        self.data.path()
    }
}

/// Resolve `event` against the live tree and run its handlers.
///
/// Built-in behaviour is applied first, then the application handlers for
/// `(id, type)` are awaited one after another. The lock is never held
/// across an await. A failing handler is logged and the rest still run.
/// Page hooks for any navigation the event caused run after the built-ins
/// and again after the handlers.
/// Returns the number of application handlers that were invoked.
pub async fn dispatch(ui: &SharedUi, event: &ClientEvent) -> Result<usize, DispatchError> {
    let handlers = {
        let mut guard = ui.lock();
        if !guard.contains(&event.id) {
            warn!(target_id = %event.id, kind = %event.kind, "event for unknown widget dropped");
            return Err(DispatchError::UnresolvedTarget(event.id.clone()));
        }
        if let Err(err) = guard.apply_builtin(event) {
            warn!(target_id = %event.id, kind = %event.kind, error = %err, "built-in event handling failed");
        }
        guard.handlers().handlers_for(&event.id, &event.kind)
    };
    run_page_hooks(ui).await;

    debug!(target_id = %event.id, kind = %event.kind, handlers = handlers.len(), "dispatching event");
    let count = run_handlers(ui, event, handlers).await;
    run_page_hooks(ui).await;
    Ok(count)
}

/// Run the `navigated_from` and `navigated_to` handlers for every page
/// change since the last call, including changes made by the hooks
/// themselves. Returns the number of hooks run.
pub async fn run_page_hooks(ui: &SharedUi) -> usize {
    let mut count = 0;
    for _ in 0..MAX_HOOK_ROUNDS {
        let hooks = {
            let mut guard = ui.lock();
            let transitions = guard.take_transitions();
            if transitions.is_empty() {
                return count;
            }
            let mut hooks = Vec::new();
            for transition in transitions {
                if let Some(from) = transition.from {
                    hooks.push(page_hook(&guard, from, NAVIGATED_FROM));
                }
                hooks.push(page_hook(&guard, transition.to, NAVIGATED_TO));
            }
            hooks
        };
        for (event, handlers) in hooks {
            count += run_handlers(ui, &event, handlers).await;
        }
    }
    warn!(rounds = MAX_HOOK_ROUNDS, "page hooks keep navigating, remaining hooks skipped");
    ui.lock().take_transitions();
    count
}

fn page_hook(ui: &Ui, page: PageRef, kind: &str) -> (ClientEvent, Vec<Handler>) {
    let event = ClientEvent::new(page.page, EventKind::from(kind), EventData::with_path(page.path));
    let handlers = ui.handlers().handlers_for(&event.id, &event.kind);
    (event, handlers)
}

async fn run_handlers(ui: &SharedUi, event: &ClientEvent, handlers: Vec<Handler>) -> usize {
    let count = handlers.len();
    for handler in handlers {
        let ctx = EventContext {
            ui: ui.clone(),
            target: event.id.clone(),
            kind: event.kind.clone(),
            data: event.data.clone(),
        };
        if let Err(err) = handler(ctx).await {
            report(&event.id, &err);
        }
    }
    count
}

fn report(target: &WidgetId, err: &HandlerError) {
    warn!(target_id = %target, error = %err, "event handler failed");
}
