pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod navigation;
pub mod recorder;
pub mod tree;
pub mod ui;
pub mod widgets;

// Re-export key types
pub use dispatch::{EventContext, dispatch, run_page_hooks};
pub use error::{DispatchError, HandlerError, NavigationError, TreeError};
pub use handlers::{Handler, HandlerId, HandlerRegistry, HandlerResult, handler, sync_handler};
pub use navigation::{NAVIGATED_FROM, NAVIGATED_TO, Navigator, PageRef, PageTransition};
pub use recorder::ChangeRecorder;
pub use tree::{WidgetTree, new_widget_id};
pub use ui::{SharedUi, Ui};
pub use widgets::WidgetSpec;

pub use trellis_types as types;
