use thiserror::Error;
use trellis_types::WidgetId;

/// Rejected tree mutations. The tree is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("widget '{0}' does not exist")]
    UnresolvedReference(WidgetId),

    #[error("widget id '{0}' has already been used in this session")]
    DuplicateId(WidgetId),

    #[error("widget '{0}' cannot hold children")]
    NotAContainer(WidgetId),

    #[error("widget '{0}' is not a page")]
    NotAPage(WidgetId),

    #[error("the root container cannot be removed or moved")]
    RootRemoval,

    #[error("a tree has exactly one root container")]
    SecondRoot,

    #[error("property '{0}' is managed by the tree")]
    ReservedProperty(String),

    #[error("cannot move '{0}' below its own descendant '{1}'")]
    Cycle(WidgetId, WidgetId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("no page registered for path '{0}'")]
    UnknownPage(String),

    #[error("a page is already registered for path '{0}'")]
    DuplicatePage(String),

    #[error("no default page set for navigation")]
    NoDefaultPage,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("event target '{0}' does not exist")]
    UnresolvedTarget(WidgetId),
}

/// Failure raised by an application handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("{0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn custom(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Custom(err.into())
    }
}
