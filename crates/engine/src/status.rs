use std::sync::Arc;

use crate::page::Page;

/// Load status of a list screen.
///
/// `Idle → Loading` on the first request, `Loading → Succeeded | Failed` when
/// the current request settles, and back to `Loading` on any later request.
#[derive(Debug)]
pub enum LoadStatus<T> {
    Idle,
    Loading,
    Succeeded(Arc<Page<T>>),
    Failed(String),
}

impl<T> Clone for LoadStatus<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Succeeded(page) => Self::Succeeded(Arc::clone(page)),
            Self::Failed(message) => Self::Failed(message.clone()),
        }
    }
}

impl<T> LoadStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded(_) => "ok",
            Self::Failed(_) => "error",
        }
    }
}
