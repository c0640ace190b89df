//! # Load State
//!
//! The tagged union every loader publishes. Exactly one variant holds at a
//! time per loader instance; loaders always converge to `Loaded`, `Empty`,
//! or `Error` once a terminal outcome is known (a cancelled load keeps the
//! previously published state instead).

use serde::Serialize;

/// View state of a loader instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum LoadState<T> {
    /// Constructed, nothing dispatched yet.
    Idle,
    /// Replace-all load in flight.
    Loading,
    /// Append (pagination) load in flight.
    LoadingMore,
    /// Items ready for rendering.
    Loaded(Vec<T>),
    /// Nothing to load (e.g. no favorites).
    Empty,
    /// Load failed; message is display-ready.
    Error(String),
}

impl<T> LoadState<T> {
    /// True for `Loaded`, `Empty`, and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadState::Loaded(_) | LoadState::Empty | LoadState::Error(_)
        )
    }

    /// The published items, when any.
    pub fn items(&self) -> Option<&[T]> {
        match self {
            LoadState::Loaded(items) => Some(items),
            _ => None,
        }
    }
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> std::fmt::Display for LoadState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "idle"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::LoadingMore => write!(f, "loading-more"),
            LoadState::Loaded(items) => write!(f, "loaded({})", items.len()),
            LoadState::Empty => write!(f, "empty"),
            LoadState::Error(_) => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(LoadState::<i32>::Loaded(vec![1]).is_terminal());
        assert!(LoadState::<i32>::Empty.is_terminal());
        assert!(LoadState::<i32>::Error("boom".into()).is_terminal());
        assert!(!LoadState::<i32>::Idle.is_terminal());
        assert!(!LoadState::<i32>::Loading.is_terminal());
        assert!(!LoadState::<i32>::LoadingMore.is_terminal());
    }

    #[test]
    fn test_items_accessor() {
        let state = LoadState::Loaded(vec![1, 2, 3]);
        assert_eq!(state.items(), Some(&[1, 2, 3][..]));
        assert_eq!(LoadState::<i32>::Loading.items(), None);
    }
}
