use crate::api::traits::FetchFailure;

/// Render-ready state of one view. Exactly one variant holds at a time, and
/// every transition replaces the whole value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState<T> {
    /// Nothing requested yet. Only ever the initial state.
    #[default]
    Idle,
    Loading,
    Success { data: T },
    Failure { reason: FetchFailure },
}

impl<T> ViewState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, ViewState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    /// Success or Failure: settled until the next trigger.
    pub fn is_settled(&self) -> bool {
        matches!(self, ViewState::Success { .. } | ViewState::Failure { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            ViewState::Failure { reason } => Some(reason),
            _ => None,
        }
    }

    /// Human-readable error message, if the view is in Failure.
    pub fn message(&self) -> Option<String> {
        self.failure().map(ToString::to_string)
    }
}
