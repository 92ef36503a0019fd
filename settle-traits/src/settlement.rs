/// The content of a single-assignment result.
///
/// A settlement starts as [`Settlement::Pending`] and moves at most once to one of the two
/// terminal variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

/// Payload-free view of a [`Settlement`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettlementState {
    Pending,
    Fulfilled,
    Rejected,
}

impl<T, E> Settlement<T, E> {
    pub fn state(&self) -> SettlementState {
        match self {
            Settlement::Pending => SettlementState::Pending,
            Settlement::Fulfilled(_) => SettlementState::Fulfilled,
            Settlement::Rejected(_) => SettlementState::Rejected,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Settlement::Pending)
    }

    /// The outcome, or None while still pending
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value)),
            Settlement::Rejected(error) => Some(Err(error)),
        }
    }

    pub fn as_result(&self) -> Option<Result<&T, &E>> {
        match self {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value)),
            Settlement::Rejected(error) => Some(Err(error)),
        }
    }
}

impl<T, E> Default for Settlement<T, E> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T, E> From<Result<T, E>> for Settlement<T, E> {
    fn from(outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(value) => Self::Fulfilled(value),
            Err(error) => Self::Rejected(error),
        }
    }
}

impl SettlementState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SettlementState::Pending)
    }
}
