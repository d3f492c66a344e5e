//! Optimistic like counter as an explicit two-phase transition.
//!
//! A like is shown immediately (`Pending`), then either `Confirmed` with the
//! count reported by the store or `Reverted` to the count shown before.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeState {
    Pending,
    Confirmed,
    Reverted,
}

impl LikeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Reverted => "reverted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeUpdate {
    pub state: LikeState,
    /// Count shown before the like.
    pub previous: u64,
    /// Count to show now.
    pub displayed: u64,
}

impl LikeUpdate {
    pub fn begin(current: u64) -> Self {
        Self {
            state: LikeState::Pending,
            previous: current,
            displayed: current.saturating_add(1),
        }
    }

    /// Adopt the store's count. Settled updates are left untouched.
    pub fn confirm(self, stored: u64) -> Self {
        match self.state {
            LikeState::Pending => Self {
                state: LikeState::Confirmed,
                displayed: stored,
                ..self
            },
            _ => self,
        }
    }

    /// Roll the displayed count back. Settled updates are left untouched.
    pub fn revert(self) -> Self {
        match self.state {
            LikeState::Pending => Self {
                state: LikeState::Reverted,
                displayed: self.previous,
                ..self
            },
            _ => self,
        }
    }

    pub fn settle<E>(self, outcome: &Result<u64, E>) -> Self {
        match outcome {
            Ok(stored) => self.confirm(*stored),
            Err(_) => self.revert(),
        }
    }
}
