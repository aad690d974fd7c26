//! 状态空间分析：可达图、禁止区域判定与补网构造.
use std::time::Duration;

use thiserror::Error;

use crate::net::FireError;

pub mod complement;
pub mod reachability;
pub mod upward;

pub use complement::{Complement, complement, complement_all, complement_with};
pub use reachability::{ExploreConfig, ReachabilityGraph, StateGraphStats, explore};
pub use upward::{UpwardClosure, dominates};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("marking has {found} places but the net declares {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("initial marking has {found} places but the net declares {expected}; nothing is reachable")]
    EmptyReachableSet { expected: usize, found: usize },
    #[error("state space exceeds the configured limit of {limit} markings")]
    StateSpaceTooLarge { limit: usize },
    #[error("exploration exceeded its time limit of {limit:?}")]
    DeadlineExceeded { limit: Duration },
    #[error(transparent)]
    Fire(#[from] FireError),
}
