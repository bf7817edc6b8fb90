//! Options for contraction queries.

use std::{ fmt, sync::Arc };
use super::{
    ContractionPlanner,
    CostVisitor,
    IntermediateSize,
    StabilizerFlops,
    UpperBound,
};

/// Strategy used to order the contraction of a network.
#[derive(Clone, Default)]
pub enum Planner {
    /// Contract traces in the order they were declared.
    Declared,
    /// Greedily merge the cheapest connected pair of sub-networks first.
    #[default]
    Greedy,
    /// A user-supplied strategy.
    Custom(Arc<dyn ContractionPlanner>),
}

impl fmt::Debug for Planner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "Declared"),
            Self::Greedy => write!(f, "Greedy"),
            Self::Custom(p) => write!(f, "Custom({})", p.name()),
        }
    }
}

/// Selects one of the built-in [`CostVisitor`]s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CostKind {
    /// See [`IntermediateSize`].
    IntermediateSize,
    /// See [`StabilizerFlops`].
    #[default]
    StabilizerFlops,
    /// See [`UpperBound`].
    UpperBound,
}

impl CostKind {
    /// Return the corresponding cost visitor.
    pub fn visitor(self) -> &'static dyn CostVisitor {
        match self {
            Self::IntermediateSize => &IntermediateSize,
            Self::StabilizerFlops => &StabilizerFlops,
            Self::UpperBound => &UpperBound,
        }
    }
}

/// Configuration for a weight-enumerator query on a
/// [`TensorNetwork`][super::TensorNetwork].
///
/// Planner and cost choices affect only how fast a result is computed, never
/// the result itself.
#[derive(Clone, Debug)]
pub struct ContractionConfig {
    /// Drop all terms above this weight. Truncated results are exact up to
    /// and including this weight.
    pub truncate_length: Option<usize>,
    /// Contraction ordering strategy.
    pub planner: Planner,
    /// Cost function minimized by the planner, if it uses one.
    pub cost: CostKind,
    /// Run independent work on multiple threads. Has no effect without the
    /// `parallel` feature.
    pub parallel: bool,
}

impl Default for ContractionConfig {
    fn default() -> Self {
        Self {
            truncate_length: None,
            planner: Planner::default(),
            cost: CostKind::default(),
            parallel: true,
        }
    }
}

impl ContractionConfig {
    pub fn with_truncate_length(mut self, truncate_length: Option<usize>) -> Self {
        self.truncate_length = truncate_length;
        self
    }

    pub fn with_planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_cost(mut self, cost: CostKind) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shorthand for the declared-order planner.
    pub fn declared() -> Self { Self::default().with_planner(Planner::Declared) }

    /// Shorthand for the greedy planner with a given cost function.
    pub fn greedy(cost: CostKind) -> Self {
        Self::default().with_planner(Planner::Greedy).with_cost(cost)
    }
}
