//! Stabilizer tensors ("legos") and the sparse partial enumerators built from
//! them.
//!
//! Each [`StabilizerCodeTensor`] owns a symplectic parity-check matrix whose
//! columns are labelled by globally unique [`Leg`]s. Enumerating a tensor with
//! some of its legs left open produces a [`Pte`] (partially traced
//! enumerator): a sparse map from the Paulis on the open legs to the weight
//! enumerator of the remaining legs. Contracting legs between `Pte`s then
//! computes the enumerator of the composite code without ever forming its
//! parity-check matrix.

use std::fmt;
use thiserror::Error;
use crate::{ linalg::LinalgError, poly::PolyError };

#[derive(Debug, Error)]
pub enum TensorError {
    #[error("linear algebra error: {0}")]
    LinalgError(#[from] LinalgError),

    #[error("polynomial error: {0}")]
    PolyError(#[from] PolyError),

    /// Returned when the number of legs does not match the width of a
    /// parity-check matrix.
    #[error("{legs} legs given for a parity-check matrix on {qubits} qubits")]
    LegCount { legs: usize, qubits: usize },

    /// Returned when a leg is not present where it is expected.
    #[error("missing leg {0}")]
    MissingLeg(Leg),

    /// Returned when a leg is used twice where it must be unique.
    #[error("duplicate leg {0}")]
    DuplicateLeg(Leg),

    /// Returned when two leg lists that are paired up have different lengths.
    #[error("cannot pair {0} legs with {1} legs")]
    LegListMismatch(usize, usize),

    /// Returned when two enumerators to be combined have absorbed the same
    /// node.
    #[error("node {0} is present on both sides of a contraction")]
    OverlappingNodes(NodeId),

    /// Returned when local enumeration would require iterating over more
    /// generator combinations than can be counted.
    #[error("cannot enumerate {0} independent generators")]
    TooManyGenerators(usize),
}
pub type TensorResult<T> = Result<T, TensorError>;

/// Identifies a node in a tensor network.
pub type NodeId = usize;

/// A contraction point on a node, identified by the node's ID and a position.
///
/// Legs are only labels: after contractions, a tensor can carry legs
/// originating from many different nodes, and `index` need not match the
/// leg's column in any particular matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Leg {
    pub node: NodeId,
    pub index: usize,
}

impl Leg {
    /// Create a new leg.
    pub fn new(node: NodeId, index: usize) -> Self { Self { node, index } }
}

impl From<(NodeId, usize)> for Leg {
    fn from(pair: (NodeId, usize)) -> Self { Self::new(pair.0, pair.1) }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.node, self.index)
    }
}

// find the positions of `legs` in `all`, requiring each to be present and
// unique
pub(crate) fn leg_positions(all: &[Leg], legs: &[Leg])
    -> TensorResult<Vec<usize>>
{
    let mut pos: Vec<usize> = Vec::with_capacity(legs.len());
    for leg in legs.iter() {
        let k =
            all.iter().position(|l| l == leg)
            .ok_or(TensorError::MissingLeg(*leg))?;
        if pos.contains(&k) { return Err(TensorError::DuplicateLeg(*leg)); }
        pos.push(k);
    }
    Ok(pos)
}

pub(crate) mod stabilizer;
pub use stabilizer::*;

pub(crate) mod pte;
pub use pte::*;
