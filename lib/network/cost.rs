//! Cost estimates for pairwise merges, used during plan search.
//!
//! All costs are returned as base-2 logarithms. They only steer the search
//! and never affect the result of a contraction.

use ndarray as nd;
use crate::{ linalg, tensor::Leg };
use super::{ NetworkError, NetworkResult, SubCode };

/// Estimates the cost of merging two sub-networks along pairs of legs.
pub trait CostVisitor: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Return the log<sub>2</sub> cost of merging `left` and `right` along
    /// `legs1[i]` ~ `legs2[i]`.
    fn merge_cost(
        &self,
        left: &SubCode,
        right: &SubCode,
        legs1: &[Leg],
        legs2: &[Leg],
    ) -> NetworkResult<f64>;
}

/// Size of the merged enumerator: the number of distinct Pauli assignments on
/// the tracable legs of the merged sub-network.
///
/// This is 2<sup>*b*</sup> with *b* the boundary rank of the merged
/// sub-code (the rank of its generators projected onto the tracable legs),
/// not 2<sup>rank</sup> of the full merged sub-code. The two differ whenever
/// some generators act only on dangling legs; those are summed into the
/// polynomials and never add entries.
#[derive(Copy, Clone, Debug, Default)]
pub struct IntermediateSize;

impl CostVisitor for IntermediateSize {
    fn name(&self) -> &'static str { "intermediate-size" }

    fn merge_cost(
        &self,
        left: &SubCode,
        right: &SubCode,
        legs1: &[Leg],
        legs2: &[Leg],
    ) -> NetworkResult<f64>
    {
        let merged = left.merge(right, legs1, legs2)?;
        Ok(merged.boundary_rank()? as f64)
    }
}

/// Number of matching entry pairs visited by the join.
///
/// Each side holds 2<sup>*b*</sup> boundary assignments, where *b* is its
/// boundary rank. An assignment pair matches when both project to the same
/// Paulis on the joined legs; with *V*<sub>1</sub>, *V*<sub>2</sub> the
/// spaces of these projections (aligned by leg pair), the number of matching
/// pairs is 2<sup>*b*<sub>1</sub> + *b*<sub>2</sub> − dim(*V*<sub>1</sub> +
/// *V*<sub>2</sub>)</sup>.
///
/// The exponent uses boundary ranks *b*<sub>1</sub> and *b*<sub>2</sub>
/// rather than the full ranks of the two sub-codes, so this is smaller than
/// 2<sup>rank<sub>1</sub> + rank<sub>2</sub></sup> times the matching
/// fraction whenever either side has generators supported only on dangling
/// legs.
#[derive(Copy, Clone, Debug, Default)]
pub struct StabilizerFlops;

impl CostVisitor for StabilizerFlops {
    fn name(&self) -> &'static str { "stabilizer-flops" }

    fn merge_cost(
        &self,
        left: &SubCode,
        right: &SubCode,
        legs1: &[Leg],
        legs2: &[Leg],
    ) -> NetworkResult<f64>
    {
        if legs1.len() != legs2.len() {
            return Err(NetworkError::LegCountMismatch(legs1.len(), legs2.len()));
        }
        let b1 = left.boundary_rank()?;
        let b2 = right.boundary_rank()?;
        let v1 = left.projection(legs1)?;
        let v2 = right.projection(legs2)?;
        let joint: linalg::BinMatrix =
            nd::concatenate(nd::Axis(0), &[v1.view(), v2.view()])?;
        let d = linalg::rank(&joint);
        Ok((b1 + b2).saturating_sub(d) as f64)
    }
}

/// Upper bound from leg counts alone: with *o*<sub>1</sub>,
/// *o*<sub>2</sub> the numbers of tracable legs on each side, the cost is
/// 2<sup>*o*<sub>1</sub> + *o*<sub>2</sub> + min(*o*<sub>1</sub>,
/// *o*<sub>2</sub>)</sup>.
#[derive(Copy, Clone, Debug, Default)]
pub struct UpperBound;

impl CostVisitor for UpperBound {
    fn name(&self) -> &'static str { "upper-bound" }

    fn merge_cost(
        &self,
        left: &SubCode,
        right: &SubCode,
        _legs1: &[Leg],
        _legs2: &[Leg],
    ) -> NetworkResult<f64>
    {
        let o1 = left.tracable().len();
        let o2 = right.tracable().len();
        Ok((o1 + o2 + o1.min(o2)) as f64)
    }
}
