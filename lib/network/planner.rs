//! Contraction-order planning.
//!
//! A planner treats each node as the set of legs it touches and searches for
//! a binary contraction tree over the network, guided by a [`CostVisitor`].
//! Planners work on parity-check matrices only ([`SubCode`]s) and never
//! enumerate anything.

use std::collections::{ BTreeMap, BTreeSet };
use tracing::debug;
use crate::{
    linalg::{ self, BinMatrix },
    tensor::{ Leg, NodeId, StabilizerCodeTensor, TensorResult, leg_positions },
};
use super::{
    ContractionTree,
    CostVisitor,
    NetworkError,
    NetworkResult,
    Trace,
    tree::collect_legs,
};

/// Everything a planner may look at.
#[derive(Copy, Clone, Debug)]
pub struct PlanContext<'a> {
    /// All nodes of the network.
    pub nodes: &'a BTreeMap<NodeId, StabilizerCodeTensor>,
    /// Declared traces.
    pub traces: &'a [Trace],
    /// Legs left open in the final result.
    pub open_legs: &'a [Leg],
}

impl<'a> PlanContext<'a> {
    /// Return the legs of node `id` that are traced or open, in leg order.
    pub fn tracable_legs(&self, id: NodeId) -> Vec<Leg> {
        let Some(node) = self.nodes.get(&id) else { return Vec::new(); };
        node.legs().iter()
            .filter(|leg| {
                self.open_legs.contains(leg)
                    || self.traces.iter().any(|t| t.contains(leg))
            })
            .copied()
            .collect()
    }
}

/// A strategy for ordering the contraction of a network.
///
/// Implementations must return a tree that contracts exactly the declared
/// traces; this is checked with [`ContractionTree::verify`] before anything
/// is executed.
pub trait ContractionPlanner: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Build a contraction tree for the network described by `ctx`.
    fn plan(&self, ctx: &PlanContext<'_>, cost: &dyn CostVisitor)
        -> NetworkResult<ContractionTree>;
}

/// Contracts traces in declaration order; see [`ContractionTree::declared`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DeclaredOrder;

impl ContractionPlanner for DeclaredOrder {
    fn name(&self) -> &str { "declared" }

    fn plan(&self, ctx: &PlanContext<'_>, _cost: &dyn CostVisitor)
        -> NetworkResult<ContractionTree>
    {
        ContractionTree::declared(ctx.nodes.keys().copied(), ctx.traces)
    }
}

/// Repeatedly merges the connected pair of sub-networks with the lowest cost,
/// contracting every trace between them at once.
///
/// Traces internal to a sub-network are contracted as soon as they appear.
/// Ties go to the pair whose smaller sub-network index comes first.
/// Sub-networks that are never connected are combined by products at the
/// end.
#[derive(Copy, Clone, Debug, Default)]
pub struct GreedyPlanner;

impl ContractionPlanner for GreedyPlanner {
    fn name(&self) -> &str { "greedy" }

    fn plan(&self, ctx: &PlanContext<'_>, cost: &dyn CostVisitor)
        -> NetworkResult<ContractionTree>
    {
        let mut tree = ContractionTree::new();
        let mut comps: Vec<Option<(usize, SubCode)>> = Vec::new();
        let mut owner: BTreeMap<NodeId, usize> = BTreeMap::new();
        for (id, node) in ctx.nodes.iter() {
            let step = tree.leaf(*id);
            owner.insert(*id, comps.len());
            comps.push(Some((step, SubCode::leaf(node, ctx.tracable_legs(*id)))));
        }
        let comp_of = |owner: &BTreeMap<NodeId, usize>, id: NodeId| {
            owner.get(&id).copied().ok_or(NetworkError::MissingNode(id))
        };
        let mut pending: BTreeSet<usize> = (0 .. ctx.traces.len()).collect();

        loop {
            // contract traces internal to a single sub-network
            let mut internal: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            let mut between: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
            for &t in pending.iter() {
                let trace = &ctx.traces[t];
                let ca = comp_of(&owner, trace.node_a)?;
                let cb = comp_of(&owner, trace.node_b)?;
                if ca == cb {
                    internal.entry(ca).or_default().push(t);
                } else {
                    between.entry((ca.min(cb), ca.max(cb))).or_default().push(t);
                }
            }
            if !internal.is_empty() {
                for (c, tr) in internal.into_iter() {
                    let (step, sub) = take_comp(&mut comps, c)?;
                    let (la, lb) = collect_legs(&tr, ctx.traces, |_| true);
                    let sub = sub.self_trace(&la, &lb)?;
                    tr.iter().for_each(|t| { pending.remove(t); });
                    let step = tree.self_trace(step, tr);
                    comps[c] = Some((step, sub));
                }
                continue;
            }
            if between.is_empty() { break; }

            let mut best: Option<(f64, (usize, usize))> = None;
            for (&(ca, cb), tr) in between.iter() {
                let (l, r) = (get_comp(&comps, ca)?, get_comp(&comps, cb)?);
                let (ll, rl) =
                    collect_legs(tr, ctx.traces, |t| l.nodes.contains(&t.node_a));
                let c = cost.merge_cost(l, r, &ll, &rl)?;
                if best.map_or(true, |(b, _)| c < b) { best = Some((c, (ca, cb))); }
            }
            let Some((c, (ca, cb))) = best else { break; };
            let tr = between.remove(&(ca, cb)).unwrap_or_default();
            let (sl, l) = take_comp(&mut comps, ca)?;
            let (sr, r) = take_comp(&mut comps, cb)?;
            let (ll, rl) =
                collect_legs(&tr, ctx.traces, |t| l.nodes.contains(&t.node_a));
            let merged = l.merge(&r, &ll, &rl)?;
            debug!(
                left = ca,
                right = cb,
                cost = c,
                visitor = cost.name(),
                traces = tr.len(),
                "greedy merge"
            );
            tr.iter().for_each(|t| { pending.remove(t); });
            let step = tree.merge(sl, sr, tr);
            owner.values_mut().filter(|o| **o == cb).for_each(|o| { *o = ca; });
            comps[ca] = Some((step, merged));
        }

        let mut remaining = comps.into_iter().flatten().map(|(step, _)| step);
        if let Some(first) = remaining.next() {
            remaining.fold(first, |acc, step| tree.product(acc, step));
        }
        Ok(tree)
    }
}

fn get_comp(comps: &[Option<(usize, SubCode)>], c: usize)
    -> NetworkResult<&SubCode>
{
    comps.get(c).and_then(|comp| comp.as_ref()).map(|(_, sub)| sub)
        .ok_or_else(|| NetworkError::PlanMismatch(
            format!("sub-network {} was already consumed", c)))
}

fn take_comp(comps: &mut [Option<(usize, SubCode)>], c: usize)
    -> NetworkResult<(usize, SubCode)>
{
    comps.get_mut(c).and_then(|comp| comp.take())
        .ok_or_else(|| NetworkError::PlanMismatch(
            format!("sub-network {} was already consumed", c)))
}

/// The stabilizer group of a sub-network, as seen by a planner: the
/// matrix-level contraction of its nodes, together with its tracable legs.
#[derive(Clone, Debug)]
pub struct SubCode {
    nodes: BTreeSet<NodeId>,
    code: StabilizerCodeTensor,
    tracable: Vec<Leg>,
}

impl SubCode {
    /// Create a sub-code for a single node. Coset flips are dropped.
    pub fn leaf(node: &StabilizerCodeTensor, tracable: Vec<Leg>) -> Self {
        let mut code = node.clone();
        code.clear_coset();
        Self { nodes: [node.id()].into_iter().collect(), code, tracable }
    }

    /// Return the IDs of all absorbed nodes.
    pub fn nodes(&self) -> &BTreeSet<NodeId> { &self.nodes }

    /// Return the contracted parity-check matrix and legs.
    pub fn code(&self) -> &StabilizerCodeTensor { &self.code }

    /// Return the legs that are traced later or left open.
    pub fn tracable(&self) -> &[Leg] { &self.tracable }

    /// Return the rank of the stabilizer group.
    pub fn rank(&self) -> usize { self.code.rank() }

    /// Return the rank of the stabilizer group restricted to the tracable
    /// legs, i.e. the log<sub>2</sub> of the number of entries of the
    /// corresponding enumerator.
    pub fn boundary_rank(&self) -> TensorResult<usize> {
        Ok(linalg::rank(&self.projection(&self.tracable)?))
    }

    /// Return the generators restricted to `legs`, as a symplectic matrix over
    /// those legs in the given order.
    pub fn projection(&self, legs: &[Leg]) -> TensorResult<BinMatrix> {
        let pos = leg_positions(self.code.legs(), legs)?;
        let h = self.code.h();
        let n = self.code.n();
        let m = pos.len();
        Ok(BinMatrix::from_shape_fn(
            (h.nrows(), 2 * m),
            |(i, j)| if j < m { h[[i, pos[j]]] } else { h[[i, pos[j - m] + n]] },
        ))
    }

    /// Contract `legs1` of `self` with `legs2` of `other`.
    pub fn merge(&self, other: &Self, legs1: &[Leg], legs2: &[Leg])
        -> TensorResult<Self>
    {
        let code = self.code.conjoin(&other.code, legs1, legs2)?;
        let tracable: Vec<Leg> =
            self.tracable.iter().chain(other.tracable.iter())
            .filter(|leg| !legs1.contains(leg) && !legs2.contains(leg))
            .copied()
            .collect();
        let nodes: BTreeSet<NodeId> =
            self.nodes.union(&other.nodes).copied().collect();
        Ok(Self { nodes, code, tracable })
    }

    /// Contract `legs1[i]` with `legs2[i]` within `self`.
    pub fn self_trace(&self, legs1: &[Leg], legs2: &[Leg]) -> TensorResult<Self> {
        let code = self.code.self_trace(legs1, legs2)?;
        let tracable: Vec<Leg> =
            self.tracable.iter()
            .filter(|leg| !legs1.contains(leg) && !legs2.contains(leg))
            .copied()
            .collect();
        Ok(Self { nodes: self.nodes.clone(), code, tracable })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ legos, network::{ CostKind, IntermediateSize } };

    // a chain 0 - 1 - 2 of [[4, 2, 2]] nodes with one extra loop 2 - 0
    fn chain() -> (BTreeMap<NodeId, StabilizerCodeTensor>, Vec<Trace>) {
        let nodes: BTreeMap<NodeId, StabilizerCodeTensor> =
            (0 .. 3)
            .map(|id| {
                let t = StabilizerCodeTensor::new(id, legos::stab_code_parity_422());
                (id, t.unwrap())
            })
            .collect();
        let traces = vec![
            Trace::new(0, 1, vec![Leg::new(0, 0)], vec![Leg::new(1, 0)]),
            Trace::new(1, 2, vec![Leg::new(1, 1)], vec![Leg::new(2, 0)]),
            Trace::new(2, 0, vec![Leg::new(2, 1)], vec![Leg::new(0, 1)]),
        ];
        (nodes, traces)
    }

    #[test]
    fn tracable_legs() {
        let (nodes, traces) = chain();
        let open = [Leg::new(1, 3)];
        let ctx = PlanContext { nodes: &nodes, traces: &traces, open_legs: &open };
        assert_eq!(ctx.tracable_legs(0), vec![Leg::new(0, 0), Leg::new(0, 1)]);
        assert_eq!(
            ctx.tracable_legs(1),
            vec![Leg::new(1, 0), Leg::new(1, 1), Leg::new(1, 3)],
        );
        assert!(ctx.tracable_legs(7).is_empty());
    }

    #[test]
    fn greedy_plans_verify() {
        let (nodes, traces) = chain();
        let ctx = PlanContext { nodes: &nodes, traces: &traces, open_legs: &[] };
        let ids: BTreeSet<NodeId> = nodes.keys().copied().collect();
        for kind in [CostKind::IntermediateSize, CostKind::StabilizerFlops, CostKind::UpperBound] {
            let tree = GreedyPlanner.plan(&ctx, kind.visitor()).unwrap();
            assert!(tree.verify(&ids, &traces).is_ok());
            // two merges; the last one closes the loop by taking both of its
            // remaining traces at once
            assert_eq!(tree.len(), 5);
        }
        let declared = DeclaredOrder.plan(&ctx, &IntermediateSize).unwrap();
        assert!(declared.verify(&ids, &traces).is_ok());
        assert_eq!(declared.len(), 6);
    }

    #[test]
    fn sub_code_merge() {
        let (nodes, _) = chain();
        let a = SubCode::leaf(&nodes[&0], vec![Leg::new(0, 0), Leg::new(0, 1)]);
        let b = SubCode::leaf(&nodes[&1], vec![Leg::new(1, 0)]);
        assert_eq!(a.boundary_rank().unwrap(), 2);
        let ab = a.merge(&b, &[Leg::new(0, 0)], &[Leg::new(1, 0)]).unwrap();
        assert_eq!(ab.tracable(), &[Leg::new(0, 1)]);
        assert_eq!(ab.code().n(), 6);
        assert_eq!(ab.rank(), 2);
        assert_eq!(ab.nodes().len(), 2);
    }
}
