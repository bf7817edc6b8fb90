//! Networks of stabilizer tensors and the computation of their weight
//! enumerators.
//!
//! A [`TensorNetwork`] owns a set of [`StabilizerCodeTensor`] nodes and an
//! append-only list of declared [`Trace`]s between their legs. Querying an
//! enumerator freezes the trace list, plans a [`ContractionTree`], checks it
//! against the declared traces, enumerates every node locally, and then
//! combines the resulting [`Pte`]s along the tree. Legs that are neither
//! traced nor requested as open are the physical qubits of the composite
//! code, and contribute to weight.

use std::{
    collections::{ BTreeMap, BTreeSet },
    fmt,
    fs,
    io::Write,
    path::Path,
    sync::Arc,
};
use itertools::Itertools;
use ndarray as nd;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::{ FxHashMap, FxHashSet };
use thiserror::Error;
use tracing::{ debug, info };
use crate::{
    pauli::Pauli,
    poly::Poly,
    tensor::{
        Leg,
        NodeId,
        Pte,
        StabilizerCodeTensor,
        TensorError,
        Wep,
    },
};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("tensor error: {0}")]
    TensorError(#[from] TensorError),

    #[error("error adding node: duplicate node {0}")]
    DuplicateNode(NodeId),

    #[error("error adding node: leg {0} already belongs to another node")]
    DuplicateLeg(Leg),

    #[error("missing node {0}")]
    MissingNode(NodeId),

    #[error("error adding trace: leg {leg} does not belong to node {node}")]
    ForeignLeg { leg: Leg, node: NodeId },

    #[error("error adding trace: node {node} has no leg at index {index}")]
    LegIndexOutOfRange { node: NodeId, index: usize },

    #[error("error adding trace: leg {0} is already joined")]
    LegAlreadyJoined(Leg),

    /// Also returned for a trace with no legs.
    #[error("error adding trace: cannot pair {0} leg(s) with {1} leg(s)")]
    LegCountMismatch(usize, usize),

    #[error("error adding trace: the contraction schedule is frozen")]
    Frozen,

    #[error("unknown leg {0}")]
    UnknownLeg(Leg),

    #[error("open leg {0} is traced")]
    OpenLegTraced(Leg),

    #[error("contraction plan does not match the declared traces: {0}")]
    PlanMismatch(String),

    #[error("network has no nodes")]
    EmptyNetwork,

    #[error("shape error: {0}")]
    ShapeError(#[from] nd::ShapeError),

    #[error("error rendering graph: {0}")]
    GraphvizError(String),

    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
}
pub type NetworkResult<T> = Result<T, NetworkError>;

pub(crate) mod config;
pub use config::*;

pub(crate) mod tree;
pub use tree::{ ContractionTree, Step };

pub(crate) mod cost;
pub use cost::*;

pub(crate) mod planner;
pub use planner::*;

pub(crate) mod tanner;
pub use tanner::*;

pub(crate) mod surface;
pub use surface::*;

/// A declared contraction between legs `legs_a` of node `node_a` and
/// `legs_b` of node `node_b`, pairing them up in order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Trace {
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub legs_a: Vec<Leg>,
    pub legs_b: Vec<Leg>,
}

impl Trace {
    /// Create a new trace.
    pub fn new(node_a: NodeId, node_b: NodeId, legs_a: Vec<Leg>, legs_b: Vec<Leg>)
        -> Self
    {
        Self { node_a, node_b, legs_a, legs_b }
    }

    /// Return `true` if both ends are on the same node.
    pub fn is_self_trace(&self) -> bool { self.node_a == self.node_b }

    /// Return `true` if `leg` is on either end.
    pub fn contains(&self, leg: &Leg) -> bool {
        self.legs_a.contains(leg) || self.legs_b.contains(leg)
    }

    /// Return an iterator over the contracted leg pairs.
    pub fn leg_pairs(&self) -> impl Iterator<Item = (Leg, Leg)> + '_ {
        self.legs_a.iter().copied().zip(self.legs_b.iter().copied())
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] ~ {}[{}]",
            self.node_a,
            self.legs_a.iter().map(|leg| leg.index).join(", "),
            self.node_b,
            self.legs_b.iter().map(|leg| leg.index).join(", "),
        )
    }
}

/// The trace list of a network: open for additions until the first result is
/// computed, then frozen for good.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schedule {
    Building(Vec<Trace>),
    Frozen(Arc<[Trace]>),
}

impl Default for Schedule {
    fn default() -> Self { Self::Building(Vec::new()) }
}

impl Schedule {
    /// Return the declared traces.
    pub fn traces(&self) -> &[Trace] {
        match self {
            Self::Building(traces) => traces,
            Self::Frozen(traces) => traces,
        }
    }

    /// Return `true` if `self` is `Frozen`.
    pub fn is_frozen(&self) -> bool { matches!(self, Self::Frozen(_)) }

    // freeze if not already, returning the frozen trace list
    fn freeze(&mut self) -> Arc<[Trace]> {
        match self {
            Self::Building(traces) => {
                let frozen: Arc<[Trace]> = std::mem::take(traces).into();
                *self = Self::Frozen(frozen.clone());
                frozen
            },
            Self::Frozen(traces) => traces.clone(),
        }
    }
}

/// A [`TensorNetwork`] equivalent to a stabilizer code, along with the legs
/// that carry its physical qubits.
#[derive(Clone, Debug)]
pub struct CodeNetwork {
    /// The network itself. No traces have been contracted yet.
    pub network: TensorNetwork,
    /// `qubit_legs[j]` is the dangling leg of qubit `j`.
    pub qubit_legs: Vec<Leg>,
}

// (open legs, truncation length)
type MemoKey = (Vec<Leg>, Option<usize>);

/// A network of stabilizer tensors joined by declared traces.
#[derive(Clone, Debug, Default)]
pub struct TensorNetwork {
    nodes: BTreeMap<NodeId, StabilizerCodeTensor>,
    schedule: Schedule,
    joined: FxHashSet<Leg>,
    memo: FxHashMap<MemoKey, Wep>,
}

impl TensorNetwork {
    /// Create a new network with no traces.
    ///
    /// Fails if two nodes share an ID or a leg.
    pub fn new<I>(nodes: I) -> NetworkResult<Self>
    where I: IntoIterator<Item = StabilizerCodeTensor>
    {
        let mut map: BTreeMap<NodeId, StabilizerCodeTensor> = BTreeMap::new();
        let mut seen: FxHashSet<Leg> = FxHashSet::default();
        for node in nodes.into_iter() {
            let id = node.id();
            if map.contains_key(&id) { return Err(NetworkError::DuplicateNode(id)); }
            if let Some(leg) = node.legs().iter().find(|leg| !seen.insert(**leg)) {
                return Err(NetworkError::DuplicateLeg(*leg));
            }
            map.insert(id, node);
        }
        Ok(Self { nodes: map, ..Self::default() })
    }

    /// Return all nodes, ordered by ID.
    pub fn nodes(&self) -> &BTreeMap<NodeId, StabilizerCodeTensor> { &self.nodes }

    /// Return the node with ID `id`, if it exists.
    pub fn node(&self, id: NodeId) -> Option<&StabilizerCodeTensor> {
        self.nodes.get(&id)
    }

    /// Return the declared traces, in declaration order.
    pub fn traces(&self) -> &[Trace] { self.schedule.traces() }

    /// Return the schedule.
    pub fn schedule(&self) -> &Schedule { &self.schedule }

    /// Return `true` if no more traces can be declared.
    pub fn is_frozen(&self) -> bool { self.schedule.is_frozen() }

    /// Return all legs that are not part of any trace, ordered by node and
    /// then by position.
    pub fn dangling_legs(&self) -> Vec<Leg> {
        self.nodes.values()
            .flat_map(|node| node.legs().iter())
            .filter(|leg| !self.joined.contains(*leg))
            .copied()
            .collect()
    }

    // find the node a leg belongs to
    fn owner(&self, leg: &Leg) -> Option<NodeId> {
        self.nodes.get(&leg.node)
            .filter(|node| node.leg_position(leg).is_some())
            .map(|node| node.id())
            .or_else(|| {
                self.nodes.values()
                    .find(|node| node.leg_position(leg).is_some())
                    .map(|node| node.id())
            })
    }

    /// Declare a trace between `legs_a` of node `node_a` and `legs_b` of node
    /// `node_b`, pairing them up in order. `node_a` and `node_b` may be the
    /// same node.
    ///
    /// Fails if the schedule is frozen, if the leg lists differ in length or
    /// are empty, if a leg does not belong to its node, or if a leg is
    /// already part of a trace. Nothing is changed on failure.
    pub fn self_trace(
        &mut self,
        node_a: NodeId,
        node_b: NodeId,
        legs_a: &[Leg],
        legs_b: &[Leg],
    ) -> NetworkResult<&mut Self>
    {
        if self.schedule.is_frozen() { return Err(NetworkError::Frozen); }
        if legs_a.len() != legs_b.len() || legs_a.is_empty() {
            return Err(NetworkError::LegCountMismatch(legs_a.len(), legs_b.len()));
        }
        for (id, legs) in [(node_a, legs_a), (node_b, legs_b)] {
            let node = self.nodes.get(&id).ok_or(NetworkError::MissingNode(id))?;
            if let Some(leg) = legs.iter().find(|l| node.leg_position(l).is_none()) {
                return Err(NetworkError::ForeignLeg { leg: *leg, node: id });
            }
        }
        let mut new: FxHashSet<Leg> = FxHashSet::default();
        for leg in legs_a.iter().chain(legs_b) {
            if self.joined.contains(leg) || !new.insert(*leg) {
                return Err(NetworkError::LegAlreadyJoined(*leg));
            }
        }
        self.joined.extend(new);
        if let Schedule::Building(traces) = &mut self.schedule {
            traces.push(Trace::new(node_a, node_b, legs_a.to_vec(), legs_b.to_vec()));
        }
        Ok(self)
    }

    /// Like [`self_trace`][Self::self_trace], but naming legs by their
    /// positions on their nodes.
    pub fn self_trace_idx(
        &mut self,
        node_a: NodeId,
        node_b: NodeId,
        idx_a: &[usize],
        idx_b: &[usize],
    ) -> NetworkResult<&mut Self>
    {
        let legs_at = |id: NodeId, idx: &[usize]| -> NetworkResult<Vec<Leg>> {
            let node = self.nodes.get(&id).ok_or(NetworkError::MissingNode(id))?;
            idx.iter()
                .map(|&index| {
                    node.leg(index)
                        .ok_or(NetworkError::LegIndexOutOfRange { node: id, index })
                })
                .collect()
        };
        let legs_a = legs_at(node_a, idx_a)?;
        let legs_b = legs_at(node_b, idx_b)?;
        self.self_trace(node_a, node_b, &legs_a, &legs_b)
    }

    /// Apply a fixed Pauli error to the network: each `(leg, pauli)` pair
    /// becomes a coset flip on the node owning `leg`, replacing any previous
    /// flips. Nodes not named are left unflipped.
    ///
    /// This discards memoized results, but does not unfreeze the schedule.
    /// Nothing is changed on failure.
    pub fn set_coset(&mut self, error: &[(Leg, Pauli)]) -> NetworkResult<()> {
        let mut by_node: BTreeMap<NodeId, Vec<(Leg, Pauli)>> = BTreeMap::new();
        for (leg, pauli) in error.iter() {
            let id = self.owner(leg).ok_or(NetworkError::UnknownLeg(*leg))?;
            by_node.entry(id).or_default().push((*leg, *pauli));
        }
        let mut updated: BTreeMap<NodeId, StabilizerCodeTensor> = BTreeMap::new();
        for (id, node) in self.nodes.iter() {
            let mut node = node.clone();
            match by_node.get(id) {
                Some(flips) => { node.set_coset(flips)?; },
                None => { node.clear_coset(); },
            }
            updated.insert(*id, node);
        }
        self.nodes = updated;
        self.memo.clear();
        debug!(flips = error.len(), nodes = by_node.len(), "set coset");
        Ok(())
    }

    fn check_open_legs(&self, open_legs: &[Leg]) -> NetworkResult<()> {
        let mut seen: FxHashSet<Leg> = FxHashSet::default();
        for leg in open_legs.iter() {
            if !seen.insert(*leg) {
                return Err(TensorError::DuplicateLeg(*leg).into());
            }
            if self.owner(leg).is_none() {
                return Err(NetworkError::UnknownLeg(*leg));
            }
            if self.joined.contains(leg) {
                return Err(NetworkError::OpenLegTraced(*leg));
            }
        }
        Ok(())
    }

    /// Compute the weight enumerator of the network, leaving `open_legs` open.
    ///
    /// With no open legs, the result is the scalar enumerator of the
    /// composite code, [normalized][Poly::normalize]. Otherwise it is a
    /// tensor keyed by the Paulis on `open_legs`, in that order, holding raw
    /// counts (see [`Wep::normalize`]). Either way, weight is counted on the
    /// dangling legs that are not open.
    ///
    /// The first call freezes the schedule. Results are memoized per open leg
    /// list and truncation length until [`set_coset`][Self::set_coset] is
    /// called.
    pub fn stabilizer_enumerator_polynomial(
        &mut self,
        open_legs: &[Leg],
        config: &ContractionConfig,
    ) -> NetworkResult<Wep>
    {
        if self.nodes.is_empty() { return Err(NetworkError::EmptyNetwork); }
        self.check_open_legs(open_legs)?;
        let traces = self.schedule.freeze();
        let key: MemoKey = (open_legs.to_vec(), config.truncate_length);
        if let Some(wep) = self.memo.get(&key) {
            debug!(open = open_legs.len(), "memoized result");
            return Ok(wep.clone());
        }

        let cost = config.cost.visitor();
        let ctx = PlanContext { nodes: &self.nodes, traces: &traces, open_legs };
        info!(
            nodes = self.nodes.len(),
            traces = traces.len(),
            open = open_legs.len(),
            planner = ?config.planner,
            cost = cost.name(),
            truncate = ?config.truncate_length,
            "contracting network"
        );
        let tree =
            match &config.planner {
                Planner::Declared => DeclaredOrder.plan(&ctx, cost)?,
                Planner::Greedy => GreedyPlanner.plan(&ctx, cost)?,
                Planner::Custom(planner) => planner.plan(&ctx, cost)?,
            };
        let ids: BTreeSet<NodeId> = self.nodes.keys().copied().collect();
        tree.verify(&ids, &traces)?;

        let leaves = leaf_ptes(&ctx, config)?;
        let wep =
            match tree.execute(&traces, leaves, config.parallel)? {
                Some(pte) => pte.into_wep(open_legs)?,
                None => empty_wep(open_legs),
            };
        info!(steps = tree.len(), entries = wep.len(), "finished contraction");
        self.memo.insert(key, wep.clone());
        Ok(wep)
    }

    /// Shorthand for the scalar enumerator with no open legs.
    pub fn scalar_enumerator(&mut self, config: &ContractionConfig)
        -> NetworkResult<Poly>
    {
        let wep = self.stabilizer_enumerator_polynomial(&[], config)?;
        Ok(wep.into_scalar().unwrap_or_default())
    }

    /// Contract the whole network at the level of parity-check matrices, in
    /// declaration order, into a single tensor carrying all dangling legs.
    ///
    /// This is exponentially cheaper to compute than an enumerator but gives
    /// only the stabilizer group itself; enumerating the result brute-force is
    /// a check on the contraction engine. Does not freeze the schedule.
    pub fn conjoin_nodes(&self) -> NetworkResult<StabilizerCodeTensor> {
        if self.nodes.is_empty() { return Err(NetworkError::EmptyNetwork); }
        let traces = self.schedule.traces();
        let tree = ContractionTree::declared(self.nodes.keys().copied(), traces)?;
        let mut slots: Vec<Option<StabilizerCodeTensor>> = vec![None; tree.len()];
        for (k, step) in tree.steps().iter().enumerate() {
            let res =
                match step {
                    Step::Leaf(id) => {
                        self.nodes.get(id).cloned()
                            .ok_or(NetworkError::MissingNode(*id))?
                    },
                    Step::SelfTrace { child, traces: tr } => {
                        let t = take_slot(&mut slots, *child)?;
                        let (la, lb) = tree::collect_legs(tr, traces, |_| true);
                        t.self_trace(&la, &lb)?
                    },
                    Step::Merge { left, right, traces: tr } => {
                        let l = take_slot(&mut slots, *left)?;
                        let r = take_slot(&mut slots, *right)?;
                        let (ll, rl) =
                            tree::collect_legs(tr, traces, |t| {
                                t.legs_a.first()
                                    .is_some_and(|leg| l.leg_position(leg).is_some())
                            });
                        l.conjoin(&r, &ll, &rl)?
                    },
                    Step::Product { left, right } => {
                        let l = take_slot(&mut slots, *left)?;
                        let r = take_slot(&mut slots, *right)?;
                        l.tensor_with(&r)?
                    },
                };
            slots[k] = Some(res);
        }
        tree.root()
            .and_then(|k| slots[k].take())
            .ok_or(NetworkError::EmptyNetwork)
    }

    /// Render the network as a graph: one node per tensor (labelled by ID and
    /// [[*n*, *k*]], colored if it carries coset flips), one edge per traced
    /// leg pair, and one plaintext endpoint per dangling leg.
    pub fn to_graphviz(&self) -> NetworkResult<tabbycat::Graph> {
        use tabbycat::*;
        use tabbycat::attributes::*;
        use crate::vizdefs::*;
        let mut statements =
            StmtList::new()
            .add_attr(
                AttrType::Node,
                AttrList::new()
                    .add_pair(fontname(FONT))
                    .add_pair(fontsize(FONTSIZE))
                    .add_pair(margin(NODE_MARGIN)),
            );
        for (id, node) in self.nodes.iter() {
            let fill =
                if node.coset_flips().is_empty() { NODE_COLOR } else { COSET_COLOR };
            let attrs =
                AttrList::new()
                .add_pair(label(format!("{}: [[{}, {}]]", id, node.n(), node.k())))
                .add_pair(shape(Shape::Circle))
                .add_pair(height(CIRCLE_HEIGHT))
                .add_pair(style(Style::Filled))
                .add_pair(fillcolor(fill));
            statements = statements.add_node((*id).into(), None, Some(attrs));
        }
        for trace in self.schedule.traces().iter() {
            for (la, lb) in trace.leg_pairs() {
                let mut edge =
                    Edge::head_node(trace.node_a.into(), None)
                    .line_to_node(trace.node_b.into(), None)
                    .add_attrpair(label(format!("{}-{}", la.index, lb.index)));
                if trace.is_self_trace() {
                    edge = edge.add_attrpair(color(SELF_WIRE));
                }
                statements = statements.add_edge(edge);
            }
        }
        // dangling legs get fresh IDs past the largest node ID
        let mut next: usize = self.nodes.keys().next_back().map_or(0, |id| id + 1);
        for (id, node) in self.nodes.iter() {
            for leg in node.legs().iter().filter(|l| !self.joined.contains(*l)) {
                let attrs =
                    AttrList::new()
                    .add_pair(label(format!("{}", leg)))
                    .add_pair(shape(Shape::Plaintext));
                statements =
                    statements
                    .add_node(next.into(), None, Some(attrs))
                    .add_edge(
                        Edge::head_node((*id).into(), None)
                        .line_to_node(next.into(), None)
                    );
                next += 1;
            }
        }
        GraphBuilder::default()
            .graph_type(GraphType::Graph)
            .strict(false)
            .id(Identity::quoted(""))
            .stmts(statements)
            .build()
            .map_err(|e| NetworkError::GraphvizError(e.to_string()))
    }

    /// Like [`to_graphviz`][Self::to_graphviz], but render directly to a string
    /// and write it to `path`.
    pub fn save_graphviz<P>(&self, path: P) -> NetworkResult<()>
    where P: AsRef<Path>
    {
        let graphviz = self.to_graphviz()?;
        fs::OpenOptions::new()
            .write(true)
            .append(false)
            .create(true)
            .truncate(true)
            .open(path)?
            .write_all(format!("{}", graphviz).as_bytes())?;
        Ok(())
    }
}

fn take_slot<T>(slots: &mut [Option<T>], k: usize) -> NetworkResult<T> {
    slots.get_mut(k).and_then(|slot| slot.take())
        .ok_or_else(|| NetworkError::PlanMismatch(
            format!("output of step {} is missing", k)))
}

fn empty_wep(open_legs: &[Leg]) -> Wep {
    if open_legs.is_empty() {
        Wep::Scalar(Poly::zero())
    } else {
        Wep::Tensor { legs: open_legs.to_vec(), tensor: FxHashMap::default() }
    }
}

// enumerate every node with its traced and open legs as tracable
fn leaf_ptes(ctx: &PlanContext<'_>, config: &ContractionConfig)
    -> NetworkResult<BTreeMap<NodeId, Pte>>
{
    let enumerate = |(id, node): (&NodeId, &StabilizerCodeTensor)|
        -> NetworkResult<(NodeId, Pte)>
    {
        let legs = ctx.tracable_legs(*id);
        let pte =
            node.enumerate_with(&legs, config.truncate_length, config.parallel)?;
        Ok((*id, pte))
    };

    #[cfg(feature = "parallel")]
    if config.parallel {
        return ctx.nodes.par_iter().map(enumerate).collect();
    }

    ctx.nodes.iter().map(enumerate).collect()
}
