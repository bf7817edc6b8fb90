//! Contraction trees: explicit, arena-allocated orderings of the pairwise
//! operations that reduce a network to a single enumerator.

use std::collections::{ BTreeMap, BTreeSet };
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{ debug, warn };
use crate::tensor::{ Leg, NodeId, Pte };
use super::{ NetworkError, NetworkResult, Trace };

/// A single operation in a [`ContractionTree`].
///
/// Child fields are indices of earlier steps in the same tree; trace fields are
/// indices into the network's declared trace list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The enumerator of a single node.
    Leaf(NodeId),
    /// Contract traces whose endpoints both lie in the sub-network of `child`.
    SelfTrace { child: usize, traces: Vec<usize> },
    /// Join two sub-networks along traces that connect them.
    Merge { left: usize, right: usize, traces: Vec<usize> },
    /// Combine two unconnected sub-networks.
    Product { left: usize, right: usize },
}

impl Step {
    /// Return the indices of the steps this step consumes.
    pub fn children(&self) -> Vec<usize> {
        match self {
            Self::Leaf(_) => Vec::new(),
            Self::SelfTrace { child, .. } => vec![*child],
            Self::Merge { left, right, .. } => vec![*left, *right],
            Self::Product { left, right } => vec![*left, *right],
        }
    }

    /// Return the declared traces this step contracts.
    pub fn traces(&self) -> &[usize] {
        match self {
            Self::SelfTrace { traces, .. } => traces,
            Self::Merge { traces, .. } => traces,
            Self::Leaf(_) | Self::Product { .. } => &[],
        }
    }
}

/// A binary contraction tree, stored as an arena of [`Step`]s in which every
/// step appears after its children. The last step is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractionTree {
    steps: Vec<Step>,
}

impl ContractionTree {
    /// Create a new, empty tree.
    pub fn new() -> Self { Self::default() }

    fn push(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    /// Add a leaf for node `node`, returning its index.
    pub fn leaf(&mut self, node: NodeId) -> usize { self.push(Step::Leaf(node)) }

    /// Add a self-trace of `child`, returning its index.
    pub fn self_trace(&mut self, child: usize, traces: Vec<usize>) -> usize {
        self.push(Step::SelfTrace { child, traces })
    }

    /// Add a merge of `left` and `right`, returning its index.
    pub fn merge(&mut self, left: usize, right: usize, traces: Vec<usize>)
        -> usize
    {
        self.push(Step::Merge { left, right, traces })
    }

    /// Add a product of `left` and `right`, returning its index.
    pub fn product(&mut self, left: usize, right: usize) -> usize {
        self.push(Step::Product { left, right })
    }

    /// Return all steps, children first.
    pub fn steps(&self) -> &[Step] { &self.steps }

    /// Return the number of steps.
    pub fn len(&self) -> usize { self.steps.len() }

    /// Return `true` if the tree has no steps.
    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    /// Return the index of the root step.
    pub fn root(&self) -> Option<usize> { self.steps.len().checked_sub(1) }

    /// Build the tree that contracts traces exactly in declaration order.
    ///
    /// Each trace becomes a merge if its endpoints are in different
    /// sub-networks and a self-trace otherwise. Sub-networks left unconnected
    /// are combined by products at the end.
    pub fn declared<I>(nodes: I, traces: &[Trace]) -> NetworkResult<Self>
    where I: IntoIterator<Item = NodeId>
    {
        let mut tree = Self::new();
        // node -> component label; component label -> current step
        let mut comp: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut top: BTreeMap<NodeId, usize> = BTreeMap::new();
        for id in nodes.into_iter() {
            let k = tree.leaf(id);
            comp.insert(id, id);
            top.insert(id, k);
        }
        for (i, trace) in traces.iter().enumerate() {
            let ca = *comp.get(&trace.node_a)
                .ok_or(NetworkError::MissingNode(trace.node_a))?;
            let cb = *comp.get(&trace.node_b)
                .ok_or(NetworkError::MissingNode(trace.node_b))?;
            let sa = top[&ca];
            if ca == cb {
                let k = tree.self_trace(sa, vec![i]);
                top.insert(ca, k);
            } else {
                let sb = top[&cb];
                let k = tree.merge(sa, sb, vec![i]);
                top.remove(&cb);
                top.insert(ca, k);
                comp.values_mut().filter(|c| **c == cb).for_each(|c| { *c = ca; });
            }
        }
        let mut remaining = top.into_values();
        if let Some(first) = remaining.next() {
            remaining.fold(first, |acc, k| tree.product(acc, k));
        }
        Ok(tree)
    }

    /// Return the declared trace indices in the order they are contracted.
    pub fn linearize(&self) -> Vec<usize> {
        self.steps.iter()
            .flat_map(|step| step.traces().iter().copied())
            .collect()
    }

    // node set of each step's sub-network
    fn subtree_nodes(&self) -> Vec<BTreeSet<NodeId>> {
        let mut acc: Vec<BTreeSet<NodeId>> = Vec::with_capacity(self.steps.len());
        for step in self.steps.iter() {
            let nodes: BTreeSet<NodeId> =
                match step {
                    Step::Leaf(id) => [*id].into_iter().collect(),
                    _ => step.children().into_iter()
                        .filter_map(|c| acc.get(c))
                        .flat_map(|s| s.iter().copied())
                        .collect(),
                };
            acc.push(nodes);
        }
        acc
    }

    /// Check that `self` is a valid contraction of a network with the given
    /// nodes and declared traces.
    ///
    /// The tree must consume every step except the root exactly once, only
    /// refer to earlier steps, hold exactly one leaf per node, and contract
    /// exactly the declared traces (as a multiset), each at a step that joins
    /// both of its endpoints. Any discrepancy is returned as
    /// [`NetworkError::PlanMismatch`].
    pub fn verify(&self, nodes: &BTreeSet<NodeId>, traces: &[Trace])
        -> NetworkResult<()>
    {
        let mismatch = |msg: String| Err(NetworkError::PlanMismatch(msg));
        let Some(root) = self.root() else {
            return mismatch("empty contraction tree".into());
        };
        let mut used: Vec<bool> = vec![false; self.steps.len()];
        let mut leaves: BTreeSet<NodeId> = BTreeSet::new();
        for (k, step) in self.steps.iter().enumerate() {
            if let Step::Leaf(id) = step {
                if !leaves.insert(*id) {
                    return mismatch(format!("node {} appears in two leaves", id));
                }
            }
            for c in step.children() {
                if c >= k {
                    return mismatch(format!("step {} refers to later step {}", k, c));
                }
                if used[c] {
                    return mismatch(format!("step {} is consumed twice", c));
                }
                used[c] = true;
            }
        }
        if let Some(k) = (0 .. root).find(|k| !used[*k]) {
            return mismatch(format!("step {} is never consumed", k));
        }
        if &leaves != nodes {
            return mismatch(format!(
                "leaves {:?} do not match network nodes {:?}", leaves, nodes));
        }

        let mut order = self.linearize();
        order.sort_unstable();
        let expected: Vec<usize> = (0 .. traces.len()).collect();
        if order != expected {
            return mismatch(format!(
                "contracted traces {:?} do not match declared traces {:?}",
                order, expected,
            ));
        }

        let sub = self.subtree_nodes();
        for (k, step) in self.steps.iter().enumerate() {
            match step {
                Step::SelfTrace { child, traces: tr } => {
                    for &t in tr.iter() {
                        let trace = &traces[t];
                        if !sub[*child].contains(&trace.node_a)
                            || !sub[*child].contains(&trace.node_b)
                        {
                            return mismatch(format!(
                                "step {} self-traces {} outside its sub-network",
                                k, trace,
                            ));
                        }
                    }
                },
                Step::Merge { left, right, traces: tr } => {
                    if tr.is_empty() {
                        return mismatch(format!("merge step {} has no traces", k));
                    }
                    for &t in tr.iter() {
                        let trace = &traces[t];
                        let (a, b) = (&trace.node_a, &trace.node_b);
                        let joins =
                            (sub[*left].contains(a) && sub[*right].contains(b))
                            || (sub[*left].contains(b) && sub[*right].contains(a));
                        if !joins {
                            return mismatch(format!(
                                "step {} merges along {}, which does not join its inputs",
                                k, trace,
                            ));
                        }
                    }
                },
                Step::Leaf(_) | Step::Product { .. } => { },
            }
        }
        Ok(())
    }

    // group steps by height, leaves first
    fn levels(&self) -> Vec<Vec<usize>> {
        let mut height: Vec<usize> = Vec::with_capacity(self.steps.len());
        for step in self.steps.iter() {
            let h =
                step.children().into_iter()
                .map(|c| height[c] + 1)
                .max()
                .unwrap_or(0);
            height.push(h);
        }
        let max = height.iter().copied().max().unwrap_or(0);
        let mut levels: Vec<Vec<usize>> = vec![Vec::new(); max + 1];
        height.into_iter().enumerate().for_each(|(k, h)| { levels[h].push(k); });
        levels
    }

    /// Execute the tree on a set of leaf enumerators, one per node.
    ///
    /// Steps of equal height are independent and run concurrently if
    /// `parallel` is `true` and the `parallel` feature is enabled. Returns
    /// `None` if some step produces an empty enumerator, in which case the
    /// final result would also be empty.
    ///
    /// The tree is first [verified][Self::verify] against `traces` and the
    /// nodes of `leaves`.
    pub fn execute(
        &self,
        traces: &[Trace],
        mut leaves: BTreeMap<NodeId, Pte>,
        parallel: bool,
    ) -> NetworkResult<Option<Pte>>
    {
        let nodes: BTreeSet<NodeId> = leaves.keys().copied().collect();
        self.verify(&nodes, traces)?;
        let Some(root) = self.root() else {
            return Err(NetworkError::EmptyNetwork);
        };
        let mut slots: Vec<Option<Pte>> = vec![None; self.steps.len()];
        for level in self.levels().into_iter() {
            let results: Vec<Pte> =
                if level.len() > 1 {
                    self.run_level(&level, traces, &slots, &mut leaves, parallel)?
                } else {
                    self.run_level(&level, traces, &slots, &mut leaves, false)?
                };
            for (k, pte) in level.iter().zip(results) {
                if pte.is_empty() {
                    warn!(step = k, "contraction emptied by truncation; stopping early");
                    return Ok(None);
                }
                slots[*k] = Some(pte);
            }
            // inputs are consumed exactly once
            for k in level.iter() {
                self.steps[*k].children().into_iter()
                    .for_each(|c| { slots[c] = None; });
            }
        }
        slots[root].take()
            .map(Some)
            .ok_or_else(|| NetworkError::PlanMismatch("root step never ran".into()))
    }

    fn run_level(
        &self,
        level: &[usize],
        traces: &[Trace],
        slots: &[Option<Pte>],
        leaves: &mut BTreeMap<NodeId, Pte>,
        parallel: bool,
    ) -> NetworkResult<Vec<Pte>>
    {
        // leaves are moved out before anything runs concurrently
        let mut leaf_ptes: BTreeMap<usize, Pte> = BTreeMap::new();
        for &k in level.iter() {
            if let Step::Leaf(id) = &self.steps[k] {
                let pte = leaves.remove(id).ok_or(NetworkError::MissingNode(*id))?;
                leaf_ptes.insert(k, pte);
            }
        }
        let run = |k: &usize| -> NetworkResult<Pte> {
            match leaf_ptes.get(k) {
                Some(pte) => Ok(pte.clone()),
                None => self.run_step(*k, traces, slots),
            }
        };

        #[cfg(feature = "parallel")]
        if parallel {
            return level.par_iter().map(run).collect();
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        level.iter().map(run).collect()
    }

    fn run_step(&self, k: usize, traces: &[Trace], slots: &[Option<Pte>])
        -> NetworkResult<Pte>
    {
        let input = |c: usize| -> NetworkResult<&Pte> {
            slots[c].as_ref()
                .ok_or_else(|| NetworkError::PlanMismatch(
                    format!("step {} needs the missing output of step {}", k, c)))
        };
        let res =
            match &self.steps[k] {
                Step::Leaf(id) => {
                    return Err(NetworkError::MissingNode(*id));
                },
                Step::SelfTrace { child, traces: tr } => {
                    let pte = input(*child)?;
                    let (la, lb) = collect_legs(tr, traces, |_| true);
                    let res = pte.self_trace(&la, &lb)?;
                    debug!(
                        step = k,
                        kind = "self-trace",
                        traces = tr.len(),
                        input = pte.len(),
                        output = res.len(),
                        legs = res.legs().len(),
                        "contraction step"
                    );
                    res
                },
                Step::Merge { left, right, traces: tr } => {
                    let (l, r) = (input(*left)?, input(*right)?);
                    let (ll, rl) =
                        collect_legs(tr, traces, |t| l.nodes().contains(&t.node_a));
                    let res = l.merge(r, &ll, &rl)?;
                    debug!(
                        step = k,
                        kind = "merge",
                        traces = tr.len(),
                        left = l.len(),
                        right = r.len(),
                        output = res.len(),
                        legs = res.legs().len(),
                        "contraction step"
                    );
                    res
                },
                Step::Product { left, right } => {
                    let (l, r) = (input(*left)?, input(*right)?);
                    let res = l.tensor_product(r)?;
                    debug!(
                        step = k,
                        kind = "product",
                        left = l.len(),
                        right = r.len(),
                        output = res.len(),
                        "contraction step"
                    );
                    res
                },
            };
        Ok(res)
    }
}

// gather the legs of a set of traces into two aligned lists, putting the `a`
// side first wherever `a_first` holds
pub(crate) fn collect_legs<F>(tr: &[usize], traces: &[Trace], a_first: F)
    -> (Vec<Leg>, Vec<Leg>)
where F: Fn(&Trace) -> bool
{
    let mut first: Vec<Leg> = Vec::new();
    let mut second: Vec<Leg> = Vec::new();
    for &t in tr.iter() {
        let trace = &traces[t];
        if a_first(trace) {
            first.extend_from_slice(&trace.legs_a);
            second.extend_from_slice(&trace.legs_b);
        } else {
            first.extend_from_slice(&trace.legs_b);
            second.extend_from_slice(&trace.legs_a);
        }
    }
    (first, second)
}
