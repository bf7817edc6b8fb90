//! Partially traced enumerators and the algebra for combining them.

use std::collections::BTreeSet;
use num_traits::One;
use rustc_hash::FxHashMap;
use crate::{ pauli::Pauli, poly::Poly };
use super::{ Leg, NodeId, TensorError, TensorResult, leg_positions };

/// Assignment of one Pauli to each tracable leg of a [`Pte`], in leg order.
pub type Key = Vec<Pauli>;

/// A partially traced enumerator.
///
/// Represents the weight enumerator of a sub-network as a function of the
/// Paulis on its still-open boundary ("tracable") legs: for each assignment of
/// Paulis to those legs, the stored polynomial counts the stabilizer elements
/// of the sub-network that realize exactly that assignment, by their weight on
/// all other legs. Assignments with no such elements are not stored.
///
/// All combining operations are functional and apply the enumerator's
/// truncation length, if any, to their output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pte {
    nodes: BTreeSet<NodeId>,
    legs: Vec<Leg>,
    tensor: FxHashMap<Key, Poly>,
    truncate_length: Option<usize>,
}

fn combine_truncation(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (x, None) | (None, x) => x,
    }
}

// drop entries whose minimum weight exceeds `t` and truncate the rest
fn apply_truncation(tensor: &mut FxHashMap<Key, Poly>, t: Option<usize>) {
    let Some(t) = t else { return; };
    tensor.retain(|_, poly| {
        poly.truncate_inplace(t);
        !poly.is_zero()
    });
}

impl Pte {
    /// Create a new `Pte` from its parts, applying truncation.
    ///
    /// Every key should have one entry per leg in `legs`.
    pub fn new(
        nodes: BTreeSet<NodeId>,
        legs: Vec<Leg>,
        mut tensor: FxHashMap<Key, Poly>,
        truncate_length: Option<usize>,
    ) -> Self
    {
        debug_assert!(tensor.keys().all(|key| key.len() == legs.len()));
        tensor.retain(|_, poly| !poly.is_zero());
        apply_truncation(&mut tensor, truncate_length);
        Self { nodes, legs, tensor, truncate_length }
    }

    /// Create a `Pte` with no tracable legs holding a single polynomial.
    pub fn scalar(nodes: BTreeSet<NodeId>, poly: Poly) -> Self {
        let tensor: FxHashMap<Key, Poly> =
            [(Vec::new(), poly)].into_iter().collect();
        Self::new(nodes, Vec::new(), tensor, None)
    }

    /// Return the IDs of all nodes absorbed into `self`.
    pub fn nodes(&self) -> &BTreeSet<NodeId> { &self.nodes }

    /// Return the tracable legs, in key order.
    pub fn legs(&self) -> &[Leg] { &self.legs }

    /// Return the truncation length.
    pub fn truncate_length(&self) -> Option<usize> { self.truncate_length }

    /// Return the number of stored boundary assignments.
    pub fn len(&self) -> usize { self.tensor.len() }

    /// Return `true` if no boundary assignment is stored.
    pub fn is_empty(&self) -> bool { self.tensor.is_empty() }

    /// Return the polynomial stored for a boundary assignment.
    pub fn get(&self, key: &[Pauli]) -> Option<&Poly> { self.tensor.get(key) }

    /// Return an iterator over all `(key, polynomial)` entries, in arbitrary
    /// order.
    ///
    /// The iterator item type is `(&`[`Key`]`, &`[`Poly`]`)`.
    pub fn entries(&self) -> Entries<'_> { Entries { iter: self.tensor.iter() } }

    /// Return the smallest weight across all stored polynomials.
    pub fn min_weight(&self) -> Option<usize> {
        self.tensor.values().filter_map(|poly| poly.min_weight()).min()
    }

    /// Return a copy of `self` under a new truncation length.
    ///
    /// Terms dropped by an earlier, tighter truncation are not recovered.
    pub fn truncated(&self, truncate_length: Option<usize>) -> Self {
        Self::new(
            self.nodes.clone(),
            self.legs.clone(),
            self.tensor.clone(),
            truncate_length,
        )
    }

    /// Contract the tracable legs `legs1[i]` with `legs2[i]` of `self`.
    ///
    /// Only assignments that agree on each pair of traced legs survive; traced
    /// legs are removed and polynomials at coinciding reduced keys are summed.
    pub fn self_trace(&self, legs1: &[Leg], legs2: &[Leg]) -> TensorResult<Self> {
        if legs1.len() != legs2.len() {
            return Err(TensorError::LegListMismatch(legs1.len(), legs2.len()));
        }
        let all: Vec<Leg> = legs1.iter().chain(legs2).copied().collect();
        let pos = leg_positions(&self.legs, &all)?;
        let (pos1, pos2) = pos.split_at(legs1.len());
        let keep: Vec<usize> =
            (0 .. self.legs.len()).filter(|k| !pos.contains(k)).collect();
        let mut tensor: FxHashMap<Key, Poly> = FxHashMap::default();
        for (key, poly) in self.tensor.iter() {
            if pos1.iter().zip(pos2).any(|(&a, &b)| key[a] != key[b]) {
                continue;
            }
            let reduced: Key = keep.iter().map(|&k| key[k]).collect();
            *tensor.entry(reduced).or_default() += poly;
        }
        let legs: Vec<Leg> = keep.iter().map(|&k| self.legs[k]).collect();
        Ok(Self::new(self.nodes.clone(), legs, tensor, self.truncate_length))
    }

    /// Contract the tracable legs `legs1` of `self` with `legs2` of `other`.
    ///
    /// This is a hash join on the Paulis at the contracted legs. The result
    /// keeps the remaining legs of `self` followed by the remaining legs of
    /// `other`, and stores at each combined key the sum over matching entries
    /// of the products of their polynomials.
    ///
    /// Fails if `self` and `other` share a node.
    pub fn merge(&self, other: &Self, legs1: &[Leg], legs2: &[Leg])
        -> TensorResult<Self>
    {
        if legs1.len() != legs2.len() {
            return Err(TensorError::LegListMismatch(legs1.len(), legs2.len()));
        }
        if let Some(node) = self.nodes.intersection(&other.nodes).next() {
            return Err(TensorError::OverlappingNodes(*node));
        }
        let pos1 = leg_positions(&self.legs, legs1)?;
        let pos2 = leg_positions(&other.legs, legs2)?;
        let keep1: Vec<usize> =
            (0 .. self.legs.len()).filter(|k| !pos1.contains(k)).collect();
        let keep2: Vec<usize> =
            (0 .. other.legs.len()).filter(|k| !pos2.contains(k)).collect();
        let truncate_length =
            combine_truncation(self.truncate_length, other.truncate_length);

        // index `other` on the join key
        let mut index: FxHashMap<Key, Vec<(Key, &Poly)>> = FxHashMap::default();
        for (key, poly) in other.tensor.iter() {
            let join: Key = pos2.iter().map(|&k| key[k]).collect();
            let rest: Key = keep2.iter().map(|&k| key[k]).collect();
            index.entry(join).or_default().push((rest, poly));
        }

        let mut tensor: FxHashMap<Key, Poly> = FxHashMap::default();
        for (key, poly1) in self.tensor.iter() {
            let join: Key = pos1.iter().map(|&k| key[k]).collect();
            let Some(matches) = index.get(&join) else { continue; };
            for (rest2, poly2) in matches.iter() {
                let prod = poly1.mul_truncated(poly2, truncate_length);
                if prod.is_zero() { continue; }
                let combined: Key =
                    keep1.iter().map(|&k| key[k])
                    .chain(rest2.iter().copied())
                    .collect();
                *tensor.entry(combined).or_default() += prod;
            }
        }
        let nodes: BTreeSet<NodeId> =
            self.nodes.union(&other.nodes).copied().collect();
        let legs: Vec<Leg> =
            keep1.iter().map(|&k| self.legs[k])
            .chain(keep2.iter().map(|&k| other.legs[k]))
            .collect();
        Ok(Self::new(nodes, legs, tensor, truncate_length))
    }

    /// Combine two enumerators that share no legs, taking the Cartesian
    /// product of their entries.
    pub fn tensor_product(&self, other: &Self) -> TensorResult<Self> {
        self.merge(other, &[], &[])
    }

    /// Convert into a final result, with keys reordered to follow `open_legs`.
    ///
    /// `open_legs` must name exactly the tracable legs of `self`. With no open
    /// legs, the result is the scalar enumerator, [normalized][Poly::normalize].
    /// A tensor result keeps its raw counts; see [`Wep::normalize`].
    pub fn into_wep(self, open_legs: &[Leg]) -> TensorResult<Wep> {
        if open_legs.len() != self.legs.len() {
            return Err(TensorError::LegListMismatch(open_legs.len(), self.legs.len()));
        }
        let pos = leg_positions(&self.legs, open_legs)?;
        let wep =
            if open_legs.is_empty() {
                let poly =
                    self.tensor.into_iter().next()
                    .map(|(_, poly)| poly)
                    .unwrap_or_else(Poly::zero);
                Wep::Scalar(poly.normalize())
            } else {
                let tensor: FxHashMap<Key, Poly> =
                    self.tensor.into_iter()
                    .map(|(key, poly)| (pos.iter().map(|&k| key[k]).collect(), poly))
                    .collect();
                Wep::Tensor { legs: open_legs.to_vec(), tensor }
            };
        Ok(wep)
    }
}

/// Iterator over the entries of a [`Pte`].
///
/// The iterator item type is `(&`[`Key`]`, &`[`Poly`]`)`.
#[derive(Clone)]
pub struct Entries<'a> {
    iter: std::collections::hash_map::Iter<'a, Key, Poly>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a Key, &'a Poly);

    fn next(&mut self) -> Option<Self::Item> { self.iter.next() }

    fn size_hint(&self) -> (usize, Option<usize>) { self.iter.size_hint() }
}

impl<'a> ExactSizeIterator for Entries<'a> {
    fn len(&self) -> usize { self.iter.len() }
}

impl<'a> std::iter::FusedIterator for Entries<'a> { }

/// The result of a weight-enumerator query on a network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Wep {
    /// Scalar enumerator, when no legs are left open.
    Scalar(Poly),
    /// Tensor enumerator over a set of open legs, keyed by the Paulis on those
    /// legs in the order of `legs`.
    Tensor { legs: Vec<Leg>, tensor: FxHashMap<Key, Poly> },
}

impl Wep {
    /// Return `true` if `self` is `Scalar`.
    pub fn is_scalar(&self) -> bool { matches!(self, Self::Scalar(_)) }

    /// Return a reference to the scalar enumerator, if `self` is `Scalar`.
    pub fn as_scalar(&self) -> Option<&Poly> {
        match self {
            Self::Scalar(poly) => Some(poly),
            Self::Tensor { .. } => None,
        }
    }

    /// Return the scalar enumerator, if `self` is `Scalar`.
    pub fn into_scalar(self) -> Option<Poly> {
        match self {
            Self::Scalar(poly) => Some(poly),
            Self::Tensor { .. } => None,
        }
    }

    /// Return the polynomial for a boundary assignment. A `Scalar` is stored
    /// under the empty assignment.
    pub fn get(&self, key: &[Pauli]) -> Option<&Poly> {
        match self {
            Self::Scalar(poly) => key.is_empty().then_some(poly),
            Self::Tensor { tensor, .. } => tensor.get(key),
        }
    }

    /// Return the open legs.
    pub fn legs(&self) -> &[Leg] {
        match self {
            Self::Scalar(_) => &[],
            Self::Tensor { legs, .. } => legs,
        }
    }

    /// Return the number of stored boundary assignments.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Tensor { tensor, .. } => tensor.len(),
        }
    }

    /// Return `true` if no boundary assignment is stored.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Tensor { tensor, .. } => tensor.is_empty(),
        }
    }

    /// Remove the redundancy factor left by contracting non-minimal generator
    /// sets.
    ///
    /// A scalar is [normalized][Poly::normalize] directly. A tensor is divided
    /// by the identity coefficient of its all-identity entry, when that is
    /// greater than 1. Tensors returned by a network query are not normalized
    /// unless this is called.
    pub fn normalize(self) -> Self {
        match self {
            Self::Scalar(poly) => Self::Scalar(poly.normalize()),
            Self::Tensor { legs, tensor } => {
                let ident: Key = vec![Pauli::I; legs.len()];
                let factor =
                    tensor.get(&ident)
                    .and_then(|poly| poly.get(0))
                    .filter(|c0| !c0.is_one())
                    .cloned();
                match factor {
                    Some(d) => {
                        let tensor: FxHashMap<Key, Poly> =
                            tensor.into_iter()
                            .map(|(key, poly)| (key, poly.div_coeffs(&d)))
                            .filter(|(_, poly)| !poly.is_zero())
                            .collect();
                        Self::Tensor { legs, tensor }
                    },
                    None => Self::Tensor { legs, tensor },
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Pauli::*;

    fn poly(coeffs: &[(usize, u64)]) -> Poly {
        Poly::from_coeffs(coeffs.iter().copied())
    }

    fn pte(
        node: NodeId,
        legs: &[Leg],
        entries: &[(&[Pauli], &[(usize, u64)])],
        truncate: Option<usize>,
    ) -> Pte
    {
        let tensor: FxHashMap<Key, Poly> =
            entries.iter()
            .map(|(key, coeffs)| (key.to_vec(), poly(coeffs)))
            .collect();
        Pte::new([node].into_iter().collect(), legs.to_vec(), tensor, truncate)
    }

    // [[4, 2, 2]] node with legs 0 and 1 open
    fn two_open(node: NodeId) -> Pte {
        let legs = [Leg::new(node, 0), Leg::new(node, 1)];
        pte(
            node,
            &legs,
            &[
                (&[I, I], &[(0, 1)]),
                (&[X, X], &[(2, 1)]),
                (&[Z, Z], &[(2, 1)]),
                (&[Y, Y], &[(2, 1)]),
            ],
            None,
        )
    }

    #[test]
    fn self_trace_filters_keys() {
        let p = two_open(0);
        let traced = p.self_trace(&[Leg::new(0, 0)], &[Leg::new(0, 1)]).unwrap();
        assert!(traced.legs().is_empty());
        assert_eq!(traced.get(&[]), Some(&poly(&[(0, 1), (2, 3)])));
        assert!(matches!(
            p.self_trace(&[Leg::new(0, 0)], &[Leg::new(0, 0)]),
            Err(TensorError::DuplicateLeg(_)),
        ));
        assert!(matches!(
            p.self_trace(&[Leg::new(0, 0)], &[]),
            Err(TensorError::LegListMismatch(1, 0)),
        ));
    }

    #[test]
    fn merge_joins_on_keys() {
        let (a, b) = (two_open(0), two_open(1));
        let m = a.merge(&b, &[Leg::new(0, 1)], &[Leg::new(1, 0)]).unwrap();
        assert_eq!(m.legs(), &[Leg::new(0, 0), Leg::new(1, 1)]);
        assert_eq!(m.nodes().len(), 2);
        assert_eq!(m.len(), 4);
        assert_eq!(m.get(&[X, X]), Some(&poly(&[(4, 1)])));
        assert_eq!(m.get(&[X, Z]), None);
        let closed =
            m.self_trace(&[Leg::new(0, 0)], &[Leg::new(1, 1)]).unwrap();
        assert_eq!(closed.get(&[]), Some(&poly(&[(0, 1), (4, 3)])));
        assert!(matches!(
            a.merge(&a, &[Leg::new(0, 1)], &[Leg::new(0, 0)]),
            Err(TensorError::OverlappingNodes(0)),
        ));
    }

    #[test]
    fn merge_is_order_independent() {
        let (a, b) = (two_open(0), two_open(1));
        let ab = a.merge(&b, &[Leg::new(0, 1)], &[Leg::new(1, 0)]).unwrap();
        let ba = b.merge(&a, &[Leg::new(1, 0)], &[Leg::new(0, 1)]).unwrap();
        let open = [Leg::new(0, 0), Leg::new(1, 1)];
        assert_eq!(
            ab.into_wep(&open).unwrap(),
            ba.into_wep(&open).unwrap(),
        );
    }

    #[test]
    fn tensor_product_and_truncation() {
        let a = pte(0, &[], &[(&[], &[(0, 1), (4, 3)])], None);
        let b = pte(1, &[Leg::new(1, 0)], &[(&[I], &[(0, 1)]), (&[X], &[(3, 2)])], None);
        let ab = a.tensor_product(&b).unwrap();
        assert_eq!(ab.get(&[X]), Some(&poly(&[(3, 2), (7, 6)])));
        let t = ab.truncated(Some(4));
        assert_eq!(t.get(&[X]), Some(&poly(&[(3, 2)])));
        assert_eq!(t.get(&[I]), Some(&poly(&[(0, 1), (4, 3)])));
        assert_eq!(t.min_weight(), Some(0));
        let t = ab.truncated(Some(2));
        assert_eq!(t.get(&[X]), None);
        assert_eq!(t.len(), 1);
        assert_eq!(t.entries().len(), 1);
    }

    #[test]
    fn wep_conversion() {
        let p = two_open(0);
        let wep = p.clone().into_wep(&[Leg::new(0, 1), Leg::new(0, 0)]).unwrap();
        assert_eq!(wep.legs(), &[Leg::new(0, 1), Leg::new(0, 0)]);
        assert_eq!(wep.get(&[Y, Y]), Some(&poly(&[(2, 1)])));
        assert!(wep.as_scalar().is_none());
        assert!(matches!(
            p.into_wep(&[Leg::new(0, 0)]),
            Err(TensorError::LegListMismatch(1, 2)),
        ));

        let doubled = pte(0, &[], &[(&[], &[(0, 2), (4, 6)])], None);
        assert_eq!(
            doubled.into_wep(&[]).unwrap().into_scalar(),
            Some(poly(&[(0, 1), (4, 3)])),
        );

        let redundant = pte(
            0,
            &[Leg::new(0, 0)],
            &[(&[I], &[(0, 4), (2, 4)]), (&[X], &[(1, 8)])],
            None,
        );
        // tensors keep their counts until normalized explicitly
        let wep = redundant.into_wep(&[Leg::new(0, 0)]).unwrap();
        assert_eq!(wep.get(&[I]), Some(&poly(&[(0, 4), (2, 4)])));
        assert_eq!(wep.get(&[X]), Some(&poly(&[(1, 8)])));
        let wep = wep.normalize();
        assert_eq!(wep.get(&[I]), Some(&poly(&[(0, 1), (2, 1)])));
        assert_eq!(wep.get(&[X]), Some(&poly(&[(1, 2)])));
    }
}
