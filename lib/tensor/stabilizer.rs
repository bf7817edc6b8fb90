//! A single stabilizer tensor and its local, brute-force enumeration.

use ndarray as nd;
use num_bigint::BigUint;
use rustc_hash::FxHashMap;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;
use crate::{
    legos,
    linalg::{ self, BinMatrix },
    pauli::{ Pauli, pauli_at, sslice },
    poly::Poly,
};
use super::{
    Key,
    Leg,
    NodeId,
    Pte,
    TensorError,
    TensorResult,
    leg_positions,
};

/// Largest number of independent generators a single tensor may be locally
/// enumerated over.
pub const MAX_GENERATORS: usize = 48;

// local enumerations over at least this many generators are split across
// threads
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 14;
#[cfg(feature = "parallel")]
const CHUNKS: u64 = 64;

/// A stabilizer tensor: a symplectic parity-check matrix whose qubits are
/// labelled by [`Leg`]s, with an optional fixed Pauli flip per leg.
///
/// The matrix is never mutated in place; all leg-level operations return new
/// tensors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabilizerCodeTensor {
    id: NodeId,
    h: BinMatrix,
    legs: Vec<Leg>,
    coset: Option<nd::Array1<u8>>,
}

impl StabilizerCodeTensor {
    /// Create a new tensor with legs `(id, 0), ..., (id, n - 1)`.
    pub fn new(id: NodeId, h: BinMatrix) -> TensorResult<Self> {
        let n = linalg::num_qubits(&h)?;
        let legs: Vec<Leg> = (0 .. n).map(|i| Leg::new(id, i)).collect();
        Self::with_legs(id, h, legs)
    }

    /// Create a new tensor with explicitly labelled legs.
    ///
    /// Fails if the number of legs does not match the width of `h` or if a
    /// leg appears more than once.
    pub fn with_legs(id: NodeId, h: BinMatrix, legs: Vec<Leg>)
        -> TensorResult<Self>
    {
        let n = linalg::num_qubits(&h)?;
        linalg::check_binary(&h)?;
        if legs.len() != n {
            return Err(TensorError::LegCount { legs: legs.len(), qubits: n });
        }
        for (k, leg) in legs.iter().enumerate() {
            if legs[.. k].contains(leg) {
                return Err(TensorError::DuplicateLeg(*leg));
            }
        }
        Ok(Self { id, h, legs, coset: None })
    }

    /// Builder-style version of [`set_coset`][Self::set_coset].
    pub fn with_coset_flipped_legs(mut self, flips: &[(Leg, Pauli)])
        -> TensorResult<Self>
    {
        self.set_coset(flips)?;
        Ok(self)
    }

    /// Replace the coset flips of `self`.
    ///
    /// Each `(leg, pauli)` pair applies `pauli` on `leg` to every stabilizer
    /// element before its weight is counted. Legs not named are left
    /// unflipped. On error, `self` is left unchanged.
    pub fn set_coset(&mut self, flips: &[(Leg, Pauli)]) -> TensorResult<()> {
        let n = self.n();
        let mut coset: nd::Array1<u8> = nd::Array1::zeros(2 * n);
        let legs: Vec<Leg> = flips.iter().map(|(leg, _)| *leg).collect();
        let pos = leg_positions(&self.legs, &legs)?;
        for (k, (_, pauli)) in pos.into_iter().zip(flips) {
            coset[k] = pauli.x_bit();
            coset[k + n] = pauli.z_bit();
        }
        self.coset = Some(coset);
        Ok(())
    }

    /// Remove all coset flips.
    pub fn clear_coset(&mut self) { self.coset = None; }

    /// Return the ID of the node this tensor belongs to.
    pub fn id(&self) -> NodeId { self.id }

    /// Return the parity-check matrix.
    pub fn h(&self) -> &BinMatrix { &self.h }

    /// Return the legs, in column order.
    pub fn legs(&self) -> &[Leg] { &self.legs }

    /// Return the number of qubits (legs).
    pub fn n(&self) -> usize { self.legs.len() }

    /// Return the rank of the parity-check matrix.
    pub fn rank(&self) -> usize { linalg::rank(&self.h) }

    /// Return the number of logical qubits the tensor would carry as an
    /// isolated code.
    pub fn k(&self) -> usize { self.n() - self.rank() }

    /// Return the `i`-th leg, if it exists.
    pub fn leg(&self, i: usize) -> Option<Leg> { self.legs.get(i).copied() }

    /// Return the column position of `leg`, if present.
    pub fn leg_position(&self, leg: &Leg) -> Option<usize> {
        self.legs.iter().position(|l| l == leg)
    }

    /// Return all non-identity coset flips.
    pub fn coset_flips(&self) -> Vec<(Leg, Pauli)> {
        let Some(coset) = self.coset.as_ref() else { return Vec::new(); };
        self.legs.iter().enumerate()
            .map(|(k, leg)| (*leg, pauli_at(coset.view(), k)))
            .filter(|(_, p)| !p.is_identity())
            .collect()
    }

    /// Enumerate all stabilizer elements, producing a [`Pte`] keyed by the
    /// Paulis on `open_legs` and counting weight on all other legs.
    ///
    /// Coset flips are applied to every element. If `truncate_length` is
    /// given, elements of greater weight are not counted. Generator
    /// combinations are split across threads when the `parallel` feature is
    /// enabled and the tensor is large enough.
    pub fn enumerate(&self, open_legs: &[Leg], truncate_length: Option<usize>)
        -> TensorResult<Pte>
    {
        self.enumerate_with(open_legs, truncate_length, true)
    }

    /// Like [`enumerate`][Self::enumerate], but optionally forcing
    /// single-threaded execution.
    pub fn enumerate_with(
        &self,
        open_legs: &[Leg],
        truncate_length: Option<usize>,
        parallel: bool,
    ) -> TensorResult<Pte>
    {
        let open = leg_positions(&self.legs, open_legs)?;
        let counts =
            self.count(&open, self.coset.as_ref(), truncate_length, parallel)?;
        let mut tensor: FxHashMap<Key, Poly> = FxHashMap::default();
        for ((key, weight), c) in counts.into_iter() {
            tensor.entry(key).or_default().add_term(weight, BigUint::from(c));
        }
        Ok(Pte::new(
            [self.id].into_iter().collect(),
            open_legs.to_vec(),
            tensor,
            truncate_length,
        ))
    }

    /// Return the scalar weight enumerator of the stabilizer group (or its
    /// coset), counting weight on all legs.
    pub fn stabilizer_enumerator(&self, truncate_length: Option<usize>)
        -> TensorResult<Poly>
    {
        let counts = self.count(&[], self.coset.as_ref(), truncate_length, true)?;
        Ok(counts_to_scalar(counts))
    }

    /// Return the weight enumerator of the normalizer of the stabilizer group,
    /// via the MacWilliams identity. Coset flips are ignored.
    pub fn normalizer_enumerator(&self) -> TensorResult<Poly> {
        let counts = self.count(&[], None, None, true)?;
        let stab = counts_to_scalar(counts);
        Ok(stab.macwilliams_dual(self.n(), self.k(), true)?)
    }

    fn count(
        &self,
        open: &[usize],
        coset: Option<&nd::Array1<u8>>,
        truncate: Option<usize>,
        parallel: bool,
    ) -> TensorResult<Counts>
    {
        let n = self.n();
        let reduced = linalg::nonzero_rows(&linalg::gauss(&self.h));
        let r = reduced.nrows();
        if r > MAX_GENERATORS { return Err(TensorError::TooManyGenerators(r)); }
        let mut is_open: Vec<bool> = vec![false; n];
        open.iter().for_each(|k| { is_open[*k] = true; });
        let local = LocalEnum {
            gens: reduced.rows().into_iter().map(|row| row.to_owned()).collect(),
            base: coset.cloned().unwrap_or_else(|| nd::Array1::zeros(2 * n)),
            open,
            is_open,
            n,
            truncate,
        };
        let total: u64 = 1 << r;
        trace!(node = self.id, generators = r, open = open.len(), "local enumeration");

        #[cfg(feature = "parallel")]
        let counts =
            if parallel && r >= PARALLEL_THRESHOLD {
                let chunk = total / CHUNKS;
                (0 .. CHUNKS).into_par_iter()
                    .map(|c| local.count_range(c * chunk, (c + 1) * chunk))
                    .reduce(Counts::default, merge_counts)
            } else {
                local.count_range(0, total)
            };
        #[cfg(not(feature = "parallel"))]
        let counts = {
            let _ = parallel;
            local.count_range(0, total)
        };

        Ok(counts)
    }

    fn coset_without(&self, cols: &[usize]) -> Option<nd::Array1<u8>> {
        let n = self.n();
        self.coset.as_ref().map(|coset| {
            (0 .. n).filter(|k| !cols.contains(k)).map(|k| coset[k])
                .chain(
                    (0 .. n).filter(|k| !cols.contains(k)).map(|k| coset[k + n])
                )
                .collect()
        })
    }

    /// Contract pairs of legs of `self` at the level of parity-check
    /// matrices, pairing `legs1[i]` with `legs2[i]`.
    ///
    /// Traced legs are removed, along with any coset flips on them.
    pub fn self_trace(&self, legs1: &[Leg], legs2: &[Leg]) -> TensorResult<Self> {
        if legs1.len() != legs2.len() {
            return Err(TensorError::LegListMismatch(legs1.len(), legs2.len()));
        }
        let all: Vec<Leg> = legs1.iter().chain(legs2).copied().collect();
        leg_positions(&self.legs, &all)?;
        let mut res = self.clone();
        for (l1, l2) in legs1.iter().zip(legs2) {
            let p1 = res.leg_position(l1).ok_or(TensorError::MissingLeg(*l1))?;
            let p2 = res.leg_position(l2).ok_or(TensorError::MissingLeg(*l2))?;
            let h = linalg::self_trace(&res.h, p1, p2)?;
            let coset = res.coset_without(&[p1, p2]);
            res.legs.retain(|l| l != l1 && l != l2);
            res.h = h;
            res.coset = coset;
        }
        Ok(res)
    }

    /// Return the tensor product of `self` and `other` as a tensor with the
    /// ID of `self`, the legs of `self` followed by the legs of `other`.
    pub fn tensor_with(&self, other: &Self) -> TensorResult<Self> {
        if let Some(leg) = other.legs.iter().find(|l| self.legs.contains(l)) {
            return Err(TensorError::DuplicateLeg(*leg));
        }
        let h = linalg::tensor_product(&self.h, &other.h)?;
        let legs: Vec<Leg> =
            self.legs.iter().chain(other.legs.iter()).copied().collect();
        let coset =
            if self.coset.is_some() || other.coset.is_some() {
                let (n1, n2) = (self.n(), other.n());
                let c1 = self.coset.clone()
                    .unwrap_or_else(|| nd::Array1::zeros(2 * n1));
                let c2 = other.coset.clone()
                    .unwrap_or_else(|| nd::Array1::zeros(2 * n2));
                let c: nd::Array1<u8> =
                    c1.iter().take(n1).chain(c2.iter().take(n2))
                    .chain(c1.iter().skip(n1)).chain(c2.iter().skip(n2))
                    .copied()
                    .collect();
                Some(c)
            } else {
                None
            };
        Ok(Self { id: self.id, h, legs, coset })
    }

    /// Contract `legs1` of `self` with `legs2` of `other` at the level of
    /// parity-check matrices.
    pub fn conjoin(&self, other: &Self, legs1: &[Leg], legs2: &[Leg])
        -> TensorResult<Self>
    {
        self.tensor_with(other)?.self_trace(legs1, legs2)
    }

    /// Contract `leg` with a one-leg stopper tensor stabilized by `pauli`,
    /// restricting the leg to that Pauli (or the identity) and removing it.
    pub fn trace_with_stopper(&self, pauli: Pauli, leg: Leg) -> TensorResult<Self> {
        let k = self.leg_position(&leg).ok_or(TensorError::MissingLeg(leg))?;
        let n = self.n();
        let joint = linalg::tensor_product(&self.h, &legos::stopper(pauli))?;
        let h = linalg::self_trace(&joint, k, n)?;
        let coset = self.coset_without(&[k]);
        let legs: Vec<Leg> =
            self.legs.iter().filter(|l| **l != leg).copied().collect();
        Ok(Self { id: self.id, h, legs, coset })
    }
}

// (boundary key, weight) -> count
type Counts = FxHashMap<(Key, usize), u64>;

fn merge_counts(mut acc: Counts, other: Counts) -> Counts {
    for (k, c) in other.into_iter() {
        *acc.entry(k).or_insert(0) += c;
    }
    acc
}

fn counts_to_scalar(counts: Counts) -> Poly {
    counts.into_iter().map(|((_, w), c)| (w, c)).collect()
}

// walks ranges of generator combinations in Gray-code order, so that each
// step costs a single row addition
struct LocalEnum<'a> {
    gens: Vec<nd::Array1<u8>>,
    base: nd::Array1<u8>,
    open: &'a [usize],
    is_open: Vec<bool>,
    n: usize,
    truncate: Option<usize>,
}

impl<'a> LocalEnum<'a> {
    fn count_range(&self, start: u64, end: u64) -> Counts {
        let mut counts = Counts::default();
        if start >= end { return counts; }
        let mut cur = self.base.clone();
        let gray = start ^ (start >> 1);
        for (j, gen) in self.gens.iter().enumerate() {
            if (gray >> j) & 1 == 1 { cur ^= gen; }
        }
        self.record(&cur, &mut counts);
        for i in start + 1 .. end {
            cur ^= &self.gens[i.trailing_zeros() as usize];
            self.record(&cur, &mut counts);
        }
        counts
    }

    fn record(&self, v: &nd::Array1<u8>, counts: &mut Counts) {
        let n = self.n;
        let weight =
            (0 .. n)
            .filter(|&i| !self.is_open[i] && (v[i] != 0 || v[i + n] != 0))
            .count();
        if self.truncate.is_some_and(|t| weight > t) { return; }
        let key = sslice(v.view(), self.open);
        *counts.entry((key, weight)).or_insert(0) += 1;
    }
}
