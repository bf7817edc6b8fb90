//! Univariate weight-enumerator polynomials with arbitrary-precision
//! coefficients.
//!
//! A [`Poly`] maps a Hamming weight *w* to the number of Pauli operators of
//! that weight, i.e. the coefficient of *z*<sup>*w*</sup> in
//! *A*(*z*) = ∑<sub>*w*</sub> *A*<sub>*w*</sub> *z*<sup>*w*</sup>.

use std::{
    collections::BTreeMap,
    fmt,
    ops::{ Add, AddAssign, Mul },
};
use num_bigint::{ BigInt, BigUint };
use num_rational::BigRational;
use num_traits::{ One, Signed, Zero };
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolyError {
    /// Returned when a polynomial has terms beyond the number of qubits it is
    /// supposed to describe.
    #[error("weight {weight} exceeds the number of qubits {n}")]
    WeightExceedsQubits { weight: usize, n: usize },

    /// Returned when the MacWilliams transform of a polynomial is not a
    /// polynomial with non-negative integer coefficients, meaning the input was
    /// not the enumerator of an [[n, k]] code.
    #[error("MacWilliams dual has coefficient {coeff} at weight {weight}")]
    InvalidDual { weight: usize, coeff: String },

    /// Returned when `k` exceeds `n` in the MacWilliams transform.
    #[error("cannot encode {k} logical qubits into {n} physical qubits")]
    TooManyLogicals { n: usize, k: usize },
}
pub type PolyResult<T> = Result<T, PolyError>;

/// A weight-enumerator polynomial.
///
/// Only non-zero coefficients are stored, so two `Poly`s compare equal exactly
/// when they denote the same polynomial.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Poly(pub(crate) BTreeMap<usize, BigUint>);

impl<C> FromIterator<(usize, C)> for Poly
where C: Into<BigUint>
{
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = (usize, C)>
    {
        let mut poly = Self::zero();
        iter.into_iter()
            .for_each(|(w, c)| { poly.add_term(w, c.into()); });
        poly
    }
}

impl Poly {
    /// Return the zero polynomial.
    pub fn zero() -> Self { Self(BTreeMap::new()) }

    /// Return the constant polynomial 1, the enumerator of the identity alone.
    pub fn one() -> Self { Self::monomial(0, BigUint::one()) }

    /// Return the polynomial `c z^w`.
    pub fn monomial<C>(w: usize, c: C) -> Self
    where C: Into<BigUint>
    {
        let mut poly = Self::zero();
        poly.add_term(w, c.into());
        poly
    }

    /// Create a polynomial from `(weight, coefficient)` pairs, summing
    /// coefficients at repeated weights.
    pub fn from_coeffs<I, C>(coeffs: I) -> Self
    where
        I: IntoIterator<Item = (usize, C)>,
        C: Into<BigUint>,
    {
        coeffs.into_iter().collect()
    }

    /// Return `true` if `self` has no terms.
    pub fn is_zero(&self) -> bool { self.0.is_empty() }

    /// Return the number of non-zero terms.
    pub fn len(&self) -> usize { self.0.len() }

    /// Return `true` if `self` has no terms.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Return the coefficient at weight `w`, if non-zero.
    pub fn get(&self, w: usize) -> Option<&BigUint> { self.0.get(&w) }

    /// Return the coefficient at weight `w`.
    pub fn coeff(&self, w: usize) -> BigUint {
        self.0.get(&w).cloned().unwrap_or_else(BigUint::zero)
    }

    /// Add `c` to the coefficient at weight `w`.
    pub fn add_term(&mut self, w: usize, c: BigUint) -> &mut Self {
        if !c.is_zero() {
            *self.0.entry(w).or_insert_with(BigUint::zero) += c;
        }
        self
    }

    /// Return an iterator over all `(weight, coefficient)` pairs in order of
    /// increasing weight.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BigUint)> + '_ {
        self.0.iter().map(|(w, c)| (*w, c))
    }

    /// Return the smallest weight with a non-zero coefficient.
    pub fn min_weight(&self) -> Option<usize> {
        self.0.keys().next().copied()
    }

    /// Return the largest weight with a non-zero coefficient.
    pub fn max_weight(&self) -> Option<usize> {
        self.0.keys().next_back().copied()
    }

    /// Return the sum of all coefficients, i.e. the total number of operators
    /// counted.
    pub fn total(&self) -> BigUint { self.0.values().sum() }

    /// Drop all terms of weight greater than `max_weight`.
    pub fn truncate(&self, max_weight: usize) -> Self {
        Self(self.0.range(..= max_weight).map(|(w, c)| (*w, c.clone())).collect())
    }

    /// Like [`truncate`][Self::truncate], but in place.
    pub fn truncate_inplace(&mut self, max_weight: usize) -> &mut Self {
        self.0.retain(|w, _| *w <= max_weight);
        self
    }

    /// Multiply `self` by `rhs`, skipping all products of weight greater than
    /// `max_weight`, if given.
    pub fn mul_truncated(&self, rhs: &Poly, max_weight: Option<usize>) -> Self {
        let Some(t) = max_weight else { return self * rhs; };
        let mut res = Self::zero();
        for (w1, c1) in self.0.range(..= t) {
            for (w2, c2) in rhs.0.range(..= t - w1) {
                res.add_term(w1 + w2, c1 * c2);
            }
        }
        res
    }

    // divide every coefficient by `d`, rounding down
    pub(crate) fn div_coeffs(&self, d: &BigUint) -> Self {
        Self(
            self.0.iter()
                .map(|(w, c)| (*w, c / d))
                .filter(|(_, c)| !c.is_zero())
                .collect()
        )
    }

    /// If the identity coefficient (weight 0) is greater than 1, divide every
    /// coefficient by it.
    ///
    /// Contracting networks with redundant generator sets counts each operator
    /// once per element of the redundancy kernel; this removes that factor.
    pub fn normalize(&self) -> Self {
        match self.0.get(&0) {
            Some(c0) if !c0.is_one() => self.div_coeffs(c0),
            _ => self.clone(),
        }
    }

    /// Apply the MacWilliams identity for an [[`n`, `k`]] stabilizer code.
    ///
    /// With *A*(*w*, *z*) the homogenized enumerator, the transform computes
    /// *A*(*w* + 3*z*, *w* − *z*) / 2<sup>*n* − *k*</sup> when
    /// `to_normalizer` is `true` (stabilizer → normalizer), and divides by
    /// 2<sup>*n* + *k*</sup> instead otherwise (normalizer → stabilizer). The
    /// two directions are mutually inverse.
    pub fn macwilliams_dual(&self, n: usize, k: usize, to_normalizer: bool)
        -> PolyResult<Self>
    {
        if k > n { return Err(PolyError::TooManyLogicals { n, k }); }
        if let Some(weight) = self.max_weight().filter(|w| *w > n) {
            return Err(PolyError::WeightExceedsQubits { weight, n });
        }
        let binom = binomial_rows(n);
        let mut acc: Vec<BigInt> = vec![BigInt::zero(); n + 1];
        for (d, a_d) in self.iter() {
            let a_d = BigInt::from(a_d.clone());
            // (1 + 3z)^(n - d) (1 - z)^d
            for i in 0 ..= n - d {
                let left =
                    &binom[n - d][i] * BigInt::from(3_u8).pow(i as u32);
                for j in 0 ..= d {
                    let term = &a_d * &left * &binom[d][j];
                    if j % 2 == 0 {
                        acc[i + j] += term;
                    } else {
                        acc[i + j] -= term;
                    }
                }
            }
        }
        let shift = if to_normalizer { n - k } else { n + k };
        let denom = BigInt::one() << shift;
        let mut res = Self::zero();
        for (w, numer) in acc.into_iter().enumerate() {
            let c = BigRational::new(numer, denom.clone());
            if !c.is_integer() || c.is_negative() {
                return Err(PolyError::InvalidDual { weight: w, coeff: c.to_string() });
            }
            if let Some(c) = c.to_integer().to_biguint() {
                res.add_term(w, c);
            }
        }
        Ok(res)
    }
}

// Pascal's triangle up to row `n`
fn binomial_rows(n: usize) -> Vec<Vec<BigInt>> {
    let mut rows: Vec<Vec<BigInt>> = Vec::with_capacity(n + 1);
    for m in 0 ..= n {
        let mut row: Vec<BigInt> = vec![BigInt::one(); m + 1];
        for j in 1 .. m {
            row[j] = &rows[m - 1][j - 1] + &rows[m - 1][j];
        }
        rows.push(row);
    }
    rows
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Poly) {
        rhs.0.iter()
            .for_each(|(w, c)| { self.add_term(*w, c.clone()); });
    }
}

impl AddAssign<Poly> for Poly {
    fn add_assign(&mut self, rhs: Poly) {
        rhs.0.into_iter()
            .for_each(|(w, c)| { self.add_term(w, c); });
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let mut res = self.clone();
        res += rhs;
        res
    }
}

impl Add for Poly {
    type Output = Poly;

    fn add(mut self, rhs: Poly) -> Poly {
        self += rhs;
        self
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;

    // convolution of coefficient sequences
    fn mul(self, rhs: &Poly) -> Poly {
        let mut res = Poly::zero();
        for (w1, c1) in self.0.iter() {
            for (w2, c2) in rhs.0.iter() {
                res.add_term(w1 + w2, c1 * c2);
            }
        }
        res
    }
}

impl Mul for Poly {
    type Output = Poly;

    fn mul(self, rhs: Poly) -> Poly { &self * &rhs }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() { return write!(f, "0"); }
        for (k, (w, c)) in self.0.iter().enumerate() {
            if k > 0 { write!(f, " + ")?; }
            match *w {
                0 => write!(f, "{}", c)?,
                1 => write!(f, "{} z", c)?,
                _ => write!(f, "{} z^{}", c, w)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray as nd;
    use rand::{ Rng, SeedableRng, rngs::StdRng };
    use crate::{
        linalg::BinMatrix,
        pauli::symplectic_product,
        tensor::StabilizerCodeTensor,
    };
    use super::*;

    fn poly(coeffs: &[(usize, u64)]) -> Poly {
        Poly::from_coeffs(coeffs.iter().copied())
    }

    #[test]
    fn arithmetic() {
        let a = poly(&[(0, 1), (1, 2)]);
        let b = poly(&[(0, 1), (2, 3)]);
        assert_eq!(&a + &b, poly(&[(0, 2), (1, 2), (2, 3)]));
        assert_eq!(&a * &b, poly(&[(0, 1), (1, 2), (2, 3), (3, 6)]));
        assert_eq!(&a * &Poly::one(), a);
        assert_eq!(a.mul_truncated(&b, Some(2)), poly(&[(0, 1), (1, 2), (2, 3)]));
        assert_eq!(a.mul_truncated(&b, None), &a * &b);
        assert!((&a * &Poly::zero()).is_zero());
        assert_eq!(poly(&[(3, 0)]), Poly::zero());
        assert_eq!(format!("{}", poly(&[(0, 1), (1, 2), (4, 3)])), "1 + 2 z + 3 z^4");
    }

    #[test]
    fn truncation_reveals_terms() {
        let p = poly(&[(0, 1), (2, 4), (4, 22), (6, 100), (8, 129)]);
        let mut prev = 0;
        for k in 0 ..= 10 {
            let t = p.truncate(k);
            assert!(t.len() >= prev);
            assert!(t.iter().all(|(w, c)| w <= k && p.get(w) == Some(c)));
            prev = t.len();
        }
        assert_eq!(p.truncate(8), p);
        assert_eq!(p.truncate(100), p);
        let mut q = p.clone();
        q.truncate_inplace(4);
        assert_eq!(q, poly(&[(0, 1), (2, 4), (4, 22)]));
        assert_eq!(q.min_weight(), Some(0));
        assert_eq!(q.max_weight(), Some(4));
    }

    #[test]
    fn normalization() {
        assert_eq!(
            poly(&[(0, 4), (2, 8), (4, 12)]).normalize(),
            poly(&[(0, 1), (2, 2), (4, 3)]),
        );
        let p = poly(&[(1, 1), (3, 1), (4, 2)]);
        assert_eq!(p.normalize(), p);
    }

    #[test]
    fn macwilliams() {
        let s422 = poly(&[(0, 1), (4, 3)]);
        let n422 = s422.macwilliams_dual(4, 2, true).unwrap();
        assert_eq!(n422, poly(&[(0, 1), (2, 18), (3, 24), (4, 21)]));
        assert_eq!(n422.macwilliams_dual(4, 2, false).unwrap(), s422);

        let steane = poly(&[(0, 1), (4, 21), (6, 42)]);
        let normalizer = steane.macwilliams_dual(7, 1, true).unwrap();
        assert_eq!(
            normalizer,
            poly(&[(0, 1), (3, 21), (4, 21), (5, 126), (6, 42), (7, 45)]),
        );
        assert_eq!(normalizer.total(), BigUint::from(256_u32));
        assert_eq!(normalizer.macwilliams_dual(7, 1, false).unwrap(), steane);

        let surface = poly(&[(0, 1), (2, 4), (4, 22), (6, 100), (8, 129)]);
        let back =
            surface.macwilliams_dual(9, 1, true)
            .and_then(|p| p.macwilliams_dual(9, 1, false))
            .unwrap();
        assert_eq!(back, surface);
    }

    // random commuting generators on `n` qubits
    fn random_code(rng: &mut StdRng, n: usize) -> BinMatrix {
        let mut rows: Vec<nd::Array1<u8>> = Vec::new();
        for _ in 0 .. 3 * n {
            let v: nd::Array1<u8> =
                (0 .. 2 * n).map(|_| u8::from(rng.gen_bool(0.5))).collect();
            let commutes =
                rows.iter()
                .all(|row| symplectic_product(row.view(), v.view()) == Ok(0));
            if commutes { rows.push(v); }
        }
        BinMatrix::from_shape_fn((rows.len(), 2 * n), |(i, j)| rows[i][j])
    }

    #[test]
    fn macwilliams_random_codes() {
        let mut rng = StdRng::seed_from_u64(20231);
        for _ in 0 .. 40 {
            let n: usize = rng.gen_range(1 ..= 6);
            let code = StabilizerCodeTensor::new(0, random_code(&mut rng, n)).unwrap();
            let k = n - code.rank();
            let stab = code.stabilizer_enumerator(None).unwrap();
            let normalizer = stab.macwilliams_dual(n, k, true).unwrap();
            assert_eq!(normalizer.total(), BigUint::one() << (n + k));
            assert_eq!(normalizer.macwilliams_dual(n, k, false).unwrap(), stab);
        }
    }

    #[test]
    fn macwilliams_errors() {
        assert_eq!(
            poly(&[(0, 1), (5, 1)]).macwilliams_dual(4, 0, true),
            Err(PolyError::WeightExceedsQubits { weight: 5, n: 4 }),
        );
        assert!(matches!(
            poly(&[(1, 1)]).macwilliams_dual(1, 0, true),
            Err(PolyError::InvalidDual { .. }),
        ));
    }
}
