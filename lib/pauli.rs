//! Single-qubit Pauli operators and helpers for symplectic vectors.
//!
//! A Pauli string on *n* qubits is stored as a binary vector of length 2*n*,
//! with the first *n* entries giving the X-part and the last *n* giving the
//! Z-part. The pair (*x*<sub>*i*</sub>, *z*<sub>*i*</sub>) then encodes the
//! operator acting on the *i*-th qubit:
//!
//! | (*x*, *z*) | Pauli |
//! |:----------:|:-----:|
//! | (0, 0)     | *I*   |
//! | (1, 0)     | *X*   |
//! | (0, 1)     | *Z*   |
//! | (1, 1)     | *Y*   |
//!
//! Phases are ignored everywhere; only the group structure modulo phase
//! matters for weight enumeration.

use std::{ fmt, ops::Mul };
use ndarray as nd;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum PauliError {
    #[error("symplectic vectors of lengths {0} and {1} cannot be paired")]
    LengthMismatch(usize, usize),

    #[error("vector of length {0} has no symplectic structure")]
    OddLength(usize),
}
pub type PauliResult<T> = Result<T, PauliError>;

/// A single-qubit Pauli operator, modulo phase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pauli {
    /// Identity.
    #[default]
    I,
    /// Pauli *X*.
    X,
    /// Pauli *Z*.
    Z,
    /// Pauli *Y* = *iXZ*.
    Y,
}

impl Pauli {
    /// All four operators, in (*x*, *z*) bit order.
    pub const ALL: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Z, Pauli::Y];

    /// Construct from an (*x*, *z*) bit pair. Any non-zero value counts as 1.
    pub fn from_bits(x: u8, z: u8) -> Self {
        match (x != 0, z != 0) {
            (false, false) => Self::I,
            (true,  false) => Self::X,
            (false, true ) => Self::Z,
            (true,  true ) => Self::Y,
        }
    }

    /// Return the X-bit of the symplectic representation.
    pub fn x_bit(self) -> u8 { u8::from(matches!(self, Self::X | Self::Y)) }

    /// Return the Z-bit of the symplectic representation.
    pub fn z_bit(self) -> u8 { u8::from(matches!(self, Self::Z | Self::Y)) }

    /// Return the (*x*, *z*) bit pair.
    pub fn bits(self) -> (u8, u8) { (self.x_bit(), self.z_bit()) }

    /// Return `true` if `self` is `I`.
    pub fn is_identity(self) -> bool { self == Self::I }

    /// Return `true` if `self` and `other` commute.
    pub fn commutes_with(self, other: Self) -> bool {
        (self.x_bit() & other.z_bit()) ^ (self.z_bit() & other.x_bit()) == 0
    }
}

impl Mul for Pauli {
    type Output = Pauli;

    // phases are dropped
    fn mul(self, rhs: Pauli) -> Pauli {
        Self::from_bits(self.x_bit() ^ rhs.x_bit(), self.z_bit() ^ rhs.z_bit())
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I => write!(f, "I"),
            Self::X => write!(f, "X"),
            Self::Z => write!(f, "Z"),
            Self::Y => write!(f, "Y"),
        }
    }
}

impl TryFrom<char> for Pauli {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'I' => Ok(Self::I),
            'X' => Ok(Self::X),
            'Z' => Ok(Self::Z),
            'Y' => Ok(Self::Y),
            other => Err(other),
        }
    }
}

/// Return the Pauli operator acting on qubit `i` of the symplectic vector `v`.
///
/// *Panics if `i` is out of bounds.*
pub fn pauli_at(v: nd::ArrayView1<u8>, i: usize) -> Pauli {
    let n = v.len() / 2;
    Pauli::from_bits(v[i], v[i + n])
}

/// Return the number of qubits on which the symplectic vector `v` acts
/// non-trivially.
pub fn symplectic_weight(v: nd::ArrayView1<u8>) -> usize {
    let n = v.len() / 2;
    (0 .. n).filter(|&i| v[i] != 0 || v[i + n] != 0).count()
}

/// Return the symplectic inner product of two vectors: 0 if the
/// corresponding Pauli strings commute, 1 otherwise.
///
/// Fails if the vectors differ in length or have odd length.
pub fn symplectic_product(a: nd::ArrayView1<u8>, b: nd::ArrayView1<u8>)
    -> PauliResult<u8>
{
    if a.len() != b.len() {
        return Err(PauliError::LengthMismatch(a.len(), b.len()));
    }
    if a.len() % 2 != 0 { return Err(PauliError::OddLength(a.len())); }
    let n = a.len() / 2;
    let p = (0 .. n).fold(0, |acc, i| {
        acc ^ ((a[i] & b[i + n]) ^ (a[i + n] & b[i])) & 1
    });
    Ok(p)
}

/// Collect the Paulis of `v` at the qubit positions in `idx`, in order.
pub fn sslice(v: nd::ArrayView1<u8>, idx: &[usize]) -> Vec<Pauli> {
    idx.iter().map(|&i| pauli_at(v, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_roundtrip() {
        for p in Pauli::ALL {
            let (x, z) = p.bits();
            assert_eq!(Pauli::from_bits(x, z), p);
        }
        assert_eq!(Pauli::X * Pauli::Z, Pauli::Y);
        assert_eq!(Pauli::Y * Pauli::Y, Pauli::I);
    }

    #[test]
    fn commutation() {
        assert!( Pauli::X.commutes_with(Pauli::X));
        assert!( Pauli::I.commutes_with(Pauli::Y));
        assert!(!Pauli::X.commutes_with(Pauli::Z));
        assert!(!Pauli::Y.commutes_with(Pauli::Z));
    }

    #[test]
    fn weights() {
        // X I Z Y
        let v = nd::array![1_u8, 0, 0, 1, 0, 0, 1, 1];
        assert_eq!(symplectic_weight(v.view()), 3);
        assert_eq!(
            sslice(v.view(), &[3, 0, 1]),
            vec![Pauli::Y, Pauli::X, Pauli::I],
        );
        let xxxx = nd::array![1_u8, 1, 1, 1, 0, 0, 0, 0];
        let zzzz = nd::array![0_u8, 0, 0, 0, 1, 1, 1, 1];
        let zizi = nd::array![0_u8, 0, 0, 0, 1, 0, 1, 0];
        let ziii = nd::array![0_u8, 0, 0, 0, 1, 0, 0, 0];
        assert_eq!(symplectic_product(xxxx.view(), zzzz.view()), Ok(0));
        assert_eq!(symplectic_product(xxxx.view(), zizi.view()), Ok(0));
        assert_eq!(symplectic_product(xxxx.view(), ziii.view()), Ok(1));
        let zi = nd::array![0_u8, 1];
        assert_eq!(
            symplectic_product(xxxx.view(), zi.view()),
            Err(PauliError::LengthMismatch(8, 2)),
        );
        let odd = nd::array![1_u8, 0, 1];
        assert_eq!(
            symplectic_product(odd.view(), odd.view()),
            Err(PauliError::OddLength(3)),
        );
    }

    #[test]
    fn parse() {
        assert_eq!(Pauli::try_from('y'), Ok(Pauli::Y));
        assert_eq!(Pauli::try_from('Q'), Err('Q'));
        assert_eq!(format!("{}", Pauli::Z), "Z");
    }
}
