//! Parity-check matrices of common elementary tensors.

use ndarray::{ self as nd, s };
use crate::{
    linalg::{ self, BinMatrix, LinalgError, LinalgResult },
    pauli::Pauli,
};

/// The two-leg identity (Bell pair) tensor, stabilized by *XX* and *ZZ*.
pub fn identity() -> BinMatrix {
    nd::array![
        [1, 1, 0, 0],
        [0, 0, 1, 1],
    ]
}

/// The two-leg Hadamard tensor, stabilized by *XZ* and *ZX*.
pub fn hadamard() -> BinMatrix {
    nd::array![
        [1, 0, 0, 1],
        [0, 1, 1, 0],
    ]
}

/// A one-leg stopper stabilized by `p`.
///
/// The identity stopper has a single all-zero row; tracing a leg with it
/// keeps only the operators that act trivially on the leg.
pub fn stopper(p: Pauli) -> BinMatrix {
    let (x, z) = p.bits();
    nd::array![[x, z]]
}

/// The *d*-leg *Z*-repetition code, stabilized by *X*<sup>⊗*d*</sup> and
/// *Z*<sub>*i*</sub>*Z*<sub>*i*+1</sub>. Equivalently, a *Z*-spider with no
/// phase.
pub fn z_rep_code(d: usize) -> BinMatrix {
    rep_code(d, false)
}

/// The *d*-leg *X*-repetition code, stabilized by *Z*<sup>⊗*d*</sup> and
/// *X*<sub>*i*</sub>*X*<sub>*i*+1</sub>.
pub fn x_rep_code(d: usize) -> BinMatrix {
    rep_code(d, true)
}

fn rep_code(d: usize, flip: bool) -> BinMatrix {
    // (offset of the all-ones row, offset of the pair rows)
    let (all, pairs) = if flip { (d, 0) } else { (0, d) };
    let mut h = BinMatrix::zeros((d, 2 * d));
    if d == 0 { return h; }
    h.slice_mut(s![0, all .. all + d]).fill(1);
    for i in 0 .. d - 1 {
        h[[i + 1, pairs + i]] = 1;
        h[[i + 1, pairs + i + 1]] = 1;
    }
    h
}

/// The [[4, 2, 2]] code, stabilized by *XXXX* and *ZZZZ*.
pub fn stab_code_parity_422() -> BinMatrix {
    nd::array![
        [1, 1, 1, 1, 0, 0, 0, 0],
        [0, 0, 0, 0, 1, 1, 1, 1],
    ]
}

/// The [[4, 2, 2]] code's encoding tensor, as a six-leg [[6, 0, 3]] state.
///
/// Legs 0 to 3 are the physical qubits and legs 4 and 5 the logical ones,
/// carrying *X̄*<sub>1</sub> = *XXII*, *Z̄*<sub>1</sub> = *ZIZI*,
/// *X̄*<sub>2</sub> = *XIXI* and *Z̄*<sub>2</sub> = *ZZII*.
pub fn encoding_tensor_602() -> BinMatrix {
    nd::array![
        [1, 1, 1, 1, 0, 0,  0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0,  1, 1, 1, 1, 0, 0],
        [1, 1, 0, 0, 1, 0,  0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0,  1, 0, 1, 0, 1, 0],
        [1, 0, 1, 0, 0, 1,  0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0,  1, 1, 0, 0, 0, 1],
    ]
}

/// [`encoding_tensor_602`] with its second logical leg fixed: a five-leg
/// [[5, 1, 2]] tensor with the [[4, 2, 2]] code on legs 0 to 3 and one
/// logical leg 4.
pub fn encoding_tensor_512() -> BinMatrix {
    nd::array![
        [1, 1, 1, 1, 0,  0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0,  1, 1, 1, 1, 0],
        [1, 1, 0, 0, 1,  0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0,  1, 0, 1, 0, 1],
    ]
}

/// Conjugate every leg of a tensor by a Hadamard, exchanging the *X* and *Z*
/// parts of each row.
///
/// Fails if `h` has an odd number of columns.
pub fn swap_xz(h: &BinMatrix) -> LinalgResult<BinMatrix> {
    let n = linalg::num_qubits(h)?;
    let mut swapped = BinMatrix::zeros(h.dim());
    swapped.slice_mut(s![.., .. n]).assign(&h.slice(s![.., n ..]));
    swapped.slice_mut(s![.., n ..]).assign(&h.slice(s![.., .. n]));
    Ok(swapped)
}

/// The classical [7, 4, 3] Hamming code's parity checks, used for both halves
/// of the Steane code.
pub fn hamming_7_4() -> BinMatrix {
    nd::array![
        [1, 0, 0, 1, 0, 1, 1],
        [0, 1, 0, 1, 1, 0, 1],
        [0, 0, 1, 0, 1, 1, 1],
    ]
}

/// The [[7, 1, 3]] Steane code.
pub fn steane_parity() -> BinMatrix {
    let h = hamming_7_4();
    stack_css(&h, &h)
}

/// The [[*d*<sup>2</sup>, 1, *d*]] rotated surface code on a *d* × *d* grid
/// of qubits, indexed row-major, for odd *d*.
///
/// Weight-4 checks sit on every interior plaquette, alternating between *X*
/// (even corner parity) and *Z* (odd). Weight-2 *X* checks close the top and
/// bottom boundaries; weight-2 *Z* checks close the left and right.
pub fn rotated_surface(d: usize) -> BinMatrix {
    let n = d * d;
    let mut xs: Vec<Vec<usize>> = Vec::new();
    let mut zs: Vec<Vec<usize>> = Vec::new();
    // plaquette (r, c) has top-left corner (r - 1, c - 1) in grid coordinates
    for r in 0 ..= d {
        for c in 0 ..= d {
            let support: Vec<usize> =
                [(r, c), (r, c + 1), (r + 1, c), (r + 1, c + 1)].into_iter()
                .filter(|&(a, b)| (1 ..= d).contains(&a) && (1 ..= d).contains(&b))
                .map(|(a, b)| (a - 1) * d + (b - 1))
                .collect();
            if support.len() < 2 { continue; }
            let even = (r + c) % 2 == 0;
            let top_bottom = r == 0 || r == d;
            let keep = support.len() == 4 || top_bottom == even;
            if !keep { continue; }
            if even { xs.push(support); } else { zs.push(support); }
        }
    }
    let to_matrix = |checks: &[Vec<usize>]| -> BinMatrix {
        let mut h = BinMatrix::zeros((checks.len(), n));
        for (i, support) in checks.iter().enumerate() {
            support.iter().for_each(|&j| { h[[i, j]] = 1; });
        }
        h
    };
    stack_css(&to_matrix(&xs), &to_matrix(&zs))
}

/// Assemble the symplectic matrix of a CSS code from its *X*- and *Z*-type
/// classical parity checks.
///
/// Fails if `hx` and `hz` have different numbers of columns.
pub fn css(hx: &BinMatrix, hz: &BinMatrix) -> LinalgResult<BinMatrix> {
    let n = hx.ncols();
    if hz.ncols() != n {
        return Err(LinalgError::RaggedRows {
            row: hx.nrows(),
            len: hz.ncols(),
            expected: n,
        });
    }
    Ok(stack_css(hx, hz))
}

// assumes `hx` and `hz` have the same width
fn stack_css(hx: &BinMatrix, hz: &BinMatrix) -> BinMatrix {
    let n = hx.ncols();
    let (rx, rz) = (hx.nrows(), hz.nrows());
    let mut h = BinMatrix::zeros((rx + rz, 2 * n));
    h.slice_mut(s![.. rx, .. n]).assign(hx);
    h.slice_mut(s![rx .., n ..]).assign(hz);
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::rank;

    #[test]
    fn repetition_codes() {
        assert_eq!(
            z_rep_code(3),
            nd::array![
                [1, 1, 1, 0, 0, 0],
                [0, 0, 0, 1, 1, 0],
                [0, 0, 0, 0, 1, 1],
            ],
        );
        assert_eq!(
            x_rep_code(2),
            nd::array![
                [0, 0, 1, 1],
                [1, 1, 0, 0],
            ],
        );
        assert_eq!(z_rep_code(1), nd::array![[1, 0]]);
        assert_eq!(rank(&z_rep_code(5)), 5);
    }

    #[test]
    fn stoppers_and_two_legs() {
        assert_eq!(stopper(Pauli::I), nd::array![[0, 0]]);
        assert_eq!(stopper(Pauli::Y), nd::array![[1, 1]]);
        assert_eq!(rank(&identity()), 2);
        assert_eq!(rank(&hadamard()), 2);
    }

    #[test]
    fn encoding_tensors() {
        let e = encoding_tensor_602();
        assert_eq!(e.dim(), (6, 12));
        assert_eq!(rank(&e), 6);
        let t = encoding_tensor_512();
        assert_eq!(rank(&t), 4);
        // the [[5, 1, 2]] rows are the [[6, 0, 3]] rows that avoid leg 5
        for (row, full) in t.rows().into_iter().zip(e.rows()) {
            assert_eq!(full[5], 0);
            assert_eq!(full[11], 0);
            let kept: Vec<u8> =
                (0 .. 12).filter(|&j| j != 5 && j != 11).map(|j| full[j]).collect();
            assert_eq!(row.to_vec(), kept);
        }
        let z = swap_xz(&t).unwrap();
        assert_eq!(z.row(2).to_vec(), [0_u8, 0, 0, 0, 0, 1, 1, 0, 0, 1]);
        assert_eq!(swap_xz(&z).unwrap(), t);
        assert!(swap_xz(&nd::array![[1, 0, 1]]).is_err());
    }

    #[test]
    fn css_codes() {
        let h = steane_parity();
        assert_eq!(h.dim(), (6, 14));
        assert_eq!(rank(&h), 6);
        assert_eq!(css(&hamming_7_4(), &hamming_7_4()).unwrap(), h);
        assert!(css(&hamming_7_4(), &identity()).is_err());
    }

    #[test]
    fn surface_codes() {
        let h = rotated_surface(3);
        assert_eq!(h.dim(), (8, 18));
        assert_eq!(rank(&h), 8);
        // X on qubits 0, 1, 3, 4
        assert!(h.rows().into_iter().any(|row| {
            row.to_vec() == [
                1_u8, 1, 0, 1, 1, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0, 0,
            ]
        }));
        // Z on qubits 5, 8
        assert!(h.rows().into_iter().any(|row| {
            row.to_vec() == [
                0_u8, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 1, 0, 0, 1,
            ]
        }));
        let h5 = rotated_surface(5);
        assert_eq!(h5.dim(), (24, 50));
        assert_eq!(rank(&h5), 24);
    }
}
