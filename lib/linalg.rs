//! Linear algebra over GF(2) for symplectic parity-check matrices.
//!
//! Matrices are plain [`ndarray`] arrays of `u8` holding only 0 and 1. A
//! parity-check matrix *H* of shape *r* × 2*n* holds one stabilizer generator
//! per row, in the symplectic layout described in [`crate::pauli`].

use ndarray::{ self as nd, s };
use thiserror::Error;

/// A dense matrix over GF(2).
pub type BinMatrix = nd::Array2<u8>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinalgError {
    /// Returned when a matrix is expected to be symplectic (even column count)
    /// but is not.
    #[error("matrix with {0} columns has no symplectic structure")]
    OddColumns(usize),

    /// Returned when a column index falls outside of a matrix.
    #[error("column {col} out of range for a matrix with {cols} columns")]
    ColumnOutOfRange { col: usize, cols: usize },

    /// Returned when a leg (qubit) index falls outside of a matrix.
    #[error("leg {leg} out of range for a matrix on {qubits} qubits")]
    LegOutOfRange { leg: usize, qubits: usize },

    /// Returned when a self-trace is requested between a leg and itself.
    #[error("cannot trace leg {0} with itself")]
    SameLeg(usize),

    /// Returned when a matrix entry is neither 0 nor 1.
    #[error("entry {val} at ({row}, {col}) is not an element of GF(2)")]
    NonBinary { val: u8, row: usize, col: usize },

    /// Returned when rows passed to [`from_rows`] differ in length.
    #[error("row {row} has {len} entries, expected {expected}")]
    RaggedRows { row: usize, len: usize, expected: usize },
}
pub type LinalgResult<T> = Result<T, LinalgError>;

use LinalgError::*;

/// Build a matrix from a list of rows, checking that all rows have the same
/// length and that all entries are 0 or 1.
///
/// An empty list gives a 0 × 0 matrix; use [`BinMatrix::zeros`] for a matrix
/// with no generators on a non-zero number of qubits.
pub fn from_rows<I, R>(rows: I) -> LinalgResult<BinMatrix>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[u8]>,
{
    let rows: Vec<R> = rows.into_iter().collect();
    let ncols = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != ncols {
            return Err(RaggedRows { row: i, len: row.len(), expected: ncols });
        }
        if let Some((j, &val)) = row.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(NonBinary { val, row: i, col: j });
        }
    }
    Ok(BinMatrix::from_shape_fn(
        (rows.len(), ncols),
        |(i, j)| rows[i].as_ref()[j],
    ))
}

/// Return an error if any entry of `h` is not 0 or 1.
pub fn check_binary(h: &BinMatrix) -> LinalgResult<()> {
    match h.indexed_iter().find(|(_, v)| **v > 1) {
        Some(((row, col), &val)) => Err(NonBinary { val, row, col }),
        None => Ok(()),
    }
}

/// Return the number of qubits *n* of a symplectic matrix with 2*n* columns.
pub fn num_qubits(h: &BinMatrix) -> LinalgResult<usize> {
    let cols = h.ncols();
    if cols % 2 == 0 { Ok(cols / 2) } else { Err(OddColumns(cols)) }
}

fn swap_rows(m: &mut BinMatrix, a: usize, b: usize) {
    if a == b { return; }
    let (mut ra, mut rb) = m.multi_slice_mut((s![a, ..], s![b, ..]));
    nd::Zip::from(&mut ra).and(&mut rb).for_each(std::mem::swap);
}

// add row `src` into row `tgt`
fn add_row(m: &mut BinMatrix, src: usize, tgt: usize) {
    let row = m.row(src).to_owned();
    m.row_mut(tgt).zip_mut_with(&row, |a, &b| *a ^= b);
}

// extract the submatrix at the given rows and columns, in order
fn submatrix(m: &BinMatrix, rows: &[usize], cols: &[usize]) -> BinMatrix {
    BinMatrix::from_shape_fn((rows.len(), cols.len()), |(i, j)| m[[rows[i], cols[j]]])
}

// assumes all columns in `cols` are in bounds
fn gauss_cols(h: &BinMatrix, cols: &[usize], no_swaps: bool) -> BinMatrix {
    let mut res = h.to_owned();
    let rows = res.nrows();
    let mut swaps: Vec<(usize, usize)> = Vec::new();
    let mut idx: usize = 0;
    for &c in cols.iter() {
        if idx == rows { break; }
        // columns that are all zero at and below `idx` leave `idx` in place
        let Some(r) = (idx .. rows).find(|&r| res[[r, c]] != 0) else {
            continue;
        };
        if r != idx {
            swap_rows(&mut res, r, idx);
            swaps.push((r, idx));
        }
        for i in 0 .. rows {
            if i != idx && res[[i, c]] != 0 { add_row(&mut res, idx, i); }
        }
        idx += 1;
    }
    if no_swaps {
        swaps.into_iter().rev()
            .for_each(|(r, i)| { swap_rows(&mut res, r, i); });
    }
    res
}

/// Compute the reduced row-echelon form of `h` over GF(2).
///
/// Zero rows are kept (and end up at the bottom); see [`nonzero_rows`].
pub fn gauss(h: &BinMatrix) -> BinMatrix {
    let cols: Vec<usize> = (0 .. h.ncols()).collect();
    gauss_cols(h, &cols, false)
}

/// Like [`gauss`], but restricting pivot selection to the columns in
/// `col_subset` (in the given order), if provided.
///
/// If `no_swaps` is `true`, row permutations are undone after elimination so
/// that each row keeps its original position.
pub fn gauss_with(h: &BinMatrix, col_subset: Option<&[usize]>, no_swaps: bool)
    -> LinalgResult<BinMatrix>
{
    let ncols = h.ncols();
    match col_subset {
        Some(cols) => {
            if let Some(&col) = cols.iter().find(|&&c| c >= ncols) {
                return Err(ColumnOutOfRange { col, cols: ncols });
            }
            Ok(gauss_cols(h, cols, no_swaps))
        },
        None => {
            let cols: Vec<usize> = (0 .. ncols).collect();
            Ok(gauss_cols(h, &cols, no_swaps))
        },
    }
}

/// Return the rank of `h` over GF(2).
pub fn rank(h: &BinMatrix) -> usize {
    gauss(h).rows().into_iter()
        .filter(|row| row.iter().any(|v| *v != 0))
        .count()
}

/// Return a copy of `h` with all-zero rows removed.
pub fn nonzero_rows(h: &BinMatrix) -> BinMatrix {
    let rows: Vec<usize> =
        h.rows().into_iter().enumerate()
        .filter_map(|(i, row)| row.iter().any(|v| *v != 0).then_some(i))
        .collect();
    let cols: Vec<usize> = (0 .. h.ncols()).collect();
    submatrix(h, &rows, &cols)
}

/// Contract two legs of the same symplectic matrix.
///
/// Physically, this measures the joint *ZZ* and *XX* operators on the two legs
/// and then removes them, returning a matrix on *n* − 2 qubits. After
/// row-reduction on the four affected columns:
/// - if the X- (Z-) columns of the two legs have distinct pivot rows, the
///   second leg's pivot row is folded into the first's and dropped;
/// - if exactly one of them is all zero, the other leg's pivot row is dropped,
///   since no generator built from it can act identically on both legs.
///
/// The first leg's row is always the one kept, so the result depends on the
/// order of `leg1` and `leg2` up to row operations.
pub fn self_trace(h: &BinMatrix, leg1: usize, leg2: usize)
    -> LinalgResult<BinMatrix>
{
    let n = num_qubits(h)?;
    if let Some(&leg) = [leg1, leg2].iter().find(|&&l| l >= n) {
        return Err(LegOutOfRange { leg, qubits: n });
    }
    if leg1 == leg2 { return Err(SameLeg(leg1)); }
    let r = h.nrows();
    let traced = [leg1, leg2, leg1 + n, leg2 + n];
    let mut mx = gauss_cols(h, &traced, false);
    let pivots: Vec<Option<usize>> =
        traced.iter()
        .map(|&c| (0 .. r).find(|&i| mx[[i, c]] != 0))
        .collect();
    let mut kept: Vec<bool> = vec![true; r];
    // X-columns for the ZZ measurement, then Z-columns for XX
    for (a, b) in [(0, 1), (2, 3)] {
        match (pivots[a], pivots[b]) {
            (Some(pa), Some(pb)) if pa != pb => {
                add_row(&mut mx, pb, pa);
                kept[pb] = false;
            },
            (None, Some(pb)) => { kept[pb] = false; },
            (Some(pa), None) => { kept[pa] = false; },
            _ => { },
        }
    }
    let rows: Vec<usize> = (0 .. r).filter(|&i| kept[i]).collect();
    let cols: Vec<usize> =
        (0 .. 2 * n).filter(|c| !traced.contains(c)).collect();
    Ok(submatrix(&mx, &rows, &cols))
}

/// Return the block-diagonal combination of two symplectic matrices acting on
/// disjoint sets of qubits, with the qubits of `h1` first.
pub fn tensor_product(h1: &BinMatrix, h2: &BinMatrix)
    -> LinalgResult<BinMatrix>
{
    let n1 = num_qubits(h1)?;
    let n2 = num_qubits(h2)?;
    let r1 = h1.nrows();
    let r2 = h2.nrows();
    let mut res = BinMatrix::zeros((r1 + r2, 2 * (n1 + n2)));
    res.slice_mut(s![.. r1, .. n1])
        .assign(&h1.slice(s![.., .. n1]));
    res.slice_mut(s![.. r1, n1 + n2 .. 2 * n1 + n2])
        .assign(&h1.slice(s![.., n1 ..]));
    res.slice_mut(s![r1 .., n1 .. n1 + n2])
        .assign(&h2.slice(s![.., .. n2]));
    res.slice_mut(s![r1 .., 2 * n1 + n2 ..])
        .assign(&h2.slice(s![.., n2 ..]));
    Ok(res)
}

/// Contract leg `leg1` of `h1` with leg `leg2` of `h2`.
///
/// The result acts on the remaining legs of `h1` followed by the remaining
/// legs of `h2`.
pub fn conjoin(h1: &BinMatrix, h2: &BinMatrix, leg1: usize, leg2: usize)
    -> LinalgResult<BinMatrix>
{
    let n1 = num_qubits(h1)?;
    let n2 = num_qubits(h2)?;
    if leg1 >= n1 { return Err(LegOutOfRange { leg: leg1, qubits: n1 }); }
    if leg2 >= n2 { return Err(LegOutOfRange { leg: leg2, qubits: n2 }); }
    self_trace(&tensor_product(h1, h2)?, leg1, n1 + leg2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ Rng, SeedableRng, rngs::StdRng };

    fn h422() -> BinMatrix {
        nd::array![
            [1, 1, 1, 1, 0, 0, 0, 0],
            [0, 0, 0, 0, 1, 1, 1, 1],
        ]
    }

    fn random_matrix(rng: &mut StdRng) -> BinMatrix {
        let rows: usize = rng.gen_range(1 ..= 6);
        let cols: usize = 2 * rng.gen_range(1 ..= 5);
        BinMatrix::from_shape_fn((rows, cols), |_| u8::from(rng.gen::<bool>()))
    }

    #[test]
    fn rows_validation() {
        let h = from_rows([[1_u8, 0, 0, 1], [0, 1, 1, 0]]).unwrap();
        assert_eq!(h.dim(), (2, 4));
        assert_eq!(
            from_rows(vec![vec![1_u8, 0], vec![1]]),
            Err(RaggedRows { row: 1, len: 1, expected: 2 }),
        );
        assert_eq!(
            from_rows([[1_u8, 2]]),
            Err(NonBinary { val: 2, row: 0, col: 1 }),
        );
        assert_eq!(num_qubits(&BinMatrix::zeros((1, 3))), Err(OddColumns(3)));
    }

    #[test]
    fn gauss_idempotent() {
        let mut rng = StdRng::seed_from_u64(10546);
        for _ in 0 .. 200 {
            let h = random_matrix(&mut rng);
            let g = gauss(&h);
            assert_eq!(gauss(&g), g);
            assert_eq!(rank(&h), rank(&h.t().to_owned()));
            assert!(rank(&h) <= h.nrows());
        }
    }

    #[test]
    fn gauss_subset_no_swaps() {
        let h: BinMatrix = nd::array![[0, 1, 1, 0], [1, 0, 0, 1]];
        assert_eq!(
            gauss_with(&h, Some(&[0]), false).unwrap(),
            nd::array![[1, 0, 0, 1], [0, 1, 1, 0]],
        );
        assert_eq!(gauss_with(&h, Some(&[0]), true).unwrap(), h);
        assert_eq!(
            gauss_with(&h, Some(&[4]), false),
            Err(ColumnOutOfRange { col: 4, cols: 4 }),
        );
    }

    #[test]
    fn rank_and_zero_rows() {
        let h: BinMatrix = nd::array![
            [1, 1, 0, 0],
            [0, 0, 1, 1],
            [1, 1, 1, 1],
        ];
        assert_eq!(rank(&h), 2);
        assert_eq!(nonzero_rows(&gauss(&h)).nrows(), 2);
        assert_eq!(rank(&BinMatrix::zeros((0, 4))), 0);
    }

    #[test]
    fn tensor_product_blocks() {
        let h = tensor_product(&h422(), &nd::array![[1, 0]]).unwrap();
        assert_eq!(
            h,
            nd::array![
                [1, 1, 1, 1, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 1, 1, 1, 1],
                [0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
            ],
        );
    }

    #[test]
    fn self_trace_two_422() {
        let h = tensor_product(&h422(), &h422()).unwrap();
        let traced = self_trace(&h, 0, 4).unwrap();
        assert_eq!(
            traced,
            nd::array![
                [1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1],
            ],
        );
        assert_eq!(conjoin(&h422(), &h422(), 0, 0).unwrap(), traced);
        let twice = self_trace(&traced, 0, 3).unwrap();
        assert_eq!(gauss(&twice), h422());
    }

    #[test]
    fn self_trace_zero_column() {
        // leg 1 carries no X-part, so the X-pivot of leg 0 (X0 X2) is dropped
        // and only Z0 Z1 survives, as the identity on leg 2
        let h: BinMatrix = nd::array![
            [1, 0, 1, 0, 0, 0],
            [0, 0, 0, 1, 1, 0],
        ];
        let traced = self_trace(&h, 0, 1).unwrap();
        assert_eq!(traced, nd::array![[0, 0]]);
        assert_eq!(rank(&traced), 0);
    }

    #[test]
    fn self_trace_errors() {
        assert_eq!(self_trace(&h422(), 1, 1), Err(SameLeg(1)));
        assert_eq!(
            self_trace(&h422(), 0, 4),
            Err(LegOutOfRange { leg: 4, qubits: 4 }),
        );
        assert_eq!(
            conjoin(&h422(), &BinMatrix::zeros((1, 5)), 0, 0),
            Err(OddColumns(5)),
        );
    }
}
