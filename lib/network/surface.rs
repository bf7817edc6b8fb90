//! The rotated surface code assembled from [[5, 1, 2]] encoding tensors.

use crate::{
    legos,
    pauli::Pauli,
    tensor::{ Leg, NodeId, StabilizerCodeTensor, TensorError },
};
use super::{ CodeNetwork, NetworkResult, TensorNetwork };

// leg positions on each site tensor
const NORTH: usize = 0;
const WEST: usize = 1;
const EAST: usize = 2;
const SOUTH: usize = 3;
const PHYSICAL: usize = 4;

/// Build the [[*d*<sup>2</sup>, 1, *d*]] rotated surface code as a network of
/// *d*<sup>2</sup> [[5, 1, 2]] [encoding tensors][legos::encoding_tensor_512].
///
/// Site (*r*, *c*) is node *r* *d* + *c* and carries qubit *r* *d* + *c* on
/// leg 4; legs 0 to 3 point north, west, east and south. Sites with odd
/// *r* + *c* are [Hadamard-conjugated][legos::swap_xz]. Neighboring sites are
/// traced east to west and south to north, and legs on the boundary are
/// capped with *X* stoppers (north and south) or *Z* stoppers (east and west)
/// before any trace is declared. The resulting code is the one of
/// [`legos::rotated_surface`].
pub fn rotated_surface_network(d: usize) -> NetworkResult<CodeNetwork> {
    let site = |r: usize, c: usize| -> NodeId { r * d + c };
    let even = legos::encoding_tensor_512();
    let odd = legos::swap_xz(&even).map_err(TensorError::from)?;

    let mut nodes: Vec<StabilizerCodeTensor> = Vec::with_capacity(d * d);
    for r in 0 .. d {
        for c in 0 .. d {
            let id = site(r, c);
            let h = if (r + c) % 2 == 0 { even.clone() } else { odd.clone() };
            let mut node = StabilizerCodeTensor::new(id, h)?;
            let caps = [
                (r == 0, NORTH, Pauli::X),
                (c == 0, WEST, Pauli::Z),
                (c + 1 == d, EAST, Pauli::Z),
                (r + 1 == d, SOUTH, Pauli::X),
            ];
            for (on_boundary, leg, pauli) in caps.into_iter() {
                if on_boundary {
                    node = node.trace_with_stopper(pauli, Leg::new(id, leg))?;
                }
            }
            nodes.push(node);
        }
    }

    let mut network = TensorNetwork::new(nodes)?;
    for r in 0 .. d {
        for c in 0 .. d {
            let a = site(r, c);
            if c + 1 < d {
                let b = site(r, c + 1);
                network.self_trace(a, b, &[Leg::new(a, EAST)], &[Leg::new(b, WEST)])?;
            }
            if r + 1 < d {
                let b = site(r + 1, c);
                network.self_trace(a, b, &[Leg::new(a, SOUTH)], &[Leg::new(b, NORTH)])?;
            }
        }
    }
    let qubit_legs: Vec<Leg> =
        (0 .. d * d).map(|id| Leg::new(id, PHYSICAL)).collect();
    Ok(CodeNetwork { network, qubit_legs })
}

#[cfg(test)]
mod tests {
    use ndarray as nd;
    use crate::{ linalg::{ self, BinMatrix }, poly::Poly };
    use super::*;
    use super::super::{ ContractionConfig, CostKind };

    fn poly(coeffs: &[(usize, u64)]) -> Poly {
        Poly::from_coeffs(coeffs.iter().copied())
    }

    // columns of a conjoined network's matrix, reordered by qubit
    fn by_qubit(tensor: &StabilizerCodeTensor, qubit_legs: &[Leg]) -> BinMatrix {
        let n = qubit_legs.len();
        let m = tensor.n();
        let pos: Vec<usize> =
            qubit_legs.iter()
            .map(|leg| tensor.leg_position(leg).unwrap())
            .collect();
        let h = tensor.h();
        BinMatrix::from_shape_fn((h.nrows(), 2 * n), |(i, j)| {
            if j < n { h[[i, pos[j]]] } else { h[[i, pos[j - n] + m]] }
        })
    }

    #[test]
    fn structure() {
        let CodeNetwork { network, qubit_legs } = rotated_surface_network(3).unwrap();
        assert_eq!(network.nodes().len(), 9);
        assert_eq!(network.traces().len(), 12);
        assert_eq!(network.dangling_legs(), qubit_legs);
        // corners keep two bond legs, edges three, the center four
        let bonds: Vec<usize> =
            network.nodes().values().map(|node| node.n() - 1).collect();
        assert_eq!(bonds, vec![2, 3, 2, 3, 4, 3, 2, 3, 2]);
    }

    #[test]
    fn distance_3() {
        let expected = poly(&[(0, 1), (2, 4), (4, 22), (6, 100), (8, 129)]);
        for config in [
            ContractionConfig::declared(),
            ContractionConfig::greedy(CostKind::StabilizerFlops),
            ContractionConfig::greedy(CostKind::IntermediateSize),
            ContractionConfig::greedy(CostKind::UpperBound),
        ] {
            let CodeNetwork { mut network, .. } = rotated_surface_network(3).unwrap();
            assert_eq!(network.scalar_enumerator(&config).unwrap(), expected);
        }

        // the center qubit's tensor enumerator has no redundancy to remove
        let CodeNetwork { mut network, qubit_legs } =
            rotated_surface_network(3).unwrap();
        let wep =
            network.stabilizer_enumerator_polynomial(
                &qubit_legs[4 .. 5], &ContractionConfig::default())
            .unwrap();
        assert_eq!(
            wep.get(&[Pauli::I]),
            Some(&poly(&[(0, 1), (2, 4), (4, 6), (6, 36), (8, 17)])),
        );
        assert_eq!(wep.get(&[Pauli::Y]), Some(&poly(&[(5, 32), (7, 32)])));
        assert_eq!(wep.clone().normalize(), wep);
    }

    #[test]
    fn matches_parity_checks() {
        for d in [3, 5] {
            let CodeNetwork { mut network, qubit_legs } =
                rotated_surface_network(d).unwrap();
            let conjoined = network.conjoin_nodes().unwrap();
            let h = by_qubit(&conjoined, &qubit_legs);
            let reference = legos::rotated_surface(d);
            let r = reference.nrows();
            assert_eq!(linalg::rank(&h), r);
            let joint =
                nd::concatenate(nd::Axis(0), &[h.view(), reference.view()]).unwrap();
            assert_eq!(linalg::rank(&joint), r);
        }
    }
}
