//! Tensor networks built from the Tanner graph of a parity-check matrix.

use crate::{
    linalg::{ self, BinMatrix },
    tensor::{ Leg, NodeId, StabilizerCodeTensor, TensorError },
};
use super::{ CodeNetwork, NetworkResult, TensorNetwork };

/// Build the Tanner-graph network of the code with parity-check matrix `h`.
///
/// Qubit `j` becomes node `j`, with one leg per check acting on it (in row
/// order) followed by its physical leg. Each non-zero row of `h` becomes a
/// check node with one leg per qubit in its support, numbered from `n` in row
/// order. Every check leg is traced with exactly one qubit leg; the physical
/// legs are the only dangling ones.
///
/// A qubit node holds one generator per adjacent check, repeating that
/// check's Pauli on the check leg and on the physical leg, so the network's
/// enumerator is that of `h` itself.
pub fn tanner_network(h: &BinMatrix) -> NetworkResult<CodeNetwork> {
    let n = linalg::num_qubits(h).map_err(TensorError::from)?;
    linalg::check_binary(h).map_err(TensorError::from)?;
    let checks: Vec<Vec<usize>> =
        h.rows().into_iter()
        .map(|row| (0 .. n).filter(|&j| row[j] == 1 || row[j + n] == 1).collect())
        .filter(|support: &Vec<usize>| !support.is_empty())
        .collect();
    // rows (among the non-zero ones) acting on each qubit
    let mut adjacent: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (c, support) in checks.iter().enumerate() {
        support.iter().for_each(|&j| { adjacent[j].push(c); });
    }
    let rows: Vec<usize> =
        h.rows().into_iter().enumerate()
        .filter(|(_, row)| row.iter().any(|&b| b == 1))
        .map(|(i, _)| i)
        .collect();

    let mut nodes: Vec<StabilizerCodeTensor> = Vec::with_capacity(n + checks.len());
    for (j, adj) in adjacent.iter().enumerate() {
        let m = adj.len() + 1;
        let mut q = BinMatrix::zeros((adj.len(), 2 * m));
        for (t, &c) in adj.iter().enumerate() {
            let (x, z) = (h[[rows[c], j]], h[[rows[c], j + n]]);
            q[[t, t]] = x;
            q[[t, t + m]] = z;
            q[[t, m - 1]] = x;
            q[[t, 2 * m - 1]] = z;
        }
        nodes.push(StabilizerCodeTensor::new(j, q)?);
    }
    for (c, support) in checks.iter().enumerate() {
        let m = support.len();
        let mut p = BinMatrix::zeros((1, 2 * m));
        for (k, &j) in support.iter().enumerate() {
            p[[0, k]] = h[[rows[c], j]];
            p[[0, k + m]] = h[[rows[c], j + n]];
        }
        nodes.push(StabilizerCodeTensor::new(n + c, p)?);
    }

    let mut network = TensorNetwork::new(nodes)?;
    // checks are visited in the same order `adjacent` was built in
    let mut next: Vec<usize> = vec![0; n];
    for (c, support) in checks.iter().enumerate() {
        let check: NodeId = n + c;
        for (k, &j) in support.iter().enumerate() {
            let t = next[j];
            next[j] += 1;
            network.self_trace(check, j, &[Leg::new(check, k)], &[Leg::new(j, t)])?;
        }
    }
    let qubit_legs: Vec<Leg> =
        adjacent.iter().enumerate()
        .map(|(j, adj)| Leg::new(j, adj.len()))
        .collect();
    Ok(CodeNetwork { network, qubit_legs })
}

#[cfg(test)]
mod tests {
    use crate::{ legos, pauli::Pauli, poly::Poly };
    use super::*;
    use super::super::{ ContractionConfig, CostKind };

    fn poly(coeffs: &[(usize, u64)]) -> Poly {
        Poly::from_coeffs(coeffs.iter().copied())
    }

    #[test]
    fn legs_used_once() {
        let CodeNetwork { network, qubit_legs } =
            tanner_network(&legos::stab_code_parity_422()).unwrap();
        assert_eq!(network.nodes().len(), 6);
        assert_eq!(network.traces().len(), 8);
        assert_eq!(network.dangling_legs(), qubit_legs);
        assert_eq!(qubit_legs, (0 .. 4).map(|j| Leg::new(j, 2)).collect::<Vec<_>>());
        for (id, node) in network.nodes().iter() {
            for leg in node.legs().iter() {
                let uses =
                    network.traces().iter()
                    .filter(|t| t.contains(leg))
                    .count();
                let expected = usize::from(!qubit_legs.contains(leg));
                assert_eq!(uses, expected, "leg {} of node {}", leg, id);
            }
        }
    }

    #[test]
    fn round_trip_422() {
        let h = legos::stab_code_parity_422();
        let CodeNetwork { mut network, .. } = tanner_network(&h).unwrap();
        let expected = poly(&[(0, 1), (4, 3)]);
        let conjoined = network.conjoin_nodes().unwrap();
        assert_eq!(conjoined.n(), 4);
        assert_eq!(conjoined.rank(), 2);
        assert_eq!(conjoined.stabilizer_enumerator(None).unwrap(), expected);
        assert_eq!(
            network.scalar_enumerator(&ContractionConfig::default()).unwrap(),
            expected,
        );
    }

    #[test]
    fn steane() {
        let CodeNetwork { mut network, .. } =
            tanner_network(&legos::steane_parity()).unwrap();
        let expected = poly(&[(0, 1), (4, 21), (6, 42)]);
        assert_eq!(
            network.scalar_enumerator(&ContractionConfig::declared()).unwrap(),
            expected,
        );
        let conjoined = network.conjoin_nodes().unwrap();
        assert_eq!(conjoined.rank(), 6);
        assert_eq!(conjoined.stabilizer_enumerator(None).unwrap(), expected);
        assert_eq!(
            conjoined.normalizer_enumerator().unwrap(),
            poly(&[(0, 1), (3, 21), (4, 21), (5, 126), (6, 42), (7, 45)]),
        );
    }

    #[test]
    fn surface_d3() {
        let h = legos::rotated_surface(3);
        let expected = poly(&[(0, 1), (2, 4), (4, 22), (6, 100), (8, 129)]);
        for config in [
            ContractionConfig::declared(),
            ContractionConfig::greedy(CostKind::StabilizerFlops),
            ContractionConfig::greedy(CostKind::IntermediateSize),
        ] {
            let CodeNetwork { mut network, .. } = tanner_network(&h).unwrap();
            assert_eq!(network.nodes().len(), 17);
            assert_eq!(network.scalar_enumerator(&config).unwrap(), expected);
        }

        let CodeNetwork { mut network, .. } = tanner_network(&h).unwrap();
        let config = ContractionConfig::default().with_truncate_length(Some(4));
        assert_eq!(
            network.scalar_enumerator(&config).unwrap(),
            poly(&[(0, 1), (2, 4), (4, 22)]),
        );
        assert_eq!(
            network.conjoin_nodes().unwrap().normalizer_enumerator().unwrap(),
            poly(&[
                (0, 1), (2, 4), (3, 24), (4, 22), (5, 192),
                (6, 100), (7, 408), (8, 129), (9, 144),
            ]),
        );
    }

    #[test]
    fn open_physical_leg() {
        // summing the tensor over the open leg recovers the scalar enumerator
        let h = legos::rotated_surface(3);
        let CodeNetwork { mut network, qubit_legs } = tanner_network(&h).unwrap();
        let config = ContractionConfig::default();
        let scalar = network.scalar_enumerator(&config).unwrap();
        let wep =
            network.stabilizer_enumerator_polynomial(&qubit_legs[4 .. 5], &config)
            .unwrap();
        assert!(!wep.is_scalar());
        let mut total = Poly::zero();
        for p in [Pauli::I, Pauli::X, Pauli::Z, Pauli::Y] {
            if let Some(part) = wep.get(&[p]) {
                let shift = if p.is_identity() { Poly::one() } else { poly(&[(1, 1)]) };
                total += &(&shift * part);
            }
        }
        assert_eq!(total, scalar);
    }

    #[test]
    fn repeated_checks_keep_tensor_counts() {
        // XXXX twice, then ZZZZ
        let h = linalg::from_rows([
            vec![1_u8, 1, 1, 1, 0, 0, 0, 0],
            vec![1, 1, 1, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 1, 1, 1, 1],
        ])
        .unwrap();
        let CodeNetwork { mut network, qubit_legs } = tanner_network(&h).unwrap();
        assert_eq!(qubit_legs[0], Leg::new(0, 3));
        let config = ContractionConfig::default();
        let wep =
            network.stabilizer_enumerator_polynomial(&qubit_legs[.. 1], &config)
            .unwrap();
        assert_eq!(wep.get(&[Pauli::I]), Some(&poly(&[(0, 2)])));
        for p in [Pauli::X, Pauli::Z, Pauli::Y] {
            assert_eq!(wep.get(&[p]), Some(&poly(&[(3, 2)])));
        }
        let normalized = wep.normalize();
        assert_eq!(normalized.get(&[Pauli::I]), Some(&Poly::one()));
        assert_eq!(normalized.get(&[Pauli::Z]), Some(&poly(&[(3, 1)])));
        assert_eq!(
            network.scalar_enumerator(&config).unwrap(),
            poly(&[(0, 1), (4, 3)]),
        );
    }

    #[test]
    fn zero_rows_and_idle_qubits() {
        // qubit 2 is never checked, and the second row is empty
        let h = linalg::from_rows([
            vec![1_u8, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 1, 0],
        ])
        .unwrap();
        let CodeNetwork { mut network, qubit_legs } = tanner_network(&h).unwrap();
        assert_eq!(network.nodes().len(), 5);
        assert_eq!(qubit_legs[2], Leg::new(2, 0));
        assert_eq!(
            network.scalar_enumerator(&ContractionConfig::default()).unwrap(),
            poly(&[(0, 1), (2, 3)]),
        );
    }
}
