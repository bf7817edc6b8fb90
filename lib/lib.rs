#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! This package computes the weight enumerators of [stabilizer
//! codes][stabilizer] by contracting networks of small stabilizer tensors, in
//! the style of the [quantum lego][lego] framework.
//!
//! - [`pauli`] and [`linalg`] provide the symplectic representation of Pauli
//! operators and the GF(2) matrix routines used to trace legs of parity-check
//! matrices together.
//! - [`poly`] implements weight enumerator polynomials with arbitrary-precision
//! coefficients, including the MacWilliams identity.
//! - [`tensor`] holds single stabilizer tensors and the sparse, partially
//! traced enumerators that are passed between contraction steps.
//! - [`network`] declares networks of tensors, plans the order in which they
//! are contracted, and drives the contraction to a final enumerator.
//! - [`legos`] collects parity-check matrices of common building blocks.
//!
//! The cost of a contraction is exponential only in the number of generators
//! of the largest intermediate result, not in the total number of qubits, so
//! the planners in [`network`] try to keep intermediate results small.
//!
//! [stabilizer]: https://en.wikipedia.org/wiki/Stabilizer_code
//! [lego]: https://arxiv.org/abs/2109.08158
//!
//! # Further reading
//! - C. Cao and B. Lackey, "Quantum Lego: Building Quantum Error Correction
//! Codes from Tensor Networks." [arXiv:2109.08158](https://arxiv.org/abs/2109.08158)
//! - C. Cao, M. J. Gullans, B. Lackey, and Z. Wang, "Quantum Lego Expansion
//! Pack: Enumerators from Tensor Networks."
//! [arXiv:2308.05152](https://arxiv.org/abs/2308.05152)
//! - P. Shor and R. Laflamme, "Quantum Analog of the MacWilliams Identities
//! for Classical Coding Theory."
//! [arXiv:quant-ph/9610040](https://arxiv.org/abs/quant-ph/9610040)
//!

pub mod pauli;
pub mod linalg;
pub mod poly;
pub mod tensor;
pub mod legos;
pub mod network;
pub(crate) mod vizdefs;
