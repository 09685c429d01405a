// src/gradients/reference.rs
//! Reference gradient engine
//!
//! Every derivative term is turned into a full circuit (the bound blocks with
//! block `j` replaced by the term) and simulated from the initial state. The
//! cost grows quadratically with circuit depth; the engine exists as ground
//! truth for [`iterative`](super::iterative).

use num_complex::Complex64;

use crate::error::{GradientError, Result};
use crate::gradients::lookup::DerivativeTerm;
use crate::gradients::split::UnitaryBlock;
use crate::quantum::circuit::QuantumCircuit;
use crate::quantum::observable::Observable;
use crate::quantum::state::StateVector;

/// Expectation value and per-block derivatives of a bound sample
///
/// `circuit` is the bound ansatz; `blocks` and `terms` are its bound split and
/// the bound derivative terms of each block.
pub fn block_gradients(
    observable: &Observable,
    initial_state: &StateVector,
    circuit: &QuantumCircuit,
    blocks: &[UnitaryBlock],
    terms: &[Vec<DerivativeTerm>],
) -> Result<(f64, Vec<f64>)> {
    if terms.len() != blocks.len() {
        return Err(GradientError::DimensionMismatch {
            expected: blocks.len(),
            actual: terms.len(),
        });
    }

    let forward = initial_state.evolve(circuit)?;
    let lambda = observable.apply(&forward)?;
    let expectation_value = forward.inner_product(&lambda)?.re;

    let mut derivatives = Vec::with_capacity(blocks.len());
    for (j, block_terms) in terms.iter().enumerate() {
        let mut sum = Complex64::new(0.0, 0.0);

        for term in block_terms {
            let mut phi = initial_state.clone();
            for block in &blocks[..j] {
                phi.evolve_in_place(block.instructions())?;
            }
            phi.evolve_in_place(term.block.instructions())?;
            for block in &blocks[j + 1..] {
                phi.evolve_in_place(block.instructions())?;
            }

            sum += term.coefficient * lambda.inner_product(&phi)?;
        }

        derivatives.push(2.0 * sum.re);
    }

    Ok((expectation_value, derivatives))
}
