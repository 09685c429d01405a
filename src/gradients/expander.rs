// src/gradients/expander.rs
//! Product-rule expansion of a block's derivative

use crate::error::{GradientError, Result};
use crate::gradients::lookup::{angle_derivative, derivative, DerivativeTerm};
use crate::gradients::split::UnitaryBlock;
use crate::quantum::parameter::Parameter;

/// Derivative of `block` as a weighted sum of gate sequences
///
/// Gates that depend on `parameter` (or, with `None`, every gate with a free
/// parameter) are differentiated. For each such gate its lookup terms are
/// spliced in place while all other gates stay as they are, so a block with
/// one differentiated gate expands to that gate's one or two terms.
pub fn analytic_gradient(
    block: &UnitaryBlock,
    parameter: Option<&Parameter>,
) -> Result<Vec<DerivativeTerm>> {
    if let Some(parameter) = parameter {
        if !block.free_parameters().contains(parameter) {
            return Err(GradientError::ParameterNotFound {
                parameter: parameter.name().to_string(),
            });
        }
    }

    let instructions = block.instructions();
    let mut terms = Vec::new();

    for (index, instruction) in instructions.iter().enumerate() {
        let differentiated = match (instruction.gate.parameter(), parameter) {
            (Some(own), Some(wanted)) => own == wanted,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if differentiated {
            terms.extend(splice(block, index, derivative(instruction)?));
        }
    }

    Ok(terms)
}

/// Derivative of `block` with respect to the angle of its gate at `index`
///
/// Used for blocks from [`split_gates`](crate::gradients::split::split_gates),
/// where the differentiated rotation may have a bound angle.
pub fn gate_gradient(block: &UnitaryBlock, index: usize) -> Result<Vec<DerivativeTerm>> {
    let instruction = block.instructions().get(index).ok_or(GradientError::DimensionMismatch {
        expected: block.len(),
        actual: index + 1,
    })?;
    Ok(splice(block, index, angle_derivative(instruction)?))
}

/// Replace the gate at `index` by each term's gate sequence
fn splice(block: &UnitaryBlock, index: usize, gate_terms: Vec<DerivativeTerm>) -> Vec<DerivativeTerm> {
    let instructions = block.instructions();
    gate_terms
        .into_iter()
        .map(|gate_term| {
            let mut spliced = Vec::with_capacity(instructions.len() + gate_term.block.len());
            spliced.extend_from_slice(&instructions[..index]);
            spliced.extend_from_slice(gate_term.block.instructions());
            spliced.extend_from_slice(&instructions[index + 1..]);
            DerivativeTerm::new(
                gate_term.coefficient,
                UnitaryBlock::new(spliced, block.parameters().to_vec()),
            )
        })
        .collect()
}
