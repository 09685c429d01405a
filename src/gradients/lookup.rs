// src/gradients/lookup.rs
//! Analytic derivative rules for the rotation gates
//!
//! With RP(θ) = exp(-iθP/2) and θ = s·p + c,
//!
//! * `d/dp RP(θ) = s·(-i/2)·P·RP(θ)`, one term;
//! * `d/dp CRP(θ) = (-i·s/4)·(I⊗P·RP) + (i·s/4)·(Z⊗P·RP)`, two terms, from
//!   `|1⟩⟨1| = (I - Z)/2` on the control.
//!
//! Each term is a coefficient plus a short gate sequence whose product is the
//! operator multiplying it.

use num_complex::Complex64;

use crate::error::{GradientError, Result};
use crate::gradients::split::UnitaryBlock;
use crate::quantum::circuit::Instruction;
use crate::quantum::gate::{Angle, Gate, QuantumGate, StandardGate};
use crate::quantum::parameter::ParameterBinding;

/// One summand of a derivative: `coefficient · block`
#[derive(Clone, Debug, PartialEq)]
pub struct DerivativeTerm {
    pub coefficient: Complex64,
    pub block: UnitaryBlock,
}

impl DerivativeTerm {
    pub fn new(coefficient: Complex64, block: UnitaryBlock) -> Self {
        DerivativeTerm { coefficient, block }
    }

    pub fn bind(&self, binding: &ParameterBinding) -> Result<DerivativeTerm> {
        Ok(DerivativeTerm {
            coefficient: self.coefficient,
            block: self.block.bind(binding)?,
        })
    }
}

/// Derivative of a single gate with respect to the parameter its angle depends on
///
/// A symbolic angle `s·p + c` contributes the chain factor `s`; a fixed angle
/// is differentiated by the angle itself. Non-rotation gates are rejected
/// with [`GradientError::UnsupportedGate`].
pub fn derivative(instruction: &Instruction) -> Result<Vec<DerivativeTerm>> {
    rotation_terms(instruction, |angle| match angle {
        Angle::Symbolic(expr) => expr.gradient(),
        Angle::Fixed(_) => 1.0,
    })
}

/// Derivative of a rotation with respect to its own angle θ
pub fn angle_derivative(instruction: &Instruction) -> Result<Vec<DerivativeTerm>> {
    rotation_terms(instruction, |_| 1.0)
}

fn rotation_terms(
    instruction: &Instruction,
    chain_factor: impl Fn(&Angle) -> f64,
) -> Result<Vec<DerivativeTerm>> {
    let gate = match &instruction.gate {
        Gate::Parametrized(gate) => gate,
        Gate::Standard(gate) => {
            return Err(GradientError::UnsupportedGate { gate: gate.name() });
        }
    };
    let scale = chain_factor(gate.angle());

    let pauli = gate.generator();
    let rotation = gate.base_rotation();

    match (gate.is_controlled(), instruction.qubits.as_slice()) {
        (false, &[qubit]) => {
            let block = UnitaryBlock::from_instructions(vec![
                Instruction::new(rotation, &[qubit]),
                Instruction::new(pauli, &[qubit]),
            ]);
            Ok(vec![DerivativeTerm::new(Complex64::new(0.0, -scale / 2.0), block)])
        }
        (true, &[control, target]) => {
            let uncontrolled = UnitaryBlock::from_instructions(vec![
                Instruction::new(rotation.clone(), &[target]),
                Instruction::new(pauli, &[target]),
            ]);
            let projected = UnitaryBlock::from_instructions(vec![
                Instruction::new(StandardGate::Z, &[control]),
                Instruction::new(rotation, &[target]),
                Instruction::new(pauli, &[target]),
            ]);
            Ok(vec![
                DerivativeTerm::new(Complex64::new(0.0, -scale / 4.0), uncontrolled),
                DerivativeTerm::new(Complex64::new(0.0, scale / 4.0), projected),
            ])
        }
        _ => Err(GradientError::GateArity {
            gate: gate.name(),
            expected: gate.qubit_count(),
            actual: instruction.qubits.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use crate::quantum::gate::ParametrizedGate;
    use crate::quantum::parameter::Parameter;
    use crate::quantum::state::StateVector;

    /// Σ c·T as a dense operator, built column by column from basis states
    fn term_operator(terms: &[DerivativeTerm], binding: &ParameterBinding, qubits: usize) -> Array2<Complex64> {
        let dim = 1 << qubits;
        let mut op = Array2::zeros((dim, dim));
        for term in terms {
            let bound = term.bind(binding).unwrap();
            for col in 0..dim {
                let basis = StateVector::computational_basis(qubits, col).unwrap();
                let image = basis.evolve_instructions(bound.block.instructions()).unwrap();
                for row in 0..dim {
                    op[[row, col]] += term.coefficient * image.amplitudes()[row];
                }
            }
        }
        op
    }

    fn finite_difference(gate: &ParametrizedGate, p: &Parameter, value: f64) -> Array2<Complex64> {
        let h = 1e-6;
        let plus = Gate::from(gate.clone())
            .bind(&ParameterBinding::new().with(p, value + h)).unwrap()
            .matrix().unwrap();
        let minus = Gate::from(gate.clone())
            .bind(&ParameterBinding::new().with(p, value - h)).unwrap()
            .matrix().unwrap();
        (plus - minus).mapv(|x| x / (2.0 * h))
    }

    fn assert_close(a: &Array2<Complex64>, b: &Array2<Complex64>) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).norm() < 1e-6, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_rotation_derivatives_match_finite_difference() {
        let p = Parameter::new("p");
        let angle = Angle::from(p.clone() * 1.7 + 0.3);
        for gate in [
            ParametrizedGate::Rx(angle.clone()),
            ParametrizedGate::Ry(angle.clone()),
            ParametrizedGate::Rz(angle.clone()),
        ] {
            let terms = derivative(&Instruction::new(gate.clone(), &[0])).unwrap();
            assert_eq!(terms.len(), 1);
            let binding = ParameterBinding::new().with(&p, 0.42);
            assert_close(&term_operator(&terms, &binding, 1), &finite_difference(&gate, &p, 0.42));
        }
    }

    #[test]
    fn test_controlled_rotation_has_two_opposite_terms() {
        let p = Parameter::new("p");
        for gate in [
            ParametrizedGate::CRx(p.clone().into()),
            ParametrizedGate::CRy((p.clone() * -0.5).into()),
            ParametrizedGate::CRz((p.clone() + 1.0).into()),
        ] {
            let terms = derivative(&Instruction::new(gate.clone(), &[0, 1])).unwrap();
            assert_eq!(terms.len(), 2);
            assert!((terms[0].coefficient + terms[1].coefficient).norm() < 1e-15);

            let binding = ParameterBinding::new().with(&p, -0.8);
            assert_close(&term_operator(&terms, &binding, 2), &finite_difference(&gate, &p, -0.8));
        }
    }

    #[test]
    fn test_standard_gates_are_unsupported() {
        let cnot = Instruction::new(StandardGate::CNOT, &[0, 1]);
        assert!(matches!(derivative(&cnot), Err(GradientError::UnsupportedGate { .. })));
        assert!(matches!(angle_derivative(&cnot), Err(GradientError::UnsupportedGate { .. })));
    }

    #[test]
    fn test_fixed_angle_rotation_has_unit_chain_factor() {
        let fixed = Instruction::new(ParametrizedGate::Ry(0.5.into()), &[0]);
        let terms = derivative(&fixed).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].coefficient, Complex64::new(0.0, -0.5));

        let p = Parameter::new("p");
        let gate = ParametrizedGate::Rx((p.clone() * 3.0).into());
        let by_parameter = derivative(&Instruction::new(gate.clone(), &[0])).unwrap();
        let by_angle = angle_derivative(&Instruction::new(gate, &[0])).unwrap();
        assert_eq!(by_parameter[0].coefficient, Complex64::new(0.0, -1.5));
        assert_eq!(by_angle[0].coefficient, Complex64::new(0.0, -0.5));
        assert_eq!(by_parameter[0].block, by_angle[0].block);
    }
}
