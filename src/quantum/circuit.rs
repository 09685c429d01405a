// src/quantum/circuit.rs
//! Quantum circuits as ordered gate sequences

use std::collections::HashSet;

use crate::error::{GradientError, Result};
use crate::quantum::gate::{Angle, Gate, ParametrizedGate, QuantumGate, StandardGate};
use crate::quantum::parameter::{Parameter, ParameterBinding};

/// A gate placed on specific qubits
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub gate: Gate,
    pub qubits: Vec<usize>,
}

impl Instruction {
    pub fn new(gate: impl Into<Gate>, qubits: &[usize]) -> Self {
        Instruction {
            gate: gate.into(),
            qubits: qubits.to_vec(),
        }
    }

    /// Bind the gate's free parameter, keeping the placement
    pub fn bind(&self, binding: &ParameterBinding) -> Result<Instruction> {
        Ok(Instruction {
            gate: self.gate.bind(binding)?,
            qubits: self.qubits.clone(),
        })
    }

    pub fn adjoint(&self) -> Instruction {
        Instruction {
            gate: self.gate.adjoint(),
            qubits: self.qubits.clone(),
        }
    }
}

/// Bind every instruction of a sequence
pub fn bind_instructions(instructions: &[Instruction], binding: &ParameterBinding) -> Result<Vec<Instruction>> {
    instructions.iter().map(|instruction| instruction.bind(binding)).collect()
}

/// Adjoint of a gate sequence: reversed order, each gate replaced by its adjoint
pub fn inverse_instructions(instructions: &[Instruction]) -> Vec<Instruction> {
    instructions.iter().rev().map(Instruction::adjoint).collect()
}

/// Free parameters of a gate sequence, unique, in order of first appearance
pub fn instruction_parameters(instructions: &[Instruction]) -> Vec<Parameter> {
    let mut seen = HashSet::new();
    instructions
        .iter()
        .filter_map(|instruction| instruction.gate.parameter())
        .filter(|p| seen.insert((*p).clone()))
        .cloned()
        .collect()
}

/// A quantum circuit consisting of a sequence of gates
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumCircuit {
    instructions: Vec<Instruction>,
    qubit_count: usize,
}

impl QuantumCircuit {
    /// Create a new empty quantum circuit
    pub fn new(qubit_count: usize) -> Self {
        QuantumCircuit {
            instructions: Vec::new(),
            qubit_count,
        }
    }

    pub fn add_gate(&mut self, gate: impl Into<Gate>, qubits: &[usize]) -> Result<()> {
        let gate = gate.into();

        // Check gate's qubit count matches the specified qubits
        if gate.qubit_count() != qubits.len() {
            return Err(GradientError::GateArity {
                gate: gate.name(),
                expected: gate.qubit_count(),
                actual: qubits.len(),
            });
        }

        // Validate qubit indices
        for (i, &q) in qubits.iter().enumerate() {
            if q >= self.qubit_count {
                return Err(GradientError::QubitOutOfRange {
                    index: q,
                    qubit_count: self.qubit_count,
                });
            }
            if qubits[..i].contains(&q) {
                return Err(GradientError::DuplicateQubit { qubit: q });
            }
        }

        self.instructions.push(Instruction {
            gate,
            qubits: qubits.to_vec(),
        });
        Ok(())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    /// Get the number of gates in the circuit
    pub fn gate_count(&self) -> usize {
        self.instructions.len()
    }

    /// Free parameters in order of first appearance
    pub fn parameters(&self) -> Vec<Parameter> {
        instruction_parameters(&self.instructions)
    }

    pub fn is_parameterized(&self) -> bool {
        self.instructions.iter().any(|i| i.gate.parameter().is_some())
    }

    /// Replace every symbolic angle by its value under `binding`
    pub fn bind(&self, binding: &ParameterBinding) -> Result<QuantumCircuit> {
        Ok(QuantumCircuit {
            instructions: bind_instructions(&self.instructions, binding)?,
            qubit_count: self.qubit_count,
        })
    }

    /// Create the inverse (dagger) of this circuit
    pub fn inverse(&self) -> QuantumCircuit {
        QuantumCircuit {
            instructions: inverse_instructions(&self.instructions),
            qubit_count: self.qubit_count,
        }
    }

    /// This circuit followed by `other`
    pub fn compose(&self, other: &QuantumCircuit) -> Result<QuantumCircuit> {
        if self.qubit_count != other.qubit_count {
            return Err(GradientError::QubitCountMismatch {
                expected: self.qubit_count,
                actual: other.qubit_count,
            });
        }

        let mut result = self.clone();
        result.instructions.extend(other.instructions.iter().cloned());
        Ok(result)
    }
}

/// A builder for quantum circuits
pub struct CircuitBuilder {
    circuit: QuantumCircuit,
}

impl CircuitBuilder {
    /// Create a new circuit builder
    pub fn new(qubit_count: usize) -> Self {
        CircuitBuilder {
            circuit: QuantumCircuit::new(qubit_count),
        }
    }

    /// Build the quantum circuit
    pub fn build(self) -> QuantumCircuit {
        self.circuit
    }

    pub fn add_gate(&mut self, gate: impl Into<Gate>, qubits: &[usize]) -> Result<&mut Self> {
        self.circuit.add_gate(gate, qubits)?;
        Ok(self)
    }

    /// Add a Hadamard gate
    pub fn h(&mut self, qubit: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::H, &[qubit])
    }

    /// Add a Pauli-X gate
    pub fn x(&mut self, qubit: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::X, &[qubit])
    }

    /// Add a Pauli-Y gate
    pub fn y(&mut self, qubit: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::Y, &[qubit])
    }

    /// Add a Pauli-Z gate
    pub fn z(&mut self, qubit: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::Z, &[qubit])
    }

    pub fn s(&mut self, qubit: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::S, &[qubit])
    }

    pub fn t(&mut self, qubit: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::T, &[qubit])
    }

    /// Add a CNOT gate
    pub fn cnot(&mut self, control: usize, target: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::CNOT, &[control, target])
    }

    pub fn cz(&mut self, control: usize, target: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::CZ, &[control, target])
    }

    /// Add a SWAP gate
    pub fn swap(&mut self, qubit1: usize, qubit2: usize) -> Result<&mut Self> {
        self.add_gate(StandardGate::SWAP, &[qubit1, qubit2])
    }

    /// Add an Rx gate
    pub fn rx(&mut self, qubit: usize, theta: impl Into<Angle>) -> Result<&mut Self> {
        self.add_gate(ParametrizedGate::Rx(theta.into()), &[qubit])
    }

    /// Add an Ry gate
    pub fn ry(&mut self, qubit: usize, theta: impl Into<Angle>) -> Result<&mut Self> {
        self.add_gate(ParametrizedGate::Ry(theta.into()), &[qubit])
    }

    /// Add an Rz gate
    pub fn rz(&mut self, qubit: usize, theta: impl Into<Angle>) -> Result<&mut Self> {
        self.add_gate(ParametrizedGate::Rz(theta.into()), &[qubit])
    }

    /// Add a controlled Rx gate
    pub fn crx(&mut self, control: usize, target: usize, theta: impl Into<Angle>) -> Result<&mut Self> {
        self.add_gate(ParametrizedGate::CRx(theta.into()), &[control, target])
    }

    /// Add a controlled Ry gate
    pub fn cry(&mut self, control: usize, target: usize, theta: impl Into<Angle>) -> Result<&mut Self> {
        self.add_gate(ParametrizedGate::CRy(theta.into()), &[control, target])
    }

    /// Add a controlled Rz gate
    pub fn crz(&mut self, control: usize, target: usize, theta: impl Into<Angle>) -> Result<&mut Self> {
        self.add_gate(ParametrizedGate::CRz(theta.into()), &[control, target])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::state::StateVector;

    #[test]
    fn test_add_gate_validation() {
        let mut circuit = QuantumCircuit::new(2);
        assert!(matches!(
            circuit.add_gate(StandardGate::H, &[2]),
            Err(GradientError::QubitOutOfRange { index: 2, qubit_count: 2 })
        ));
        assert!(matches!(
            circuit.add_gate(StandardGate::CNOT, &[0]),
            Err(GradientError::GateArity { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            circuit.add_gate(StandardGate::CZ, &[1, 1]),
            Err(GradientError::DuplicateQubit { qubit: 1 })
        ));
        assert_eq!(circuit.gate_count(), 0);
    }

    #[test]
    fn test_parameters_in_first_appearance_order() {
        let a = Parameter::new("a");
        let b = Parameter::new("b");
        let mut builder = CircuitBuilder::new(2);
        builder.ry(1, &b).unwrap()
            .h(0).unwrap()
            .rx(0, &a).unwrap()
            .crz(0, 1, b.clone() * 0.5).unwrap()
            .rz(1, 0.3).unwrap();
        let circuit = builder.build();

        assert_eq!(circuit.parameters(), vec![b, a]);
        assert!(circuit.is_parameterized());
    }

    #[test]
    fn test_bind_requires_every_parameter() {
        let a = Parameter::new("a");
        let b = Parameter::new("b");
        let mut builder = CircuitBuilder::new(1);
        builder.rx(0, &a).unwrap().rz(0, &b).unwrap();
        let circuit = builder.build();

        let partial = ParameterBinding::new().with(&a, 0.1);
        assert!(matches!(
            circuit.bind(&partial),
            Err(GradientError::MissingBinding { parameter }) if parameter == "b"
        ));

        let bound = circuit.bind(&partial.with(&b, 0.2)).unwrap();
        assert!(!bound.is_parameterized());
    }

    #[test]
    fn test_inverse_undoes_circuit() {
        let mut builder = CircuitBuilder::new(2);
        builder.h(0).unwrap()
            .cnot(0, 1).unwrap()
            .ry(1, 0.7).unwrap()
            .crx(1, 0, 1.3).unwrap()
            .t(0).unwrap();
        let circuit = builder.build();

        let start = StateVector::from_label("01").unwrap();
        let there = start.evolve(&circuit).unwrap();
        let back = there.evolve(&circuit.inverse()).unwrap();

        for (a, b) in back.amplitudes().iter().zip(start.amplitudes().iter()) {
            assert!((a - b).norm() < 1e-10);
        }
    }

    #[test]
    fn test_compose_appends() {
        let mut first = QuantumCircuit::new(1);
        first.add_gate(StandardGate::X, &[0]).unwrap();
        let mut second = QuantumCircuit::new(1);
        second.add_gate(StandardGate::H, &[0]).unwrap();

        let composed = first.compose(&second).unwrap();
        assert_eq!(composed.gate_count(), 2);
        assert_eq!(composed.instructions()[1].gate, Gate::Standard(StandardGate::H));

        assert!(first.compose(&QuantumCircuit::new(2)).is_err());
    }
}
