// src/quantum/state.rs
//! Quantum state representations
//!
//! Amplitudes are stored big-endian: qubit 0 is the most significant bit of
//! the basis index, so `|q0 q1 ... q(n-1)⟩` has index `q0·2^(n-1) + ... + q(n-1)`.

use std::fmt::{self, Display};

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{GradientError, Result};
use crate::quantum::circuit::{Instruction, QuantumCircuit};
use crate::quantum::gate::QuantumGate;

/// Widest register a dense statevector is built for
pub const MAX_QUBITS: usize = 30;

/// `2^qubit_count`, or [`GradientError::TooManyQubits`] past [`MAX_QUBITS`]
pub fn register_dimension(qubit_count: usize) -> Result<usize> {
    if qubit_count > MAX_QUBITS {
        return Err(GradientError::TooManyQubits { qubit_count, max: MAX_QUBITS });
    }
    1usize
        .checked_shl(qubit_count as u32)
        .ok_or(GradientError::TooManyQubits { qubit_count, max: MAX_QUBITS })
}

/// State vector representation of a quantum state
///
/// Intermediate vectors of a gradient computation (such as O|ψ⟩) are not
/// normalized, so only the public constructors check the norm.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    /// Number of qubits
    qubit_count: usize,

    /// The state vector as an array of complex amplitudes
    amplitudes: Array1<Complex64>,
}

impl StateVector {
    /// Create a new state vector with the given amplitudes
    pub fn new(qubit_count: usize, amplitudes: Array1<Complex64>) -> Result<Self> {
        let expected_dim = register_dimension(qubit_count)?;

        if amplitudes.len() != expected_dim {
            return Err(GradientError::DimensionMismatch {
                expected: expected_dim,
                actual: amplitudes.len(),
            });
        }

        let norm_sqr: f64 = amplitudes.iter().map(|amp| amp.norm_sqr()).sum();
        if (norm_sqr - 1.0).abs() > 1e-10 {
            return Err(GradientError::NotNormalized { norm_sqr });
        }

        Ok(StateVector { qubit_count, amplitudes })
    }

    /// Create a new state vector in the computational basis state |index⟩
    pub fn computational_basis(qubit_count: usize, index: usize) -> Result<Self> {
        let dim = register_dimension(qubit_count)?;

        if index >= dim {
            return Err(GradientError::DimensionMismatch { expected: dim, actual: index + 1 });
        }

        let mut amplitudes = Array1::zeros(dim);
        amplitudes[index] = Complex64::new(1.0, 0.0);

        Ok(StateVector { qubit_count, amplitudes })
    }

    /// Create the zero state |00...0⟩
    pub fn zero_state(qubit_count: usize) -> Result<Self> {
        Self::computational_basis(qubit_count, 0)
    }

    /// Create a basis state from a bit-string label such as `"0110"`
    ///
    /// The first character is qubit 0.
    pub fn from_label(label: &str) -> Result<Self> {
        if label.is_empty() {
            return Err(GradientError::InvalidLabel { label: label.to_string() });
        }
        let qubit_count = label.chars().count();
        register_dimension(qubit_count)?;

        let mut index = 0usize;
        for c in label.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                _ => return Err(GradientError::InvalidLabel { label: label.to_string() }),
            };
            index = (index << 1) | bit;
        }

        Self::computational_basis(qubit_count, index)
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    /// Returns the dimension of the Hilbert space (2^n for n qubits)
    pub fn dimension(&self) -> usize {
        1 << self.qubit_count
    }

    /// Get a reference to the amplitudes
    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    /// Calculate the probability of measuring the given basis index
    pub fn probability(&self, index: usize) -> f64 {
        if index >= self.dimension() {
            return 0.0;
        }
        self.amplitudes[index].norm_sqr()
    }

    /// Elementwise complex conjugate of the amplitudes
    pub fn conjugate(&self) -> Self {
        StateVector {
            qubit_count: self.qubit_count,
            amplitudes: self.amplitudes.mapv(|amp| amp.conj()),
        }
    }

    /// Inner product ⟨self|other⟩
    pub fn inner_product(&self, other: &Self) -> Result<Complex64> {
        if self.qubit_count != other.qubit_count {
            return Err(GradientError::QubitCountMismatch {
                expected: self.qubit_count,
                actual: other.qubit_count,
            });
        }

        Ok(self
            .amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Apply a full-register operator to this state vector
    pub fn apply_matrix(&self, matrix: &Array2<Complex64>) -> Result<Self> {
        let dim = self.dimension();

        if matrix.shape() != [dim, dim] {
            return Err(GradientError::DimensionMismatch {
                expected: dim,
                actual: matrix.shape()[0],
            });
        }

        Ok(StateVector {
            qubit_count: self.qubit_count,
            amplitudes: matrix.dot(&self.amplitudes),
        })
    }

    /// Apply a gate to the given qubits in place
    pub fn apply_gate<G: QuantumGate>(&mut self, gate: &G, qubits: &[usize]) -> Result<()> {
        if qubits.len() != gate.qubit_count() {
            return Err(GradientError::GateArity {
                gate: gate.name(),
                expected: gate.qubit_count(),
                actual: qubits.len(),
            });
        }
        self.apply_local_matrix(&gate.matrix()?, qubits)
    }

    /// Apply a `2^k × 2^k` matrix to `k` qubits in place
    ///
    /// `qubits[0]` is the most significant bit of the matrix index, so the
    /// first qubit of a controlled gate is its control regardless of where it
    /// sits in the register. The full-register operator is never built.
    pub fn apply_local_matrix(&mut self, matrix: &Array2<Complex64>, qubits: &[usize]) -> Result<()> {
        let k = qubits.len();
        if k > self.qubit_count {
            return Err(GradientError::DimensionMismatch {
                expected: self.qubit_count,
                actual: k,
            });
        }
        let local_dim = 1 << k;
        if matrix.shape() != [local_dim, local_dim] {
            return Err(GradientError::DimensionMismatch {
                expected: local_dim,
                actual: matrix.shape()[0],
            });
        }

        let mut mask = 0usize;
        let mut shifts = Vec::with_capacity(k);
        for &q in qubits {
            if q >= self.qubit_count {
                return Err(GradientError::QubitOutOfRange {
                    index: q,
                    qubit_count: self.qubit_count,
                });
            }
            let shift = self.qubit_count - 1 - q;
            if mask & (1 << shift) != 0 {
                return Err(GradientError::DuplicateQubit { qubit: q });
            }
            mask |= 1 << shift;
            shifts.push(shift);
        }

        // Offset of each local basis state within a block of the full register
        let offsets: Vec<usize> = (0..local_dim)
            .map(|sub| {
                shifts
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| (sub >> (k - 1 - position)) & 1 == 1)
                    .fold(0, |acc, (_, &shift)| acc | (1 << shift))
            })
            .collect();

        let mut local = vec![Complex64::new(0.0, 0.0); local_dim];
        for base in (0..self.dimension()).filter(|i| i & mask == 0) {
            for (sub, offset) in offsets.iter().enumerate() {
                local[sub] = self.amplitudes[base | offset];
            }
            for (row, offset) in offsets.iter().enumerate() {
                let mut acc = Complex64::new(0.0, 0.0);
                for (col, amp) in local.iter().enumerate() {
                    acc += matrix[[row, col]] * amp;
                }
                self.amplitudes[base | offset] = acc;
            }
        }

        Ok(())
    }

    /// Apply a sequence of instructions in place
    pub fn evolve_in_place(&mut self, instructions: &[Instruction]) -> Result<()> {
        for instruction in instructions {
            self.apply_gate(&instruction.gate, &instruction.qubits)?;
        }
        Ok(())
    }

    /// Evolve a copy of this state through a sequence of instructions
    pub fn evolve_instructions(&self, instructions: &[Instruction]) -> Result<Self> {
        let mut state = self.clone();
        state.evolve_in_place(instructions)?;
        Ok(state)
    }

    /// Evolve a copy of this state through a bound circuit
    pub fn evolve(&self, circuit: &QuantumCircuit) -> Result<Self> {
        if circuit.qubit_count() != self.qubit_count {
            return Err(GradientError::QubitCountMismatch {
                expected: self.qubit_count,
                actual: circuit.qubit_count(),
            });
        }
        self.evolve_instructions(circuit.instructions())
    }
}

/// Lists the basis states with non-negligible weight, one per line
impl Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self.qubit_count;
        let mut support = self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(_, amp)| amp.norm_sqr() > 1e-10)
            .peekable();

        if support.peek().is_none() {
            return writeln!(f, "|{}⟩ has no support", "0".repeat(width));
        }
        for (index, amp) in support {
            writeln!(
                f,
                "|{:0width$b}⟩  {:+.6}{:+.6}i  p={:.6}",
                index,
                amp.re,
                amp.im,
                amp.norm_sqr(),
                width = width
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::gate::{ParametrizedGate, StandardGate};

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_from_label_is_big_endian() {
        let state = StateVector::from_label("01").unwrap();
        assert_eq!(state.qubit_count(), 2);
        assert_eq!(state.probability(1), 1.0);

        let state = StateVector::from_label("100").unwrap();
        assert_eq!(state.probability(4), 1.0);

        assert!(StateVector::from_label("0a").is_err());
        assert!(StateVector::from_label("").is_err());
    }

    #[test]
    fn test_new_rejects_unnormalized() {
        let amplitudes = Array1::from(vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)]);
        assert!(StateVector::new(1, amplitudes).is_err());
    }

    #[test]
    fn test_bell_state_from_local_gates() {
        let mut state = StateVector::zero_state(2).unwrap();
        state.apply_gate(&StandardGate::H, &[0]).unwrap();
        state.apply_gate(&StandardGate::CNOT, &[0, 1]).unwrap();

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        let amplitudes = state.amplitudes();
        assert!(approx_eq(amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_control_below_target() {
        // CNOT with control on qubit 1 flips qubit 0
        let mut state = StateVector::from_label("01").unwrap();
        state.apply_gate(&StandardGate::CNOT, &[1, 0]).unwrap();
        assert_eq!(state, StateVector::from_label("11").unwrap());
    }

    #[test]
    fn test_local_matches_full_operator() {
        // Rx on the middle qubit of three equals (I ⊗ Rx ⊗ I)
        let gate = ParametrizedGate::Rx(0.4.into());
        let rx = gate.matrix().unwrap();
        let mut full = Array2::zeros((8, 8));
        for i in 0..8usize {
            for j in 0..8usize {
                if (i & 0b101) == (j & 0b101) {
                    full[[i, j]] = rx[[(i >> 1) & 1, (j >> 1) & 1]];
                }
            }
        }

        let mut local = StateVector::from_label("010").unwrap();
        let reference = local.apply_matrix(&full).unwrap();
        local.apply_gate(&gate, &[1]).unwrap();

        for i in 0..8 {
            assert!(approx_eq(local.amplitudes()[i], reference.amplitudes()[i]));
        }
    }

    #[test]
    fn test_apply_gate_errors() {
        let mut state = StateVector::zero_state(2).unwrap();
        assert!(matches!(
            state.apply_gate(&StandardGate::X, &[2]),
            Err(GradientError::QubitOutOfRange { index: 2, qubit_count: 2 })
        ));
        assert!(matches!(
            state.apply_gate(&StandardGate::CNOT, &[1, 1]),
            Err(GradientError::DuplicateQubit { qubit: 1 })
        ));
        assert!(matches!(
            state.apply_gate(&StandardGate::CNOT, &[1]),
            Err(GradientError::GateArity { .. })
        ));
    }

    #[test]
    fn test_inner_product_and_conjugate() {
        let mut state = StateVector::zero_state(1).unwrap();
        state.apply_gate(&StandardGate::H, &[0]).unwrap();
        state.apply_gate(&StandardGate::S, &[0]).unwrap();

        let norm = state.inner_product(&state).unwrap();
        assert!(approx_eq(norm, Complex64::new(1.0, 0.0)));

        let conj = state.conjugate();
        assert!(approx_eq(conj.amplitudes()[1], state.amplitudes()[1].conj()));

        let other = StateVector::zero_state(2).unwrap();
        assert!(state.inner_product(&other).is_err());
    }

    #[test]
    fn test_oversized_registers_are_rejected() {
        let wide = "0".repeat(64);
        assert!(matches!(
            StateVector::from_label(&wide),
            Err(GradientError::TooManyQubits { qubit_count: 64, .. })
        ));
        assert!(matches!(
            StateVector::zero_state(64),
            Err(GradientError::TooManyQubits { .. })
        ));
        assert!(StateVector::computational_basis(MAX_QUBITS + 1, 0).is_err());
        assert!(StateVector::new(200, Array1::zeros(2)).is_err());
        assert_eq!(register_dimension(3).unwrap(), 8);
    }

    #[test]
    fn test_display_lists_support() {
        let mut state = StateVector::zero_state(2).unwrap();
        state.apply_gate(&StandardGate::H, &[1]).unwrap();

        let text = state.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("|00⟩"));
        assert!(lines[1].starts_with("|01⟩"));
        assert!(lines[1].ends_with("p=0.500000"));
    }
}
