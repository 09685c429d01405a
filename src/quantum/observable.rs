// src/quantum/observable.rs
//! Hermitian observables

use ndarray::{array, Array2};
use num_complex::Complex64;

use crate::error::{GradientError, Result};
use crate::quantum::gate::constants::{FRAC_1_SQRT_2, I, ONE, ZERO};
use crate::quantum::state::{register_dimension, StateVector};

const HERMITIAN_TOLERANCE: f64 = 1e-10;

/// A Hermitian operator acting on the full register
#[derive(Clone, Debug, PartialEq)]
pub struct Observable {
    qubit_count: usize,
    matrix: Array2<Complex64>,
}

impl Observable {
    /// Wrap a Hermitian `2^n × 2^n` matrix
    pub fn from_matrix(matrix: Array2<Complex64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(GradientError::DimensionMismatch { expected: rows, actual: cols });
        }
        if rows == 0 || !rows.is_power_of_two() {
            return Err(GradientError::DimensionMismatch {
                expected: rows.next_power_of_two().max(1),
                actual: rows,
            });
        }

        for i in 0..rows {
            for j in i..cols {
                if (matrix[[i, j]] - matrix[[j, i]].conj()).norm() > HERMITIAN_TOLERANCE {
                    return Err(GradientError::NotHermitian);
                }
            }
        }

        Ok(Observable {
            qubit_count: rows.trailing_zeros() as usize,
            matrix,
        })
    }

    /// Build a tensor product of single-qubit operators from a label like `"ZI"`
    ///
    /// Accepts `I`, `X`, `Y`, `Z` and `H`; the first character acts on qubit 0.
    pub fn from_label(label: &str) -> Result<Self> {
        if label.is_empty() {
            return Err(GradientError::InvalidLabel { label: label.to_string() });
        }
        register_dimension(label.chars().count())?;

        let mut matrix = array![[ONE]];
        for c in label.chars() {
            let factor = match c {
                'I' => array![[ONE, ZERO], [ZERO, ONE]],
                'X' => array![[ZERO, ONE], [ONE, ZERO]],
                'Y' => array![[ZERO, -I], [I, ZERO]],
                'Z' => array![[ONE, ZERO], [ZERO, -ONE]],
                'H' => {
                    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                    array![[h, h], [h, -h]]
                }
                _ => return Err(GradientError::InvalidLabel { label: label.to_string() }),
            };
            matrix = kron(&matrix, &factor);
        }

        Self::from_matrix(matrix)
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// O|ψ⟩
    pub fn apply(&self, state: &StateVector) -> Result<StateVector> {
        self.check_register(state)?;
        state.apply_matrix(&self.matrix)
    }

    /// ⟨ψ|O|ψ⟩, real for a Hermitian observable
    pub fn expectation_value(&self, state: &StateVector) -> Result<f64> {
        let o_psi = self.apply(state)?;
        Ok(state.inner_product(&o_psi)?.re)
    }

    fn check_register(&self, state: &StateVector) -> Result<()> {
        if state.qubit_count() != self.qubit_count {
            return Err(GradientError::QubitCountMismatch {
                expected: self.qubit_count,
                actual: state.qubit_count(),
            });
        }
        Ok(())
    }
}

/// Kronecker product a ⊗ b
fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (n1, m1) = a.dim();
    let (n2, m2) = b.dim();
    let mut result = Array2::zeros((n1 * n2, m1 * m2));

    for i in 0..n1 {
        for j in 0..m1 {
            for k in 0..n2 {
                for l in 0..m2 {
                    result[[i * n2 + k, j * m2 + l]] = a[[i, j]] * b[[k, l]];
                }
            }
        }
    }

    result
}
