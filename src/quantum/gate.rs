// src/quantum/gate.rs
//! Quantum gates
//!
//! Gates form a closed set: fixed gates ([`StandardGate`]) and the six
//! single-angle rotations that have analytic derivative rules
//! ([`ParametrizedGate`]). Rotation angles may be symbolic until a circuit is
//! bound to concrete parameter values.

use std::fmt;

use ndarray::{array, Array2};
use num_complex::Complex64;

use crate::error::{GradientError, Result};
use crate::quantum::parameter::{Parameter, ParameterBinding, ParameterExpression};

/// Common complex numbers used in quantum gates
pub mod constants {
    use num_complex::Complex64;

    /// The imaginary unit i
    pub const I: Complex64 = Complex64::new(0.0, 1.0);

    pub const ONE: Complex64 = Complex64::new(1.0, 0.0);

    pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);

    /// 1/sqrt(2)
    pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
}

/// Trait for quantum gates
pub trait QuantumGate: fmt::Debug + Clone + Send + Sync {
    /// Returns the number of qubits this gate acts on
    fn qubit_count(&self) -> usize;

    /// Returns the matrix representation of this gate
    ///
    /// Fails for gates whose angle is still symbolic.
    fn matrix(&self) -> Result<Array2<Complex64>>;

    /// Returns a display name for this gate
    fn name(&self) -> String;

    /// Returns the adjoint (Hermitian conjugate) of this gate
    fn adjoint(&self) -> Self;
}

/// Standard fixed gates (Pauli, Clifford, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandardGate {
    /// Pauli-X gate (NOT gate)
    X,

    /// Pauli-Y gate
    Y,

    /// Pauli-Z gate
    Z,

    /// Hadamard gate
    H,

    /// Phase gate (S gate)
    S,

    /// Inverse phase gate
    Sdg,

    /// π/8 gate (T gate)
    T,

    /// Inverse π/8 gate
    Tdg,

    /// CNOT gate, control first
    CNOT,

    /// Controlled-Z gate
    CZ,

    /// SWAP gate
    SWAP,
}

impl QuantumGate for StandardGate {
    fn qubit_count(&self) -> usize {
        match self {
            StandardGate::X | StandardGate::Y | StandardGate::Z |
            StandardGate::H | StandardGate::S | StandardGate::Sdg |
            StandardGate::T | StandardGate::Tdg => 1,
            StandardGate::CNOT | StandardGate::CZ | StandardGate::SWAP => 2,
        }
    }

    fn matrix(&self) -> Result<Array2<Complex64>> {
        use constants::*;
        let matrix = match self {
            StandardGate::X => array![
                [ZERO, ONE],
                [ONE, ZERO]
            ],
            StandardGate::Y => array![
                [ZERO, -I],
                [I, ZERO]
            ],
            StandardGate::Z => array![
                [ONE, ZERO],
                [ZERO, -ONE]
            ],
            StandardGate::H => {
                let factor = Complex64::new(FRAC_1_SQRT_2, 0.0);
                array![
                    [factor, factor],
                    [factor, -factor]
                ]
            },
            StandardGate::S => array![
                [ONE, ZERO],
                [ZERO, I]
            ],
            StandardGate::Sdg => array![
                [ONE, ZERO],
                [ZERO, -I]
            ],
            StandardGate::T => array![
                [ONE, ZERO],
                [ZERO, Complex64::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2)]
            ],
            StandardGate::Tdg => array![
                [ONE, ZERO],
                [ZERO, Complex64::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)]
            ],
            StandardGate::CNOT => array![
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ZERO, ONE],
                [ZERO, ZERO, ONE, ZERO]
            ],
            StandardGate::CZ => array![
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ONE, ZERO],
                [ZERO, ZERO, ZERO, -ONE]
            ],
            StandardGate::SWAP => array![
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ZERO, ONE, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ZERO, ONE]
            ],
        };
        Ok(matrix)
    }

    fn name(&self) -> String {
        match self {
            StandardGate::X => "X",
            StandardGate::Y => "Y",
            StandardGate::Z => "Z",
            StandardGate::H => "H",
            StandardGate::S => "S",
            StandardGate::Sdg => "S†",
            StandardGate::T => "T",
            StandardGate::Tdg => "T†",
            StandardGate::CNOT => "CNOT",
            StandardGate::CZ => "CZ",
            StandardGate::SWAP => "SWAP",
        }
        .to_string()
    }

    fn adjoint(&self) -> Self {
        match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            // The rest are Hermitian
            other => *other,
        }
    }
}

/// Rotation angle of a parametrized gate
#[derive(Clone, Debug, PartialEq)]
pub enum Angle {
    /// A concrete angle in radians
    Fixed(f64),

    /// An angle that depends on a free parameter
    Symbolic(ParameterExpression),
}

impl Angle {
    /// The free parameter this angle depends on, if any
    pub fn parameter(&self) -> Option<&Parameter> {
        match self {
            Angle::Fixed(_) => None,
            Angle::Symbolic(expr) => Some(expr.parameter()),
        }
    }

    /// Replace a symbolic angle by its value under `binding`
    pub fn bind(&self, binding: &ParameterBinding) -> Result<Angle> {
        match self {
            Angle::Fixed(theta) => Ok(Angle::Fixed(*theta)),
            Angle::Symbolic(expr) => Ok(Angle::Fixed(expr.evaluate(binding)?)),
        }
    }

    fn negated(&self) -> Angle {
        match self {
            Angle::Fixed(theta) => Angle::Fixed(-theta),
            Angle::Symbolic(expr) => Angle::Symbolic(-expr.clone()),
        }
    }
}

impl From<f64> for Angle {
    fn from(theta: f64) -> Self {
        Angle::Fixed(theta)
    }
}

impl From<Parameter> for Angle {
    fn from(parameter: Parameter) -> Self {
        Angle::Symbolic(parameter.into())
    }
}

impl From<&Parameter> for Angle {
    fn from(parameter: &Parameter) -> Self {
        Angle::Symbolic(parameter.clone().into())
    }
}

impl From<ParameterExpression> for Angle {
    fn from(expr: ParameterExpression) -> Self {
        Angle::Symbolic(expr)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Angle::Fixed(theta) => write!(f, "{:.2}", theta),
            Angle::Symbolic(expr) => write!(f, "{}", expr),
        }
    }
}

/// Parametrized rotation gates, RP(θ) = exp(-iθP/2)
///
/// Controlled variants act as |0⟩⟨0|⊗I + |1⟩⟨1|⊗RP(θ) with the control on the
/// first qubit.
#[derive(Clone, Debug, PartialEq)]
pub enum ParametrizedGate {
    /// Rotation around X-axis
    Rx(Angle),

    /// Rotation around Y-axis
    Ry(Angle),

    /// Rotation around Z-axis
    Rz(Angle),

    /// Controlled rotation around X-axis
    CRx(Angle),

    /// Controlled rotation around Y-axis
    CRy(Angle),

    /// Controlled rotation around Z-axis
    CRz(Angle),
}

impl ParametrizedGate {
    pub fn angle(&self) -> &Angle {
        match self {
            ParametrizedGate::Rx(angle) | ParametrizedGate::Ry(angle) |
            ParametrizedGate::Rz(angle) | ParametrizedGate::CRx(angle) |
            ParametrizedGate::CRy(angle) | ParametrizedGate::CRz(angle) => angle,
        }
    }

    /// Same gate kind with a different angle
    pub fn with_angle(&self, angle: Angle) -> Self {
        match self {
            ParametrizedGate::Rx(_) => ParametrizedGate::Rx(angle),
            ParametrizedGate::Ry(_) => ParametrizedGate::Ry(angle),
            ParametrizedGate::Rz(_) => ParametrizedGate::Rz(angle),
            ParametrizedGate::CRx(_) => ParametrizedGate::CRx(angle),
            ParametrizedGate::CRy(_) => ParametrizedGate::CRy(angle),
            ParametrizedGate::CRz(_) => ParametrizedGate::CRz(angle),
        }
    }

    /// The Pauli operator P generating the rotation
    pub fn generator(&self) -> StandardGate {
        match self {
            ParametrizedGate::Rx(_) | ParametrizedGate::CRx(_) => StandardGate::X,
            ParametrizedGate::Ry(_) | ParametrizedGate::CRy(_) => StandardGate::Y,
            ParametrizedGate::Rz(_) | ParametrizedGate::CRz(_) => StandardGate::Z,
        }
    }

    /// The single-qubit rotation applied to the target of a controlled gate
    pub fn base_rotation(&self) -> ParametrizedGate {
        match self {
            ParametrizedGate::CRx(angle) => ParametrizedGate::Rx(angle.clone()),
            ParametrizedGate::CRy(angle) => ParametrizedGate::Ry(angle.clone()),
            ParametrizedGate::CRz(angle) => ParametrizedGate::Rz(angle.clone()),
            rotation => rotation.clone(),
        }
    }

    /// Gate kind without its angle, e.g. `"CRy"`
    pub fn label(&self) -> &'static str {
        match self {
            ParametrizedGate::Rx(_) => "Rx",
            ParametrizedGate::Ry(_) => "Ry",
            ParametrizedGate::Rz(_) => "Rz",
            ParametrizedGate::CRx(_) => "CRx",
            ParametrizedGate::CRy(_) => "CRy",
            ParametrizedGate::CRz(_) => "CRz",
        }
    }

    pub fn is_controlled(&self) -> bool {
        matches!(
            self,
            ParametrizedGate::CRx(_) | ParametrizedGate::CRy(_) | ParametrizedGate::CRz(_)
        )
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        self.angle().parameter()
    }
}

impl QuantumGate for ParametrizedGate {
    fn qubit_count(&self) -> usize {
        if self.is_controlled() { 2 } else { 1 }
    }

    fn matrix(&self) -> Result<Array2<Complex64>> {
        use constants::*;

        let theta = match self.angle() {
            Angle::Fixed(theta) => *theta,
            Angle::Symbolic(_) => {
                return Err(GradientError::UnboundParameter { gate: self.name() });
            }
        };
        let cos = (theta / 2.0).cos();
        let sin = (theta / 2.0).sin();

        let rotation = match self.generator() {
            StandardGate::X => array![
                [Complex64::new(cos, 0.0), Complex64::new(0.0, -sin)],
                [Complex64::new(0.0, -sin), Complex64::new(cos, 0.0)]
            ],
            StandardGate::Y => array![
                [Complex64::new(cos, 0.0), Complex64::new(-sin, 0.0)],
                [Complex64::new(sin, 0.0), Complex64::new(cos, 0.0)]
            ],
            _ => array![
                [Complex64::new(cos, -sin), ZERO],
                [ZERO, Complex64::new(cos, sin)]
            ],
        };

        if !self.is_controlled() {
            return Ok(rotation);
        }

        let mut controlled = Array2::zeros((4, 4));
        controlled[[0, 0]] = ONE;
        controlled[[1, 1]] = ONE;
        for i in 0..2 {
            for j in 0..2 {
                controlled[[2 + i, 2 + j]] = rotation[[i, j]];
            }
        }
        Ok(controlled)
    }

    fn name(&self) -> String {
        match self {
            ParametrizedGate::Rx(angle) => format!("Rx({})", angle),
            ParametrizedGate::Ry(angle) => format!("Ry({})", angle),
            ParametrizedGate::Rz(angle) => format!("Rz({})", angle),
            ParametrizedGate::CRx(angle) => format!("CRx({})", angle),
            ParametrizedGate::CRy(angle) => format!("CRy({})", angle),
            ParametrizedGate::CRz(angle) => format!("CRz({})", angle),
        }
    }

    fn adjoint(&self) -> Self {
        // Rotation gates have adjoint = rotation by negative angle
        self.with_angle(self.angle().negated())
    }
}

/// Any gate that can appear in a circuit
#[derive(Clone, Debug, PartialEq)]
pub enum Gate {
    Standard(StandardGate),
    Parametrized(ParametrizedGate),
}

impl Gate {
    /// The free parameter this gate depends on, if any
    pub fn parameter(&self) -> Option<&Parameter> {
        match self {
            Gate::Standard(_) => None,
            Gate::Parametrized(gate) => gate.parameter(),
        }
    }

    /// Substitute concrete values for the gate's free parameter
    pub fn bind(&self, binding: &ParameterBinding) -> Result<Gate> {
        match self {
            Gate::Standard(gate) => Ok(Gate::Standard(*gate)),
            Gate::Parametrized(gate) => {
                Ok(Gate::Parametrized(gate.with_angle(gate.angle().bind(binding)?)))
            }
        }
    }
}

impl QuantumGate for Gate {
    fn qubit_count(&self) -> usize {
        match self {
            Gate::Standard(gate) => gate.qubit_count(),
            Gate::Parametrized(gate) => gate.qubit_count(),
        }
    }

    fn matrix(&self) -> Result<Array2<Complex64>> {
        match self {
            Gate::Standard(gate) => gate.matrix(),
            Gate::Parametrized(gate) => gate.matrix(),
        }
    }

    fn name(&self) -> String {
        match self {
            Gate::Standard(gate) => gate.name(),
            Gate::Parametrized(gate) => gate.name(),
        }
    }

    fn adjoint(&self) -> Self {
        match self {
            Gate::Standard(gate) => Gate::Standard(gate.adjoint()),
            Gate::Parametrized(gate) => Gate::Parametrized(gate.adjoint()),
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<ParametrizedGate> for Gate {
    fn from(gate: ParametrizedGate) -> Self {
        Gate::Parametrized(gate)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
