// src/quantum/mod.rs
//! Statevector simulation layer
//!
//! This module implements parameters, gates, circuits, states and observables:
//! everything the gradient engines need to evolve and measure a register.

pub mod parameter;
pub mod gate;
pub mod circuit;
pub mod state;
pub mod observable;

pub use parameter::{Parameter, ParameterBinding, ParameterExpression};
pub use gate::{Angle, Gate, QuantumGate, StandardGate, ParametrizedGate};
pub use circuit::{Instruction, QuantumCircuit, CircuitBuilder};
pub use state::StateVector;
pub use observable::Observable;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use super::{Parameter, ParameterBinding, ParameterExpression};
    pub use super::{Angle, Gate, QuantumGate, StandardGate, ParametrizedGate};
    pub use super::{Instruction, QuantumCircuit, CircuitBuilder};
    pub use super::{StateVector, Observable};
}
