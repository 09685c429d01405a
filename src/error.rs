//! Error types for gradient evaluation and the statevector layer underneath it

use thiserror::Error;

/// Errors raised while building circuits, evolving states or computing gradients
///
/// Every failure is structural (bad input), so nothing in the crate retries.
#[derive(Error, Debug)]
pub enum GradientError {
    /// The derivative lookup was asked to differentiate a gate that is not a rotation
    #[error("Cannot differentiate gate '{gate}': no derivative rule for it")]
    UnsupportedGate { gate: String },

    /// A parameter referenced by the circuit has no value in the binding
    #[error("No value bound for parameter '{parameter}'")]
    MissingBinding { parameter: String },

    /// An explicit target parameter does not occur where it was requested
    #[error("Parameter '{parameter}' does not occur in this circuit")]
    ParameterNotFound { parameter: String },

    /// A gate with a symbolic angle was evaluated before binding
    #[error("Gate '{gate}' still has a free parameter; bind it before evolving")]
    UnboundParameter { gate: String },

    /// Qubit index outside the register
    #[error("Qubit index {index} out of range for {qubit_count}-qubit register")]
    QubitOutOfRange { index: usize, qubit_count: usize },

    /// Wrong number of qubits given for a gate
    #[error("Gate '{gate}' acts on {expected} qubits, but {actual} were specified")]
    GateArity { gate: String, expected: usize, actual: usize },

    /// The same qubit was listed twice for one gate
    #[error("Duplicate qubit {qubit} in gate operation")]
    DuplicateQubit { qubit: usize },

    /// Vector or matrix sizes disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Register too wide for a dense statevector
    #[error("{qubit_count} qubits exceed the supported maximum of {max}")]
    TooManyQubits { qubit_count: usize, max: usize },

    /// Observable, state and circuit do not act on the same register
    #[error("Qubit count mismatch: expected {expected}, got {actual}")]
    QubitCountMismatch { expected: usize, actual: usize },

    /// State amplitudes do not have unit norm
    #[error("State vector not normalized, squared norm = {norm_sqr}")]
    NotNormalized { norm_sqr: f64 },

    /// Observable matrix is not Hermitian
    #[error("Observable is not Hermitian")]
    NotHermitian,

    /// A state or observable label could not be parsed
    #[error("Invalid label '{label}'")]
    InvalidLabel { label: String },

    /// Batched parameter values are ragged or incomplete
    #[error("Malformed parameter batch: {detail}")]
    BatchShape { detail: String },

    /// The dedicated worker pool could not be started
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// One sample of a batch failed
    #[error("Sample {index} of the batch failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<GradientError>,
    },
}

/// Result type for gradient and simulation operations
pub type Result<T> = std::result::Result<T, GradientError>;
