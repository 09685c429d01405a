// src/gradients/engine.rs
//! The public gradient engine
//!
//! [`StateGradient`] ties an observable and an ansatz together. Construction
//! splits the ansatz into blocks and expands each block's derivative once;
//! every evaluation then only binds those templates to the sample's
//! parameter values and runs one of the two engines.

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GradientError, Result};
use crate::gradients::accumulate::{accumulate, reindex};
use crate::gradients::batch::dispatch;
use crate::gradients::expander::{analytic_gradient, gate_gradient};
use crate::gradients::lookup::DerivativeTerm;
use crate::gradients::split::{split, split_gates, UnitaryBlock};
use crate::gradients::{iterative, reference};
use crate::quantum::circuit::QuantumCircuit;
use crate::quantum::observable::Observable;
use crate::quantum::parameter::{Parameter, ParameterBinding};
use crate::quantum::state::StateVector;

/// Which engine computes the gradient
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientMethod {
    /// Linear-time reverse sweep
    #[default]
    Iterative,

    /// One full simulation per derivative term
    Reference,
}

/// Evaluation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    pub method: GradientMethod,

    /// When false only expectation values are computed
    pub compute_gradients: bool,

    /// Batches with at least this many samples run in parallel
    pub parallel_threshold: usize,

    /// Size of a dedicated worker pool; `None` uses rayon's global pool
    pub num_workers: Option<usize>,
}

impl Default for GradientConfig {
    fn default() -> Self {
        GradientConfig {
            method: GradientMethod::Iterative,
            compute_gradients: true,
            parallel_threshold: 300,
            num_workers: None,
        }
    }
}

impl GradientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: GradientMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_gradients(mut self, compute_gradients: bool) -> Self {
        self.compute_gradients = compute_gradients;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_num_workers(mut self, workers: Option<usize>) -> Self {
        self.num_workers = workers;
        self
    }
}

/// Expectation value of one sample, with its gradient if requested
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GradientResult {
    pub expectation_value: f64,

    /// ∂E/∂p for each parameter in the engine's canonical order
    pub gradient: Option<Vec<f64>>,
}

/// Results of a batch, in input order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub results: Vec<GradientResult>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn expectation_values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.expectation_value).collect()
    }

    pub fn gradients(&self) -> Vec<Option<Vec<f64>>> {
        self.results.iter().map(|r| r.gradient.clone()).collect()
    }

    /// Split into the parallel lists of expectation values and gradients
    pub fn into_parts(self) -> (Vec<f64>, Vec<Option<Vec<f64>>>) {
        self.results
            .into_iter()
            .map(|r| (r.expectation_value, r.gradient))
            .unzip()
    }
}

/// Gradient engine for ⟨ψ₀|U(θ)† O U(θ)|ψ₀⟩
#[derive(Clone, Debug)]
pub struct StateGradient {
    observable: Observable,
    ansatz: QuantumCircuit,
    initial_state: StateVector,
    parameters: Vec<Parameter>,
    blocks: Vec<UnitaryBlock>,
    parameter_lists: Vec<Vec<Parameter>>,
    templates: Vec<Vec<DerivativeTerm>>,
    config: GradientConfig,
}

impl StateGradient {
    /// Differentiate with respect to every free parameter of `ansatz`
    pub fn new(observable: Observable, ansatz: QuantumCircuit) -> Result<Self> {
        Self::build(observable, ansatz, None)
    }

    /// Differentiate with respect to `targets` only
    ///
    /// Other free parameters still need values at evaluation time but get no
    /// gradient entry.
    pub fn for_parameters(
        observable: Observable,
        ansatz: QuantumCircuit,
        targets: &[Parameter],
    ) -> Result<Self> {
        let present = ansatz.parameters();
        if let Some(missing) = targets.iter().find(|t| !present.contains(t)) {
            return Err(GradientError::ParameterNotFound {
                parameter: missing.name().to_string(),
            });
        }
        Self::build(observable, ansatz, Some(targets))
    }

    /// Differentiate with respect to the angle of every rotation gate
    ///
    /// Bound rotations are differentiated too, so a fully bound ansatz still
    /// has a gradient. The entries follow the rotations in circuit order and
    /// [`parameters`](Self::parameters) names them by gate position, such as
    /// `"Ry[4]"`. A symbolic angle is differentiated as an angle, without
    /// its chain factor, and still needs a value at evaluation time.
    pub fn for_gates(observable: Observable, ansatz: QuantumCircuit) -> Result<Self> {
        let (keyed, parameter_lists) = split_gates(&ansatz);
        let templates = keyed
            .iter()
            .map(|(block, index)| gate_gradient(block, *index))
            .collect::<Result<Vec<_>>>()?;
        let blocks = keyed.into_iter().map(|(block, _)| block).collect();
        let parameters = parameter_lists.iter().flatten().cloned().collect();

        Self::assemble(observable, ansatz, parameters, blocks, parameter_lists, templates)
    }

    fn build(
        observable: Observable,
        ansatz: QuantumCircuit,
        targets: Option<&[Parameter]>,
    ) -> Result<Self> {
        let parameters: Vec<Parameter> = ansatz
            .parameters()
            .into_iter()
            .filter(|p| targets.map_or(true, |targets| targets.contains(p)))
            .collect();

        let (blocks, parameter_lists) = split(&ansatz, targets);
        let templates = blocks
            .iter()
            .map(|block| analytic_gradient(block, block.driving_parameter()))
            .collect::<Result<Vec<_>>>()?;

        Self::assemble(observable, ansatz, parameters, blocks, parameter_lists, templates)
    }

    fn assemble(
        observable: Observable,
        ansatz: QuantumCircuit,
        parameters: Vec<Parameter>,
        blocks: Vec<UnitaryBlock>,
        parameter_lists: Vec<Vec<Parameter>>,
        templates: Vec<Vec<DerivativeTerm>>,
    ) -> Result<Self> {
        if observable.qubit_count() != ansatz.qubit_count() {
            return Err(GradientError::QubitCountMismatch {
                expected: observable.qubit_count(),
                actual: ansatz.qubit_count(),
            });
        }
        let initial_state = StateVector::zero_state(ansatz.qubit_count())?;

        debug!(
            qubits = ansatz.qubit_count(),
            gates = ansatz.gate_count(),
            blocks = blocks.len(),
            parameters = parameters.len(),
            "built gradient engine"
        );

        Ok(StateGradient {
            observable,
            ansatz,
            initial_state,
            parameters,
            blocks,
            parameter_lists,
            templates,
            config: GradientConfig::default(),
        })
    }

    /// Start from `state` instead of |0…0⟩
    pub fn with_initial_state(mut self, state: StateVector) -> Result<Self> {
        if state.qubit_count() != self.ansatz.qubit_count() {
            return Err(GradientError::QubitCountMismatch {
                expected: self.ansatz.qubit_count(),
                actual: state.qubit_count(),
            });
        }
        self.initial_state = state;
        Ok(self)
    }

    pub fn with_config(mut self, config: GradientConfig) -> Self {
        self.config = config;
        self
    }

    /// Differentiated parameters in canonical order
    ///
    /// For an engine from [`for_gates`](Self::for_gates) these are the
    /// per-gate keys.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Every free parameter of the ansatz, in first-appearance order
    ///
    /// This is the column order of [`evaluate_rows`](Self::evaluate_rows).
    pub fn circuit_parameters(&self) -> Vec<Parameter> {
        self.ansatz.parameters()
    }

    pub fn blocks(&self) -> &[UnitaryBlock] {
        &self.blocks
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    pub fn ansatz(&self) -> &QuantumCircuit {
        &self.ansatz
    }

    pub fn initial_state(&self) -> &StateVector {
        &self.initial_state
    }

    /// Evaluate one sample as configured
    pub fn evaluate(&self, binding: &ParameterBinding) -> Result<GradientResult> {
        if !self.config.compute_gradients {
            return Ok(GradientResult {
                expectation_value: self.expectation_value(binding)?,
                gradient: None,
            });
        }
        self.run(binding, self.config.method)
    }

    /// Gradient through the linear-time reverse sweep
    pub fn iterative_gradients(&self, binding: &ParameterBinding) -> Result<GradientResult> {
        self.run(binding, GradientMethod::Iterative)
    }

    /// Gradient by simulating every derivative circuit from scratch
    pub fn reference_gradients(&self, binding: &ParameterBinding) -> Result<GradientResult> {
        self.run(binding, GradientMethod::Reference)
    }

    /// U(θ)|ψ₀⟩ for one sample
    pub fn prepared_state(&self, binding: &ParameterBinding) -> Result<StateVector> {
        let circuit = self.ansatz.bind(binding)?;
        self.initial_state.evolve(&circuit)
    }

    pub fn expectation_value(&self, binding: &ParameterBinding) -> Result<f64> {
        self.observable.expectation_value(&self.prepared_state(binding)?)
    }

    fn run(&self, binding: &ParameterBinding, method: GradientMethod) -> Result<GradientResult> {
        let circuit = self.ansatz.bind(binding)?;
        let blocks = self
            .blocks
            .iter()
            .map(|block| block.bind(binding))
            .collect::<Result<Vec<_>>>()?;
        let terms = self
            .templates
            .iter()
            .map(|block_terms| {
                block_terms
                    .iter()
                    .map(|term| term.bind(binding))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let (expectation_value, derivatives) = match method {
            GradientMethod::Iterative => iterative::block_gradients(
                &self.observable,
                &self.initial_state,
                &circuit,
                &blocks,
                &terms,
            )?,
            GradientMethod::Reference => reference::block_gradients(
                &self.observable,
                &self.initial_state,
                &circuit,
                &blocks,
                &terms,
            )?,
        };

        let (values, order) = accumulate(&derivatives, &self.parameter_lists)?;
        Ok(GradientResult {
            expectation_value,
            gradient: Some(reindex(&values, &order, &self.parameters)),
        })
    }

    /// Evaluate every binding, failing on the first sample that fails
    ///
    /// All samples run to completion; the reported error carries the index of
    /// the earliest failing one.
    pub fn evaluate_batch(&self, bindings: &[ParameterBinding]) -> Result<BatchResult> {
        let results = self
            .evaluate_batch_isolated(bindings)?
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.map_err(|source| GradientError::BatchFailed {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BatchResult { results })
    }

    /// Evaluate every binding, keeping each sample's own result
    pub fn evaluate_batch_isolated(
        &self,
        bindings: &[ParameterBinding],
    ) -> Result<Vec<Result<GradientResult>>> {
        debug!(samples = bindings.len(), method = ?self.config.method, "dispatching batch");
        dispatch(bindings, &self.config, |binding| self.evaluate(binding))
    }

    /// Evaluate one sample per row of `values`
    ///
    /// Columns follow [`circuit_parameters`](Self::circuit_parameters).
    pub fn evaluate_rows(&self, values: &Array2<f64>) -> Result<BatchResult> {
        let columns = self.circuit_parameters();
        if values.ncols() != columns.len() {
            return Err(GradientError::BatchShape {
                detail: format!(
                    "expected {} columns, one per circuit parameter, got {}",
                    columns.len(),
                    values.ncols()
                ),
            });
        }

        let bindings: Vec<ParameterBinding> = values
            .rows()
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row.iter().copied()).collect())
            .collect();
        self.evaluate_batch(&bindings)
    }

    /// Evaluate a sweep given as one column of values per parameter
    ///
    /// Every circuit parameter needs a column and all columns must have the
    /// same length; sample `i` takes the `i`-th entry of each column.
    pub fn evaluate_sweep(&self, sweep: &HashMap<Parameter, Vec<f64>>) -> Result<BatchResult> {
        let columns = self.circuit_parameters();

        let mut samples: Option<usize> = None;
        for parameter in &columns {
            let column = sweep.get(parameter).ok_or_else(|| GradientError::BatchShape {
                detail: format!("no values for parameter '{}'", parameter),
            })?;
            match samples {
                None => samples = Some(column.len()),
                Some(n) if n != column.len() => {
                    return Err(GradientError::BatchShape {
                        detail: format!(
                            "parameter '{}' has {} values, expected {}",
                            parameter,
                            column.len(),
                            n
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        let bindings: Vec<ParameterBinding> = (0..samples.unwrap_or(0))
            .map(|i| {
                columns
                    .iter()
                    .map(|p| (p.clone(), sweep[p][i]))
                    .collect()
            })
            .collect();
        self.evaluate_batch(&bindings)
    }
}
