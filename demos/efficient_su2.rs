use qgrad::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

// ===========================================
// CONFIGURABLE PARAMETERS
// ===========================================

struct AnsatzParams {
    qubit_count: usize, // Number of qubits in the circuit
    reps: usize,        // Number of entangling repetitions
}

/// EfficientSU2-style ansatz: Ry/Rz layers separated by a linear CNOT chain
fn efficient_su2(params: &AnsatzParams) -> Result<(QuantumCircuit, Vec<Parameter>)> {
    let n = params.qubit_count;
    let theta = Parameter::vector("θ", 2 * n * (params.reps + 1));
    let mut remaining = theta.iter();
    let mut builder = CircuitBuilder::new(n);

    for rep in 0..=params.reps {
        for q in 0..n {
            if let Some(p) = remaining.next() {
                builder.ry(q, p)?;
            }
        }
        for q in 0..n {
            if let Some(p) = remaining.next() {
                builder.rz(q, p)?;
            }
        }
        if rep < params.reps {
            for q in 0..n.saturating_sub(1) {
                builder.cnot(q, q + 1)?;
            }
        }
    }

    Ok((builder.build(), theta))
}

fn main() -> Result<()> {
    println!("======= ITERATIVE VS REFERENCE GRADIENTS =======");

    let ansatz_params = AnsatzParams { qubit_count: 2, reps: 3 };
    let (circuit, theta) = efficient_su2(&ansatz_params)?;
    println!(
        "Ansatz: {} qubits, {} gates, {} parameters",
        circuit.qubit_count(),
        circuit.gate_count(),
        theta.len()
    );

    let engine = StateGradient::new(Observable::from_label("HH")?, circuit)?
        .with_initial_state(StateVector::from_label("00")?)?;

    let mut rng = StdRng::seed_from_u64(42);
    let binding = ParameterBinding::random(&theta, &mut rng);

    let start = Instant::now();
    let iterative = engine.iterative_gradients(&binding)?;
    let iterative_time = start.elapsed();

    let start = Instant::now();
    let reference = engine.reference_gradients(&binding)?;
    let reference_time = start.elapsed();

    println!("\nPrepared state:");
    print!("{}", engine.prepared_state(&binding)?);

    println!("\nExpectation value:");
    println!("  iterative: {:.12}", iterative.expectation_value);
    println!("  reference: {:.12}", reference.expectation_value);

    println!("\n{:<8} {:>16} {:>16} {:>12}", "param", "iterative", "reference", "|diff|");
    let pairs = iterative
        .gradient
        .iter()
        .flatten()
        .zip(reference.gradient.iter().flatten());
    let mut max_diff: f64 = 0.0;
    for (p, (a, b)) in engine.parameters().iter().zip(pairs) {
        let diff = (a - b).abs();
        max_diff = max_diff.max(diff);
        println!("{:<8} {:>16.10} {:>16.10} {:>12.2e}", p.name(), a, b, diff);
    }

    println!("\nMax difference: {:.2e}", max_diff);
    println!("Iterative engine: {:?}", iterative_time);
    println!("Reference engine: {:?}", reference_time);

    // Same ansatz with its angles bound, differentiated gate by gate
    let bound = engine.ansatz().bind(&binding)?;
    let by_gate = StateGradient::for_gates(Observable::from_label("HH")?, bound)?
        .with_initial_state(engine.initial_state().clone())?;
    let per_gate = by_gate.evaluate(&ParameterBinding::new())?;
    let agree = per_gate
        .gradient
        .iter()
        .flatten()
        .zip(iterative.gradient.iter().flatten())
        .all(|(a, b)| (a - b).abs() < 1e-9);
    println!("Per-gate gradient of the bound circuit matches: {}", agree);

    // Batched evaluation through the shared dispatcher
    let bindings: Vec<ParameterBinding> = (0..8)
        .map(|_| ParameterBinding::random(&theta, &mut rng))
        .collect();
    let batch = engine.evaluate_batch(&bindings)?;
    println!("\nBatch of {} samples:", batch.len());
    for (i, value) in batch.expectation_values().iter().enumerate() {
        println!("  sample {}: E = {:+.6}", i, value);
    }

    Ok(())
}
