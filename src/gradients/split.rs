// src/gradients/split.rs
//! Splitting a circuit into unitary blocks, one per differentiated gate

use crate::error::Result;
use crate::quantum::circuit::{
    bind_instructions, instruction_parameters, inverse_instructions, Instruction, QuantumCircuit,
};
use crate::quantum::gate::Gate;
use crate::quantum::parameter::{Parameter, ParameterBinding};

/// An ordered run of instructions and the parameters it is differentiated by
///
/// The first entry of `parameters` is the block's driving parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitaryBlock {
    instructions: Vec<Instruction>,
    parameters: Vec<Parameter>,
}

impl UnitaryBlock {
    pub fn new(instructions: Vec<Instruction>, parameters: Vec<Parameter>) -> Self {
        UnitaryBlock { instructions, parameters }
    }

    /// A block whose parameter list is every free parameter of its instructions
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        let parameters = instruction_parameters(&instructions);
        UnitaryBlock { instructions, parameters }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn driving_parameter(&self) -> Option<&Parameter> {
        self.parameters.first()
    }

    /// Free parameters still present in the instructions
    pub fn free_parameters(&self) -> Vec<Parameter> {
        instruction_parameters(&self.instructions)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Bind every gate, keeping the parameter list as metadata
    pub fn bind(&self, binding: &ParameterBinding) -> Result<UnitaryBlock> {
        Ok(UnitaryBlock {
            instructions: bind_instructions(&self.instructions, binding)?,
            parameters: self.parameters.clone(),
        })
    }

    /// U† for the block's unitary U
    pub fn inverse(&self) -> UnitaryBlock {
        UnitaryBlock {
            instructions: inverse_instructions(&self.instructions),
            parameters: self.parameters.clone(),
        }
    }
}

/// Partition `circuit` into blocks that each end on a target gate
///
/// With `targets = None` every gate carrying a free parameter is a target.
/// Gates after the last target gate join the last block, so the blocks
/// concatenate back to the circuit. A circuit without target gates yields
/// no blocks.
pub fn split(
    circuit: &QuantumCircuit,
    targets: Option<&[Parameter]>,
) -> (Vec<UnitaryBlock>, Vec<Vec<Parameter>>) {
    let is_target = |p: &Parameter| targets.map_or(true, |targets| targets.contains(p));

    let mut blocks: Vec<UnitaryBlock> = Vec::new();
    let mut parameter_lists = Vec::new();
    let mut current = Vec::new();

    for instruction in circuit.instructions() {
        current.push(instruction.clone());

        if let Some(parameter) = instruction.gate.parameter().filter(|p| is_target(*p)) {
            blocks.push(UnitaryBlock::new(
                std::mem::take(&mut current),
                vec![parameter.clone()],
            ));
            parameter_lists.push(vec![parameter.clone()]);
        }
    }

    if let Some(last) = blocks.last_mut() {
        last.instructions.extend(current);
    }

    (blocks, parameter_lists)
}

/// Partition `circuit` into blocks that each end on a rotation gate
///
/// Every rotation is a target, whether its angle is bound or symbolic. Each
/// block is keyed by a fresh parameter named after the rotation's position in
/// the circuit (`"Ry[4]"`), and is returned with the index of that rotation
/// inside the block. Trailing gates join the last block as in [`split`].
pub fn split_gates(circuit: &QuantumCircuit) -> (Vec<(UnitaryBlock, usize)>, Vec<Vec<Parameter>>) {
    let mut blocks: Vec<(UnitaryBlock, usize)> = Vec::new();
    let mut parameter_lists = Vec::new();
    let mut current = Vec::new();

    for (position, instruction) in circuit.instructions().iter().enumerate() {
        current.push(instruction.clone());

        if let Gate::Parametrized(gate) = &instruction.gate {
            let key = Parameter::new(&format!("{}[{}]", gate.label(), position));
            let index = current.len() - 1;
            blocks.push((
                UnitaryBlock::new(std::mem::take(&mut current), vec![key.clone()]),
                index,
            ));
            parameter_lists.push(vec![key]);
        }
    }

    if let Some((last, _)) = blocks.last_mut() {
        last.instructions.extend(current);
    }

    (blocks, parameter_lists)
}
