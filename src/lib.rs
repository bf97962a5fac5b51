//! A Z-machine instruction decode-and-execute engine
//!
//! The crate decodes story-file bytecode into [`instruction::Instruction`]
//! values and executes them through [`engine::ExecutionEngine`], which
//! reaches everything outside the core (object tree, text, screen,
//! persistence) through the [`machine::Machine`] trait. Versions 1
//! through 8 of the Standard are covered by one decoder and one set of
//! version-gated opcode tables.

#[macro_use]
extern crate lazy_static;

pub mod callstack;
pub mod engine;
pub mod header;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod opcode_tables;
pub mod operand;
pub mod snapshot;
pub mod zrand;

mod opcodes_0op;
mod opcodes_1op;
mod opcodes_2op;
mod opcodes_ext;
mod opcodes_var;

#[cfg(test)]
mod test_machine;
