//! 1OP instruction semantics
//!
//! Single-operand instructions: object navigation, indirect variable
//! access, unconditional jumps, and the single-argument call family.

use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::instruction::Instruction;
use crate::machine::Machine;

fn one(operands: &[u16], name: &str) -> Result<u16, String> {
    operands
        .first()
        .copied()
        .ok_or_else(|| format!("{name} expects one operand, none provided"))
}

impl<M: Machine> ExecutionEngine<M> {
    pub(crate) fn execute_1op(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, String> {
        let version = self.version();
        let op = one(operands, inst.name(version))?;
        match inst.opcode {
            // jz
            0x00 => self.branch_on_test(inst, op == 0),

            // get_sibling / get_child: store the relative, branch if
            // it exists
            0x01 => {
                let sibling = if self.object_is_nothing("get_sibling", op) {
                    0
                } else {
                    self.machine.get_sibling(op)?
                };
                self.store_result(inst, sibling)?;
                self.branch_on_test(inst, sibling != 0)
            }
            0x02 => {
                let child = if self.object_is_nothing("get_child", op) {
                    0
                } else {
                    self.machine.get_child(op)?
                };
                self.store_result(inst, child)?;
                self.branch_on_test(inst, child != 0)
            }
            0x03 => {
                let parent = if self.object_is_nothing("get_parent", op) {
                    0
                } else {
                    self.machine.get_parent(op)?
                };
                self.store_result(inst, parent)?;
                Ok(ExecutionResult::Continue)
            }

            // get_prop_len: property address 0 has length 0
            0x04 => {
                let len = if op == 0 {
                    0
                } else {
                    self.machine.get_property_length(op)?
                };
                self.store_result(inst, len)?;
                Ok(ExecutionResult::Continue)
            }

            // inc / dec: the operand names a variable; variable 0 is
            // updated in place on the stack
            0x05 => {
                let var = op as u8;
                let value = (self.variable_value_in_place(var)? as i16).wrapping_add(1);
                self.set_variable_in_place(var, value as u16)?;
                Ok(ExecutionResult::Continue)
            }
            0x06 => {
                let var = op as u8;
                let value = (self.variable_value_in_place(var)? as i16).wrapping_sub(1);
                self.set_variable_in_place(var, value as u16)?;
                Ok(ExecutionResult::Continue)
            }

            // print_addr: byte address, unpacked
            0x07 => {
                let text = self.machine.decode_string(op as u32)?;
                self.machine.print(&text)?;
                Ok(ExecutionResult::Continue)
            }

            // call_1s (V4+)
            0x08 => self.do_call(op, &[], inst.store_var),

            0x09 => {
                if !self.object_is_nothing("remove_obj", op) {
                    self.machine.remove_object(op)?;
                }
                Ok(ExecutionResult::Continue)
            }

            0x0A => {
                if !self.object_is_nothing("print_obj", op) {
                    let name = self.machine.object_name(op)?;
                    self.machine.print(&name)?;
                }
                Ok(ExecutionResult::Continue)
            }

            // ret
            0x0B => self.do_return(op),

            // jump: unconditional, signed offset, no branch byte
            0x0C => {
                self.pc = (self.pc as i32 + op as i16 as i32 - 2) as u32;
                Ok(ExecutionResult::Branched)
            }

            // print_paddr: packed string address
            0x0D => {
                let addr = self.machine.unpack_string_address(op);
                let text = self.machine.decode_string(addr)?;
                self.machine.print(&text)?;
                Ok(ExecutionResult::Continue)
            }

            // load: indirect variable read; variable 0 peeks without
            // popping
            0x0E => {
                let value = self.variable_value_in_place(op as u8)?;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }

            // not through V4; call_1n (no store) in V5+
            0x0F => {
                if version <= 4 {
                    self.store_result(inst, !op)?;
                    Ok(ExecutionResult::Continue)
                } else {
                    self.do_call(op, &[], None)
                }
            }

            _ => Err(format!(
                "illegal instruction, type {:?} operand count {:?} opcode {}",
                inst.form, inst.operand_count, inst.opcode
            )),
        }
    }
}
