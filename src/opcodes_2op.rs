//! 2OP instruction semantics
//!
//! Comparisons, signed 16-bit arithmetic, attribute and property
//! access, and indirect variable stores. In variable form a 2OP may
//! carry up to four operands (je) or fewer than two, so arity is
//! checked here rather than assumed.

use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::instruction::Instruction;
use crate::machine::Machine;

fn two(operands: &[u16], name: &str) -> Result<(u16, u16), String> {
    match operands {
        [a, b, ..] => Ok((*a, *b)),
        _ => Err(format!(
            "{name} expects two operands, {} provided",
            operands.len()
        )),
    }
}

impl<M: Machine> ExecutionEngine<M> {
    pub(crate) fn execute_2op(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, String> {
        match inst.opcode {
            // je: equal to any of the remaining operands; fewer than
            // two operands is broken bytecode and halts
            0x01 => {
                if operands.len() < 2 {
                    let detail = if operands.len() == 1 { "only one" } else { "none" };
                    return Err(format!(
                        "je expects at least two operands, {detail} provided"
                    ));
                }
                let condition = operands[1..].iter().any(|&v| v == operands[0]);
                self.branch_on_test(inst, condition)
            }

            // jl / jg: signed comparison
            0x02 => {
                let (a, b) = two(operands, "jl")?;
                self.branch_on_test(inst, (a as i16) < (b as i16))
            }
            0x03 => {
                let (a, b) = two(operands, "jg")?;
                self.branch_on_test(inst, (a as i16) > (b as i16))
            }

            // dec_chk / inc_chk: indirect variable update, then signed
            // comparison
            0x04 => {
                let (var, limit) = two(operands, "dec_chk")?;
                let value = (self.variable_value_in_place(var as u8)? as i16).wrapping_sub(1);
                self.set_variable_in_place(var as u8, value as u16)?;
                self.branch_on_test(inst, value < limit as i16)
            }
            0x05 => {
                let (var, limit) = two(operands, "inc_chk")?;
                let value = (self.variable_value_in_place(var as u8)? as i16).wrapping_add(1);
                self.set_variable_in_place(var as u8, value as u16)?;
                self.branch_on_test(inst, value > limit as i16)
            }

            // jin: direct parent test
            0x06 => {
                let (obj, parent) = two(operands, "jin")?;
                let actual = if self.object_is_nothing("jin", obj) {
                    0
                } else {
                    self.machine.get_parent(obj)?
                };
                self.branch_on_test(inst, actual == parent)
            }

            // test: all bits of the mask set
            0x07 => {
                let (bitmap, mask) = two(operands, "test")?;
                self.branch_on_test(inst, bitmap & mask == mask)
            }

            0x08 => {
                let (a, b) = two(operands, "or")?;
                self.store_result(inst, a | b)?;
                Ok(ExecutionResult::Continue)
            }
            0x09 => {
                let (a, b) = two(operands, "and")?;
                self.store_result(inst, a & b)?;
                Ok(ExecutionResult::Continue)
            }

            // test_attr / set_attr / clear_attr
            0x0A => {
                let (obj, attr) = two(operands, "test_attr")?;
                let set = if self.object_is_nothing("test_attr", obj) {
                    false
                } else {
                    self.machine.test_attribute(obj, attr)?
                };
                self.branch_on_test(inst, set)
            }
            0x0B => {
                let (obj, attr) = two(operands, "set_attr")?;
                if !self.object_is_nothing("set_attr", obj) {
                    self.machine.set_attribute(obj, attr)?;
                }
                Ok(ExecutionResult::Continue)
            }
            0x0C => {
                let (obj, attr) = two(operands, "clear_attr")?;
                if !self.object_is_nothing("clear_attr", obj) {
                    self.machine.clear_attribute(obj, attr)?;
                }
                Ok(ExecutionResult::Continue)
            }

            // store: indirect write, variable 0 replaced in place
            0x0D => {
                let (var, value) = two(operands, "store")?;
                self.set_variable_in_place(var as u8, value)?;
                Ok(ExecutionResult::Continue)
            }

            0x0E => {
                let (obj, dest) = two(operands, "insert_obj")?;
                if !self.object_is_nothing("insert_obj", obj)
                    && !self.object_is_nothing("insert_obj", dest)
                {
                    self.machine.insert_object(obj, dest)?;
                }
                Ok(ExecutionResult::Continue)
            }

            // loadw / loadb: table access with a signed index
            0x0F => {
                let (table, index) = two(operands, "loadw")?;
                let addr = (table as i32 + 2 * index as i16 as i32) as u32;
                let value = self.machine.read_word(addr)?;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }
            0x10 => {
                let (table, index) = two(operands, "loadb")?;
                let addr = (table as i32 + index as i16 as i32) as u32;
                let value = self.machine.read_byte(addr)? as u16;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }

            // property access
            0x11 => {
                let (obj, prop) = two(operands, "get_prop")?;
                let value = if self.object_is_nothing("get_prop", obj) {
                    0
                } else {
                    self.machine.get_property(obj, prop)?
                };
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }
            0x12 => {
                let (obj, prop) = two(operands, "get_prop_addr")?;
                let addr = if self.object_is_nothing("get_prop_addr", obj) {
                    0
                } else {
                    self.machine.get_property_address(obj, prop)?
                };
                self.store_result(inst, addr)?;
                Ok(ExecutionResult::Continue)
            }
            0x13 => {
                let (obj, prop) = two(operands, "get_next_prop")?;
                let next = if self.object_is_nothing("get_next_prop", obj) {
                    0
                } else {
                    self.machine.get_next_property(obj, prop)?
                };
                self.store_result(inst, next)?;
                Ok(ExecutionResult::Continue)
            }

            // signed arithmetic; division truncates toward zero and
            // dividing by zero halts
            0x14 => {
                let (a, b) = two(operands, "add")?;
                let value = (a as i16).wrapping_add(b as i16) as u16;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }
            0x15 => {
                let (a, b) = two(operands, "sub")?;
                let value = (a as i16).wrapping_sub(b as i16) as u16;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }
            0x16 => {
                let (a, b) = two(operands, "mul")?;
                let value = (a as i16).wrapping_mul(b as i16) as u16;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }
            0x17 => {
                let (a, b) = two(operands, "div")?;
                if b == 0 {
                    return Err("@div division by zero".to_string());
                }
                let value = (a as i16).wrapping_div(b as i16) as u16;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }
            0x18 => {
                let (a, b) = two(operands, "mod")?;
                if b == 0 {
                    return Err("@mod division by zero".to_string());
                }
                let value = (a as i16).wrapping_rem(b as i16) as u16;
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }

            // call_2s / call_2n
            0x19 => {
                let (routine, arg) = two(operands, "call_2s")?;
                self.do_call(routine, &[arg], inst.store_var)
            }
            0x1A => {
                let (routine, arg) = two(operands, "call_2n")?;
                self.do_call(routine, &[arg], None)
            }

            0x1B => {
                let (fg, bg) = two(operands, "set_colour")?;
                let window = operands.get(2).copied().unwrap_or(0);
                self.machine.set_colour(fg, bg, window)?;
                Ok(ExecutionResult::Continue)
            }

            // throw: non-local return to a frame captured by catch
            0x1C => {
                let (value, frame) = two(operands, "throw")?;
                self.do_throw(value, frame)
            }

            _ => Err(format!(
                "illegal instruction, type {:?} operand count {:?} opcode {}",
                inst.form, inst.operand_count, inst.opcode
            )),
        }
    }
}
