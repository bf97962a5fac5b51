//! EXT instruction semantics (V5+, escape byte 0xBE)
//!
//! Shifts, the store-flavored save family, undo, Unicode output, and
//! the V6 user stacks. The V6 picture and window opcodes decode (they
//! are named in the tables) but this host executes them as logged
//! capability gaps: store 0 where a store is expected, branch false
//! where a branch is expected.

use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::instruction::Instruction;
use crate::machine::Machine;
use log::warn;

fn arg(operands: &[u16], index: usize) -> u16 {
    operands.get(index).copied().unwrap_or(0)
}

impl<M: Machine> ExecutionEngine<M> {
    pub(crate) fn execute_ext(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, String> {
        match inst.opcode {
            // save / restore, store flavor
            0x00 => self.do_save(inst),
            0x01 => self.do_restore(inst),

            // log_shift: logical; the second operand's sign picks the
            // direction
            0x02 => {
                let value = arg(operands, 0);
                let places = arg(operands, 1) as i16;
                let result = shift_amount(places).map_or(0, |(left, n)| {
                    if left {
                        value.wrapping_shl(n)
                    } else {
                        value.wrapping_shr(n)
                    }
                });
                self.store_result(inst, result)?;
                Ok(ExecutionResult::Continue)
            }

            // art_shift: arithmetic, sign-preserving on right shifts
            0x03 => {
                let value = arg(operands, 0) as i16;
                let places = arg(operands, 1) as i16;
                let result = match shift_amount(places) {
                    Some((true, n)) => value.wrapping_shl(n) as u16,
                    Some((false, n)) => (value >> n) as u16,
                    // Shifting everything out leaves only the sign
                    None if places < 0 => (value >> 15) as u16,
                    None => 0,
                };
                self.store_result(inst, result)?;
                Ok(ExecutionResult::Continue)
            }

            0x04 => {
                let previous = self.machine.set_font(arg(operands, 0))?;
                self.store_result(inst, previous)?;
                Ok(ExecutionResult::Continue)
            }

            // save_undo / restore_undo
            0x09 => self.do_save_undo(inst),
            0x0A => self.do_restore_undo(inst),

            // print_unicode / check_unicode
            0x0B => {
                if let Some(c) = char::from_u32(arg(operands, 0) as u32) {
                    let mut buf = [0u8; 4];
                    self.machine.print(c.encode_utf8(&mut buf))?;
                }
                Ok(ExecutionResult::Continue)
            }
            0x0C => {
                // Bit 0: can print, bit 1: can read
                let code = if char::from_u32(arg(operands, 0) as u32).is_some() {
                    3
                } else {
                    0
                };
                self.store_result(inst, code)?;
                Ok(ExecutionResult::Continue)
            }

            0x0D => {
                self.machine
                    .set_colour(arg(operands, 0), arg(operands, 1), arg(operands, 2))?;
                Ok(ExecutionResult::Continue)
            }

            // pop_stack: discard values from a user stack, or from
            // the main stack when no table is given
            0x15 => {
                let count = arg(operands, 0);
                match operands.get(1) {
                    Some(&stack_addr) => {
                        for _ in 0..count {
                            self.pop_user_stack(stack_addr)?;
                        }
                    }
                    None => {
                        for _ in 0..count {
                            self.callstack.pop()?;
                        }
                    }
                }
                Ok(ExecutionResult::Continue)
            }

            // push_stack: overflow reports through the branch, never
            // a fault
            0x18 => {
                let value = arg(operands, 0);
                let stack_addr = arg(operands, 1);
                let pushed = self.push_user_stack(stack_addr, value)?;
                self.branch_on_test(inst, pushed)
            }

            // V6 picture/window opcodes: decodable, not executable on
            // this host
            0x05 | 0x06 | 0x07 | 0x08 | 0x10 | 0x11 | 0x12 | 0x13 | 0x14 | 0x16 | 0x17 | 0x19
            | 0x1A | 0x1B | 0x1C => {
                warn!(
                    "@{} is not supported by this host; continuing",
                    inst.name(self.version())
                );
                self.store_result(inst, 0)?;
                if inst.branch.is_some() {
                    return self.branch_on_test(inst, false);
                }
                Ok(ExecutionResult::Continue)
            }

            _ => Err(format!(
                "illegal instruction, type {:?} operand count {:?} opcode {}",
                inst.form, inst.operand_count, inst.opcode
            )),
        }
    }
}

/// Normalize a shift count: direction plus magnitude, or None when
/// the magnitude empties a 16-bit value
fn shift_amount(places: i16) -> Option<(bool, u32)> {
    let left = places >= 0;
    let magnitude = places.unsigned_abs() as u32;
    if magnitude >= 16 {
        None
    } else {
        Some((left, magnitude))
    }
}
