//! VAR instruction semantics
//!
//! The variable-operand family: the call group, table stores, line
//! and character input, output routing, and the V5 table utilities.

use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::instruction::Instruction;
use crate::machine::Machine;
use log::warn;

fn arg(operands: &[u16], index: usize) -> u16 {
    operands.get(index).copied().unwrap_or(0)
}

fn require(operands: &[u16], count: usize, name: &str) -> Result<(), String> {
    if operands.len() < count {
        return Err(format!(
            "{name} expects {count} operands, {} provided",
            operands.len()
        ));
    }
    Ok(())
}

impl<M: Machine> ExecutionEngine<M> {
    pub(crate) fn execute_var(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, String> {
        let version = self.version();
        match inst.opcode {
            // call_vs (plain "call" through V3)
            0x00 => {
                require(operands, 1, "call_vs")?;
                self.do_call(operands[0], &operands[1..], inst.store_var)
            }

            // storew / storeb: table writes with a signed index
            0x01 => {
                require(operands, 3, "storew")?;
                let addr = (operands[0] as i32 + 2 * operands[1] as i16 as i32) as u32;
                self.machine.write_word(addr, operands[2])?;
                Ok(ExecutionResult::Continue)
            }
            0x02 => {
                require(operands, 3, "storeb")?;
                let addr = (operands[0] as i32 + operands[1] as i16 as i32) as u32;
                self.machine.write_byte(addr, operands[2] as u8)?;
                Ok(ExecutionResult::Continue)
            }

            0x03 => {
                require(operands, 3, "put_prop")?;
                if !self.object_is_nothing("put_prop", operands[0]) {
                    self.machine
                        .put_property(operands[0], operands[1], operands[2])?;
                }
                Ok(ExecutionResult::Continue)
            }

            // sread/aread: the only blocking opcode besides read_char.
            // Buffer filling and tokenisation are the parser
            // collaborator's job.
            0x04 => {
                require(operands, 1, "sread")?;
                if version <= 3 {
                    self.machine.show_status()?;
                }
                let terminator = self.machine.read_line(
                    operands[0],
                    arg(operands, 1),
                    arg(operands, 2),
                    arg(operands, 3),
                )?;
                if version >= 5 {
                    self.store_result(inst, terminator)?;
                }
                Ok(ExecutionResult::Continue)
            }

            0x05 => {
                require(operands, 1, "print_char")?;
                self.machine.print_char(operands[0])?;
                Ok(ExecutionResult::Continue)
            }
            0x06 => {
                require(operands, 1, "print_num")?;
                let text = (operands[0] as i16).to_string();
                self.machine.print(&text)?;
                Ok(ExecutionResult::Continue)
            }

            // random: positive draws, negative seeds predictably,
            // zero reseeds from entropy
            0x07 => {
                require(operands, 1, "random")?;
                let range = operands[0] as i16;
                let value = if range > 0 {
                    self.rng.next_in_range(range as u16)
                } else {
                    if range < 0 {
                        self.rng.seed(-(range as i32) as u64);
                    } else {
                        self.rng.reseed();
                    }
                    0
                };
                self.store_result(inst, value)?;
                Ok(ExecutionResult::Continue)
            }

            0x08 => {
                require(operands, 1, "push")?;
                self.callstack.push(operands[0])?;
                Ok(ExecutionResult::Continue)
            }

            // pull: indirect write through V5 (variable 0 replaced in
            // place, never double-popped); V6 pulls from a user stack
            // and stores
            0x09 => {
                if version >= 6 {
                    let value = match operands.first() {
                        Some(&stack_addr) => self.pop_user_stack(stack_addr)?,
                        None => self.callstack.pop()?,
                    };
                    self.store_result(inst, value)?;
                } else {
                    require(operands, 1, "pull")?;
                    let value = self.callstack.pop()?;
                    self.set_variable_in_place(operands[0] as u8, value)?;
                }
                Ok(ExecutionResult::Continue)
            }

            // screen hooks
            0x0A => {
                self.machine.split_window(arg(operands, 0))?;
                Ok(ExecutionResult::Continue)
            }
            0x0B => {
                self.machine.set_window(arg(operands, 0))?;
                Ok(ExecutionResult::Continue)
            }

            // call_vs2: up to seven arguments
            0x0C => {
                require(operands, 1, "call_vs2")?;
                self.do_call(operands[0], &operands[1..], inst.store_var)
            }

            0x0D => {
                self.machine.erase_window(arg(operands, 0) as i16)?;
                Ok(ExecutionResult::Continue)
            }
            0x0E => {
                self.machine.erase_line(arg(operands, 0))?;
                Ok(ExecutionResult::Continue)
            }
            0x0F => {
                require(operands, 2, "set_cursor")?;
                self.machine
                    .set_cursor(operands[0], operands[1], arg(operands, 2))?;
                Ok(ExecutionResult::Continue)
            }
            0x10 => {
                require(operands, 1, "get_cursor")?;
                let (line, column) = self.machine.get_cursor()?;
                let table = operands[0] as u32;
                self.machine.write_word(table, line)?;
                self.machine.write_word(table + 2, column)?;
                Ok(ExecutionResult::Continue)
            }
            0x11 => {
                self.machine.set_text_style(arg(operands, 0))?;
                Ok(ExecutionResult::Continue)
            }
            0x12 => {
                self.machine.buffer_mode(arg(operands, 0))?;
                Ok(ExecutionResult::Continue)
            }

            0x13 => {
                require(operands, 1, "output_stream")?;
                let table = operands.get(1).copied();
                self.machine
                    .select_output_stream(operands[0] as i16, table)?;
                Ok(ExecutionResult::Continue)
            }
            0x14 => {
                require(operands, 1, "input_stream")?;
                self.machine.select_input_stream(operands[0])?;
                Ok(ExecutionResult::Continue)
            }
            0x15 => {
                require(operands, 1, "sound_effect")?;
                self.machine.sound_effect(
                    operands[0],
                    arg(operands, 1),
                    arg(operands, 2),
                    arg(operands, 3),
                )?;
                Ok(ExecutionResult::Continue)
            }

            // read_char: blocks like sread
            0x16 => {
                let ch = self
                    .machine
                    .read_char(arg(operands, 1), arg(operands, 2))?;
                self.store_result(inst, ch)?;
                Ok(ExecutionResult::Continue)
            }

            // scan_table: store the match address and branch if found
            0x17 => {
                require(operands, 3, "scan_table")?;
                let target = operands[0];
                let table = operands[1] as u32;
                let length = operands[2];
                let form = if operands.len() > 3 { operands[3] } else { 0x82 };
                let entry_size = (form & 0x7F) as u32;
                if entry_size == 0 {
                    return Err("scan_table with zero entry length".to_string());
                }
                let words = form & 0x80 != 0;

                let mut found_addr = 0u16;
                for i in 0..length as u32 {
                    let addr = table + i * entry_size;
                    let value = if words {
                        self.machine.read_word(addr)?
                    } else {
                        self.machine.read_byte(addr)? as u16
                    };
                    if value == target {
                        found_addr = addr as u16;
                        break;
                    }
                }
                self.store_result(inst, found_addr)?;
                self.branch_on_test(inst, found_addr != 0)
            }

            // not (V5+; the 1OP slot became call_1n)
            0x18 => {
                require(operands, 1, "not")?;
                self.store_result(inst, !operands[0])?;
                Ok(ExecutionResult::Continue)
            }

            // call_vn / call_vn2: never store
            0x19 => {
                require(operands, 1, "call_vn")?;
                self.do_call(operands[0], &operands[1..], None)
            }
            0x1A => {
                require(operands, 1, "call_vn2")?;
                self.do_call(operands[0], &operands[1..], None)
            }

            0x1B => {
                require(operands, 2, "tokenise")?;
                let skip_unknown = arg(operands, 3) != 0;
                self.machine.tokenise(
                    operands[0],
                    operands[1],
                    arg(operands, 2),
                    skip_unknown,
                )?;
                Ok(ExecutionResult::Continue)
            }
            0x1C => {
                require(operands, 4, "encode_text")?;
                self.machine.encode_text(
                    operands[0] as u32,
                    operands[1],
                    operands[2],
                    operands[3] as u32,
                )?;
                Ok(ExecutionResult::Continue)
            }

            // copy_table: second operand 0 zeroes; a negative size
            // forces a forward copy; a positive size is overlap-safe
            0x1D => {
                require(operands, 3, "copy_table")?;
                let first = operands[0] as u32;
                let second = operands[1] as u32;
                let size = operands[2] as i16;
                let count = size.unsigned_abs() as u32;

                if second == 0 {
                    for i in 0..count {
                        self.machine.write_byte(first + i, 0)?;
                    }
                } else if size < 0 || second <= first {
                    for i in 0..count {
                        let byte = self.machine.read_byte(first + i)?;
                        self.machine.write_byte(second + i, byte)?;
                    }
                } else {
                    for i in (0..count).rev() {
                        let byte = self.machine.read_byte(first + i)?;
                        self.machine.write_byte(second + i, byte)?;
                    }
                }
                Ok(ExecutionResult::Continue)
            }

            // print_table: rows of ZSCII bytes
            0x1E => {
                require(operands, 2, "print_table")?;
                let text = operands[0] as u32;
                let width = operands[1] as u32;
                let height = if operands.len() > 2 { operands[2] } else { 1 } as u32;
                let skip = arg(operands, 3) as u32;
                for row in 0..height {
                    if row > 0 {
                        self.machine.new_line()?;
                    }
                    let base = text + row * (width + skip);
                    for column in 0..width {
                        let byte = self.machine.read_byte(base + column)?;
                        self.machine.print_char(byte as u16)?;
                    }
                }
                Ok(ExecutionResult::Continue)
            }

            // check_arg_count: did the caller supply argument n?
            0x1F => {
                require(operands, 1, "check_arg_count")?;
                let supplied = self.callstack.current().map_or(0, |f| f.arg_count) as u16;
                self.branch_on_test(inst, operands[0] <= supplied)
            }

            _ => {
                warn!(
                    "unhandled VAR opcode {:#04x} treated as illegal",
                    inst.opcode
                );
                Err(format!(
                    "illegal instruction, type {:?} operand count {:?} opcode {}",
                    inst.form, inst.operand_count, inst.opcode
                ))
            }
        }
    }
}
