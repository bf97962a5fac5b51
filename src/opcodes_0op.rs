//! 0OP instruction semantics
//!
//! Short-form instructions with no operands: returns, inline prints,
//! the save family, and interpreter control.

use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::instruction::Instruction;
use crate::machine::Machine;

impl<M: Machine> ExecutionEngine<M> {
    pub(crate) fn execute_0op(&mut self, inst: &Instruction) -> Result<ExecutionResult, String> {
        match inst.opcode {
            // rtrue / rfalse
            0x00 => self.do_return(1),
            0x01 => self.do_return(0),

            // print: inline encoded text follows the opcode
            0x02 => {
                let addr = inst
                    .text_addr
                    .ok_or_else(|| "print is missing inline text".to_string())?;
                let text = self.machine.decode_string(addr)?;
                self.machine.print(&text)?;
                Ok(ExecutionResult::Continue)
            }

            // print_ret: print, newline, return true
            0x03 => {
                let addr = inst
                    .text_addr
                    .ok_or_else(|| "print_ret is missing inline text".to_string())?;
                let text = self.machine.decode_string(addr)?;
                self.machine.print(&text)?;
                self.machine.new_line()?;
                self.do_return(1)
            }

            0x04 => Ok(ExecutionResult::Continue), // nop

            // save / restore: branch through V3, store in V4, EXT in V5+
            0x05 => self.do_save(inst),
            0x06 => self.do_restore(inst),

            0x07 => self.do_restart(),

            // ret_popped
            0x08 => {
                let value = self.callstack.pop()?;
                self.do_return(value)
            }

            // pop through V4; catch (current frame number) in V5+
            0x09 => {
                if self.version() <= 4 {
                    self.callstack.pop()?;
                } else {
                    let depth = self.callstack.depth() as u16;
                    self.store_result(inst, depth)?;
                }
                Ok(ExecutionResult::Continue)
            }

            0x0A => Ok(ExecutionResult::Quit),

            0x0B => {
                self.machine.new_line()?;
                Ok(ExecutionResult::Continue)
            }

            // show_status (V3 only)
            0x0C => {
                self.machine.show_status()?;
                Ok(ExecutionResult::Continue)
            }

            // verify: checksum the story file
            0x0D => {
                let ok = self.machine.verify();
                self.branch_on_test(inst, ok)
            }

            // piracy: honest interpreters report the story genuine
            0x0F => self.branch_on_test(inst, true),

            _ => Err(format!(
                "illegal instruction, type {:?} operand count {:?} opcode {}",
                inst.form, inst.operand_count, inst.opcode
            )),
        }
    }
}
