use crate::memory::Memory;
use crate::opcode_tables;
use crate::operand::{Operand, OperandType};
use std::fmt::Write;

/// Instruction forms, selected by the top bits of the opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionForm {
    Long,
    Short,
    Extended,
    Variable,
}

/// Operand-count families; opcode numbers are scoped within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandCount {
    /// 0 operands
    OP0,
    /// 1 operand
    OP1,
    /// 2 operands (long form may still carry je's extra operands in
    /// variable form)
    OP2,
    /// Variable number of operands (0-8)
    VAR,
    /// Extended opcodes (V5+, escape byte 0xBE)
    EXT,
}

/// Branch information
///
/// An offset of 0 or 1 is not a jump target: it returns false/true
/// from the current routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchInfo {
    /// True if the branch is taken when the condition holds
    pub on_true: bool,
    /// Branch offset (0-1 = return false/true, otherwise relative)
    pub offset: i16,
}

/// A decoded Z-machine instruction
///
/// Built fresh by `decode` for every execute cycle and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Opcode number within its family; for Extended form this is the
    /// byte following the 0xBE escape
    pub opcode: u8,
    pub form: InstructionForm,
    pub operand_count: OperandCount,
    /// Decoded operands in encoding order (up to 8)
    pub operands: Vec<Operand>,
    /// Variable to store the result into, if the opcode stores
    pub store_var: Option<u8>,
    /// Branch descriptor, if the opcode branches
    pub branch: Option<BranchInfo>,
    /// Address of the inline encoded string for print/print_ret
    pub text_addr: Option<u32>,
    /// Address this instruction was decoded from
    pub address: u32,
    /// Total encoded length in bytes
    pub size: usize,
}

impl Instruction {
    /// Decode one instruction from memory
    ///
    /// Decoding never rejects an opcode that is invalid for the
    /// version; the engine reports that as an execution fault so the
    /// failure carries the full instruction context.
    pub fn decode(mem: &dyn Memory, addr: u32, version: u8) -> Result<Self, String> {
        let mut cursor = addr;
        let opcode_byte = mem.read_byte(cursor)?;
        cursor += 1;

        // The 0xBE escape outranks the top-bit classification; in V5+
        // it selects extended form even though its top bits read as
        // short form
        let form = if opcode_byte == 0xBE && version >= 5 {
            InstructionForm::Extended
        } else {
            match opcode_byte >> 6 {
                0b11 => InstructionForm::Variable,
                0b10 => InstructionForm::Short,
                _ => InstructionForm::Long,
            }
        };

        let (opcode, operand_count) = match form {
            InstructionForm::Long => (opcode_byte & 0x1F, OperandCount::OP2),
            InstructionForm::Short => {
                let count = if (opcode_byte >> 4) & 0x03 == 0x03 {
                    OperandCount::OP0
                } else {
                    OperandCount::OP1
                };
                (opcode_byte & 0x0F, count)
            }
            InstructionForm::Variable => {
                let count = if opcode_byte & 0x20 == 0 {
                    OperandCount::OP2
                } else {
                    OperandCount::VAR
                };
                (opcode_byte & 0x1F, count)
            }
            InstructionForm::Extended => {
                let ext = mem.read_byte(cursor)?;
                cursor += 1;
                (ext, OperandCount::EXT)
            }
        };

        // Operand types
        let mut operand_types = Vec::new();
        match form {
            InstructionForm::Long => {
                // Bits 6 and 5: 0 = small constant, 1 = variable.
                // Long form never encodes large constants or omissions.
                for bit in [0x40, 0x20] {
                    operand_types.push(if opcode_byte & bit != 0 {
                        OperandType::Variable
                    } else {
                        OperandType::SmallConstant
                    });
                }
            }
            InstructionForm::Short => {
                if operand_count == OperandCount::OP1 {
                    operand_types.push(OperandType::from_bits((opcode_byte >> 4) & 0x03));
                }
            }
            InstructionForm::Variable | InstructionForm::Extended => {
                let mut type_bytes = vec![mem.read_byte(cursor)?];
                cursor += 1;
                if operand_count == OperandCount::VAR
                    && opcode_tables::reads_second_type_byte(operand_count, opcode)
                {
                    type_bytes.push(mem.read_byte(cursor)?);
                    cursor += 1;
                }
                'types: for type_byte in type_bytes {
                    for i in 0..4 {
                        let op_type = OperandType::from_bits(type_byte >> (6 - i * 2));
                        if op_type == OperandType::Omitted {
                            break 'types;
                        }
                        operand_types.push(op_type);
                    }
                }
            }
        }

        // Operand values, in encoding order
        let mut operands = Vec::new();
        for op_type in operand_types {
            match op_type {
                OperandType::LargeConstant => {
                    operands.push(Operand::large(mem.read_word(cursor)?));
                    cursor += 2;
                }
                OperandType::SmallConstant => {
                    operands.push(Operand::small(mem.read_byte(cursor)?));
                    cursor += 1;
                }
                OperandType::Variable => {
                    operands.push(Operand::variable(mem.read_byte(cursor)?));
                    cursor += 1;
                }
                OperandType::Omitted => unreachable!(),
            }
        }

        // Store variable, if the table says this opcode stores
        let store_var = if opcode_tables::stores_result(operand_count, opcode, version) {
            let var = mem.read_byte(cursor)?;
            cursor += 1;
            Some(var)
        } else {
            None
        };

        // Branch bytes: one byte with an unsigned 6-bit offset when
        // bit 6 is set, otherwise a signed 14-bit offset over two bytes
        let branch = if opcode_tables::has_branch(operand_count, opcode, version) {
            let first = mem.read_byte(cursor)?;
            cursor += 1;
            let on_true = first & 0x80 != 0;
            let offset = if first & 0x40 != 0 {
                (first & 0x3F) as i16
            } else {
                let second = mem.read_byte(cursor)?;
                cursor += 1;
                let raw = (((first & 0x3F) as i16) << 8) | second as i16;
                if raw & 0x2000 != 0 {
                    raw | 0xC000u16 as i16
                } else {
                    raw
                }
            };
            Some(BranchInfo { on_true, offset })
        } else {
            None
        };

        // Inline encoded text: the length is visible in the encoding
        // (the last word of a string has its top bit set), so the
        // decoder can skip it without decoding ZSCII
        let text_addr = if opcode_tables::has_text(operand_count, opcode, version) {
            let start = cursor;
            loop {
                let word = mem.read_word(cursor)?;
                cursor += 2;
                if word & 0x8000 != 0 {
                    break;
                }
            }
            Some(start)
        } else {
            None
        };

        Ok(Instruction {
            opcode,
            form,
            operand_count,
            operands,
            store_var,
            branch,
            text_addr,
            address: addr,
            size: (cursor - addr) as usize,
        })
    }

    /// Human-readable opcode name for the given version
    pub fn name(&self, version: u8) -> &'static str {
        opcode_tables::name(self.operand_count, self.opcode, version)
    }

    /// Format the instruction for trace output and the disassembler
    pub fn format_with_version(&self, version: u8) -> String {
        let mut result = String::from(self.name(version));

        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                result.push(' ');
            } else {
                result.push_str(", ");
            }
            match op.op_type {
                OperandType::Variable => write!(result, "V{:02x}", op.raw).unwrap(),
                _ => write!(result, "#{:04x}", op.raw).unwrap(),
            }
        }

        if let Some(var) = self.store_var {
            write!(result, " -> V{var:02x}").unwrap();
        }

        if let Some(ref branch) = self.branch {
            write!(
                result,
                " [{}{}]",
                if branch.on_true { "TRUE" } else { "FALSE" },
                match branch.offset {
                    0 => " RFALSE".to_string(),
                    1 => " RTRUE".to_string(),
                    n => format!(" {n:+}"),
                }
            )
            .unwrap();
        }

        result
    }
}
