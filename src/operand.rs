/// Operand types as encoded in the 2-bit type fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// Large constant (2 bytes)
    LargeConstant,
    /// Small constant (1 byte)
    SmallConstant,
    /// Variable number (1 byte)
    Variable,
    /// Omitted (not present)
    Omitted,
}

impl OperandType {
    /// Parse an operand type from a 2-bit field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => OperandType::LargeConstant,
            0b01 => OperandType::SmallConstant,
            0b10 => OperandType::Variable,
            0b11 => OperandType::Omitted,
            _ => unreachable!(),
        }
    }

    /// Encoded size of an operand of this type in bytes
    pub fn size(&self) -> usize {
        match self {
            OperandType::LargeConstant => 2,
            OperandType::SmallConstant => 1,
            OperandType::Variable => 1,
            OperandType::Omitted => 0,
        }
    }
}

/// One decoded operand: its encoded type plus the raw value bytes
///
/// Resolution to a runtime value happens in the engine, because a
/// `Variable` operand may pop the evaluation stack or read a local or
/// global. Small constants never exceed 8 bits by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub op_type: OperandType,
    pub raw: u16,
}

impl Operand {
    pub fn large(value: u16) -> Self {
        Operand {
            op_type: OperandType::LargeConstant,
            raw: value,
        }
    }

    pub fn small(value: u8) -> Self {
        Operand {
            op_type: OperandType::SmallConstant,
            raw: value as u16,
        }
    }

    pub fn variable(number: u8) -> Self {
        Operand {
            op_type: OperandType::Variable,
            raw: number as u16,
        }
    }

    /// True for constant operands whose value is known without the
    /// machine state
    pub fn is_constant(&self) -> bool {
        matches!(
            self.op_type,
            OperandType::LargeConstant | OperandType::SmallConstant
        )
    }
}
