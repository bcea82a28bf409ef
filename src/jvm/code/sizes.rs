//! How many bytes instructions take up in the code array
//!
//! Almost every instruction has a size that is fully determined by its operands. The exceptions
//! are the two switches: their operands must be 4-byte aligned relative to the start of the
//! method, so they are preceded by 0 to 3 bytes of padding depending on where the switch ends up.

use super::{Instruction, OpcodeLength};

/// The JVM rejects methods whose code array is longer than this
pub const MAX_CODE_LENGTH: usize = 65535;

/// Sizes of the two `goto`/`jsr` encodings
pub const SHORT_JUMP_LENGTH: usize = 3;
pub const WIDE_JUMP_LENGTH: usize = 5;

/// Instruction whose size could not be computed faithfully
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SizeError {
    /// Encoded switch is larger than the biggest possible method
    TooLarge { length: i64 },

    /// `tableswitch` where `low > high`
    InvertedRange { low: i32, high: i32, length: usize },
}

impl SizeError {
    /// Length to account for if processing continues anyway
    pub fn fallback_length(&self) -> usize {
        match self {
            SizeError::TooLarge { length } => usize::try_from(*length).unwrap_or(usize::MAX),
            SizeError::InvertedRange { length, .. } => *length,
        }
    }
}

/// Padding after a switch opcode placed at `offset`
pub fn switch_padding(offset: usize) -> usize {
    3 - (offset % 4)
}

/// Encoded length of a `tableswitch` at `offset` covering `low..=high`
///
/// This is computed with 64-bit arithmetic so that even `i32::MIN..=i32::MAX` doesn't overflow.
pub fn table_switch_length(offset: usize, low: i32, high: i32) -> i64 {
    let entries = high as i64 - low as i64 + 1;
    1 + switch_padding(offset) as i64 + 12 + 4 * entries
}

/// Encoded length of a `lookupswitch` at `offset` with `cases` entries
pub fn lookup_switch_length(offset: usize, cases: usize) -> i64 {
    1 + switch_padding(offset) as i64 + 8 + 8 * cases as i64
}

/// Size of an instruction, assuming it starts at `offset` in the code array
///
/// The offset only matters for `tableswitch` and `lookupswitch`.
pub fn size_at(insn: &Instruction, offset: usize) -> Result<usize, SizeError> {
    let length = match insn {
        Instruction::TableSwitch { low, high, .. } => {
            if low > high {
                return Err(SizeError::InvertedRange {
                    low: *low,
                    high: *high,
                    length: 1 + switch_padding(offset) + 12,
                });
            }
            table_switch_length(offset, *low, *high)
        }
        Instruction::LookupSwitch { cases, .. } => lookup_switch_length(offset, cases.len()),
        _ => return Ok(size(insn)),
    };

    if length > MAX_CODE_LENGTH as i64 {
        Err(SizeError::TooLarge { length })
    } else {
        Ok(length as usize)
    }
}

/// Size of an instruction whose size doesn't depend on where it is placed
///
/// Switches are sized as though placed at offset 0 (and without the overflow check).
pub fn size(insn: &Instruction) -> usize {
    match insn {
        Instruction::IInc(_, _) if insn.is_wide() => 6,
        _ if insn.is_wide() => 4,
        Instruction::TableSwitch { low, high, .. } => {
            table_switch_length(0, *low, *high).max(0) as usize
        }
        Instruction::LookupSwitch { cases, .. } => lookup_switch_length(0, cases.len()) as usize,
        _ => match insn.opcode().length() {
            OpcodeLength::Fixed(length) => length,
            OpcodeLength::Variable => 1,
        },
    }
}

/// Extra bytes an instruction at `offset` might take up, once everything before it has been
/// finalized
///
/// `offset` is the smallest offset the instruction could be placed at. The result accounts for
/// a `goto`/`jsr` becoming wide, a conditional branch getting a `goto_w` trampoline, and a switch
/// being pushed far enough along that its padding grows.
pub fn worst_case_growth(insn: &Instruction, offset: usize) -> usize {
    match insn {
        Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. } => offset & 3,
        Instruction::Goto(_) | Instruction::Jsr(_) => WIDE_JUMP_LENGTH - SHORT_JUMP_LENGTH,
        Instruction::GotoW(_) | Instruction::JsrW(_) => 0,
        Instruction::If(_, _)
        | Instruction::IfICmp(_, _)
        | Instruction::IfACmp(_, _)
        | Instruction::IfNull(_, _) => WIDE_JUMP_LENGTH,
        _ => 0,
    }
}
