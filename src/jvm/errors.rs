use super::code::{OffsetRange, SynLabel};
use super::verifier::VType;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// A label is the target of some instruction but never placed in the method
    UndefinedLabel(SynLabel),

    /// A label is placed twice in the same method
    DuplicateLabel(SynLabel),

    /// The exact offset of a label falls outside the range estimated for it (indicates a bug)
    LabelOutsideRange {
        label: SynLabel,
        actual: usize,
        range: OffsetRange,
    },

    /// A switch reconstructed from its cases alone has no cases at all
    NoSwitchCases,

    /// A short branch was chosen but its relative offset does not fit (indicates a bug)
    BranchOffsetOverflow {
        label: SynLabel,
        from: usize,
        to: usize,
    },

    /// A switch too large for any method was about to be written out
    SwitchTooLarge { offset: usize, length: i64 },

    /// An `ldc` constant ended up at a constant pool index that does not fit in a byte
    ConstantIndexOverflow(u16),

    /// A constant pool entry could not be produced
    MissingConstant(String),

    /// Error simulating the operand stack
    StackError {
        instruction: String,
        kind: StackErrorKind,
    },
}

#[derive(Debug, PartialEq)]
pub enum StackErrorKind {
    EmptyStack,
    NonEmptyStack,
    InvalidWidth(usize),
    InvalidType { expected: TypeKind, found: VType },
    InvalidLocal(u16),
    MissingNewLabel,
}

/// Coarse category of a verification type, used to check pops against what an instruction expects
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "{}", err),
            Error::UndefinedLabel(label) => write!(f, "label {:?} is used but not defined", label),
            Error::DuplicateLabel(label) => write!(f, "label {:?} is defined twice", label),
            Error::LabelOutsideRange {
                label,
                actual,
                range,
            } => write!(
                f,
                "actual offset {} is not in range [{},{}] (label {:?})",
                actual, range.min, range.max, label
            ),
            Error::NoSwitchCases => {
                f.write_str("cannot calculate default label as no cases are present")
            }
            Error::BranchOffsetOverflow { label, from, to } => write!(
                f,
                "short branch from {} to {:?} at {} is out of range",
                from, label, to
            ),
            Error::SwitchTooLarge { offset, length } => write!(
                f,
                "switch at {} is {} bytes long, which does not fit in a method",
                offset, length
            ),
            Error::ConstantIndexOverflow(index) => {
                write!(f, "constant pool index {} does not fit in ldc", index)
            }
            Error::MissingConstant(msg) => write!(f, "cannot add constant: {}", msg),
            Error::StackError { instruction, kind } => {
                write!(f, "{} at {}", kind, instruction)
            }
        }
    }
}

impl fmt::Display for StackErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackErrorKind::EmptyStack => f.write_str("pop from empty stack"),
            StackErrorKind::NonEmptyStack => f.write_str("stack must be empty to use set()"),
            StackErrorKind::InvalidWidth(width) => write!(f, "unexpected value of width {}", width),
            StackErrorKind::InvalidType { expected, found } => {
                write!(f, "expected {:?} but found {:?}", expected, found)
            }
            StackErrorKind::InvalidLocal(slot) => write!(f, "invalid local variable {}", slot),
            StackErrorKind::MissingNewLabel => {
                f.write_str("new must immediately follow a label")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}
