//! Method bodies: instructions, their sizes, and the rewrites applied before they are written out
//!
//! A method body is a sequence of [`CodeElement`]s. It goes through a [`BranchWidthResolver`],
//! which narrows constants and switches and picks a width for every jump, and the resulting
//! [`ResolvedCode`] is serialized against a [`ConstantPool`].

mod code_array;
mod constants;
mod instructions;
mod jump_encoding;
mod label;
mod opcodes;
mod sizes;
mod switches;

pub use code_array::*;
pub use constants::shrink_constant;
pub use instructions::*;
pub use jump_encoding::{resolve_code, BranchWidthResolver, OffsetRange, ResolvedCode};
pub use label::*;
pub use opcodes::*;
pub use sizes::{
    lookup_switch_length, size_at, switch_padding, table_switch_length, worst_case_growth,
    SizeError, MAX_CODE_LENGTH,
};
pub use switches::{shrink_switch, smallest_switch, smallest_switch_with_default, sort_cases};
