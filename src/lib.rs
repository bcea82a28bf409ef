//! Code generation backend for JVM method bodies
//!
//! Given the abstract instruction stream of a single method (as produced by some assembler
//! front-end), this crate decides the final encoding of that method's code array:
//!
//!   - the narrowest opcode for every constant push ([`jvm::code::shrink_constant`])
//!   - the smallest `tableswitch`/`lookupswitch` encoding ([`jvm::code::smallest_switch`])
//!   - short or wide forms for every jump ([`jvm::code::BranchWidthResolver`])
//!
//! Independently of that, [`jvm::verifier::StackSimulator`] walks the same stream to compute the
//! maximum operand stack depth and the verification types at every label.

pub mod diagnostics;
pub mod jvm;
pub mod settings;
pub mod util;
