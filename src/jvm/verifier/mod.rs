//! Operand stack and local variable type tracking
//!
//! For any specific instruction inside a method body, the stack and locals should have the same
//! structure, regardless of which control flow was used to reach that instruction. In other words:
//! although the values on the stack and in the locals may obviously be different, the types and
//! order of the stack and local variables cannot. This information is what a stack map frame
//! stores, and the JVM needs one at every jump target.
//!
//! The "types" used here (represented using [`VerificationType`]) are the verifier's, so they are
//! slightly augmented to take into account initialization and null. [`StackSimulator`] walks a
//! method body once, adjusting an [`OperandStack`] and [`LocalVariables`] for each instruction,
//! which gives the maximum stack depth and a [`LabelFrame`] at every label. Merging frames from
//! different predecessors is left to whoever builds the stack map table: when code is only
//! reachable by a jump, the frame for its label can be supplied up front.
//!
//! See [verification by type-checking][0].
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.10.1

mod locals;
mod simulate;
mod stack;
mod types;

pub use locals::*;
pub use simulate::*;
pub use stack::*;
pub use types::*;
