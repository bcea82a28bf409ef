//! JVM model used by the code generator
//!
//! Only the parts of a class file that matter for a single method body live here: names and
//! descriptors (so that field and method references can be typed), method access flags (so that
//! the initial locals can be derived), and the binary serialization helpers used to write out the
//! final code array. Everything else about classes (constant pools, attributes, the class file
//! container) is the business of whatever consumes the generated code.

mod access_flags;
mod binary_format;
pub mod code;
mod descriptors;
mod errors;
mod names;
pub mod verifier;

pub use access_flags::*;
pub use binary_format::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
