use crate::jvm::code::MAX_CODE_LENGTH;

/// Knobs for how method bodies get encoded
///
/// The defaults produce the smallest encoding. Turning the optimizations off is mostly useful
/// when the caller wants the instructions it supplied to come out byte for byte as they went in
/// (eg. when re-assembling a disassembled class).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Rewrite `ldc`/`ldc_w`/`ldc2_w`/`bipush`/`sipush` into the narrowest equivalent
    /// instruction as they get pushed into the resolver
    pub shrink_constants: bool,

    /// Re-encode switches as the smaller of `tableswitch` and `lookupswitch`, dropping cases that
    /// just jump to the default
    pub shrink_switches: bool,

    /// Replace `if* L1; goto L2; L1:` with `ifnot* L2; L1:`
    pub fold_branch_over_goto: bool,

    /// Code length above which the oversized method diagnostic is reported
    ///
    /// This should only ever be changed for testing, since the JVM rejects any method whose code
    /// array is longer than 65535 bytes.
    pub max_code_length: usize,
}

impl Settings {
    pub fn new() -> Settings {
        Settings {
            shrink_constants: true,
            shrink_switches: true,
            fold_branch_over_goto: true,
            max_code_length: MAX_CODE_LENGTH,
        }
    }

    /// Settings which leave every instruction as it was supplied (only branch widths are
    /// still chosen)
    pub fn verbatim() -> Settings {
        Settings {
            shrink_constants: false,
            shrink_switches: false,
            fold_branch_over_goto: false,
            max_code_length: MAX_CODE_LENGTH,
        }
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings::new()
    }
}
