//! Non-fatal problems noticed while encoding a method
//!
//! Malformed switch cases and oversized methods do not stop code generation: the offending
//! case is dropped (or the oversized code is emitted anyway) and a [`Diagnostic`] is reported to
//! whatever sink the caller passed in. Fatal problems are returned as [`crate::jvm::Error`]
//! instead.

use crate::jvm::code::{Opcode, SynLabel};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Case key outside of the keys the switch can hold
    KeyOutOfRange { key: i32, low: i32, high: i32 },

    /// Same key and same target as the previous case
    DuplicateCase { key: i32, switch: Opcode },

    /// Same key as the previous case, but a different target
    AmbiguousCase {
        key: i32,
        switch: Opcode,
        dropped_target: SynLabel,
    },

    /// Encoded switch would not fit in a method
    SwitchTooLarge { length: i64, max: usize },

    /// `tableswitch` whose `low` is bigger than its `high`
    InvertedSwitchRange { low: i32, high: i32 },

    /// Worst case size of the method exceeds the code length limit
    MethodTooLarge {
        method: String,
        size: usize,
        max: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            kind,
        }
    }

    pub fn error(kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::KeyOutOfRange { key, low, high } => {
                write!(f, "key {} is not in range [{},{}]", key, low, high)
            }
            DiagnosticKind::DuplicateCase { key, switch } => {
                write!(f, "duplicate case {} in {} dropped", key, switch.mnemonic())
            }
            DiagnosticKind::AmbiguousCase { key, switch, .. } => {
                write!(f, "ambiguous case {} in {} dropped", key, switch.mnemonic())
            }
            DiagnosticKind::SwitchTooLarge { length, max } => write!(
                f,
                "switch length {} is larger than the maximum {}",
                length, max
            ),
            DiagnosticKind::InvertedSwitchRange { low, high } => {
                write!(f, "tableswitch low {} is greater than high {}", low, high)
            }
            DiagnosticKind::MethodTooLarge { method, size, max } => write!(
                f,
                "potential maximum size {} of method {} is larger than the maximum {}",
                size, method, max
            ),
        }
    }
}

/// Sink for diagnostics
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collect diagnostics for later inspection
impl Diagnostics for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forward diagnostics to the `log` facade, keeping count of what went by
#[derive(Default, Debug)]
pub struct LogDiagnostics {
    pub warnings: usize,
    pub errors: usize,
}

impl LogDiagnostics {
    pub fn new() -> LogDiagnostics {
        LogDiagnostics::default()
    }

    /// Total number of diagnostics reported
    pub fn count(&self) -> usize {
        self.warnings + self.errors
    }
}

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => {
                self.warnings += 1;
                log::warn!("{}", diagnostic);
            }
            Severity::Error => {
                self.errors += 1;
                log::error!("{}", diagnostic);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages() {
        let duplicate = Diagnostic::warning(DiagnosticKind::DuplicateCase {
            key: 1,
            switch: Opcode::LookupSwitch,
        });
        assert_eq!(duplicate.to_string(), "duplicate case 1 in lookupswitch dropped");

        let too_large = Diagnostic::error(DiagnosticKind::MethodTooLarge {
            method: String::from("main"),
            size: 70000,
            max: 65535,
        });
        assert_eq!(
            too_large.to_string(),
            "potential maximum size 70000 of method main is larger than the maximum 65535"
        );

        let out_of_range = Diagnostic::error(DiagnosticKind::KeyOutOfRange {
            key: 9,
            low: 0,
            high: 3,
        });
        assert_eq!(out_of_range.to_string(), "key 9 is not in range [0,3]");
    }

    #[test]
    fn log_diagnostics_counts() {
        let mut sink = LogDiagnostics::new();
        sink.report(Diagnostic::warning(DiagnosticKind::DuplicateCase {
            key: 1,
            switch: Opcode::TableSwitch,
        }));
        sink.report(Diagnostic::error(DiagnosticKind::InvertedSwitchRange {
            low: 2,
            high: 1,
        }));
        sink.report(Diagnostic::error(DiagnosticKind::SwitchTooLarge {
            length: 70000,
            max: 65535,
        }));
        assert_eq!(sink.warnings, 1);
        assert_eq!(sink.errors, 2);
        assert_eq!(sink.count(), 3);
    }
}
