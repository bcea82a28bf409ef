//! Picking between `tableswitch` and `lookupswitch`
//!
//! The two switch instructions do the same thing, but `tableswitch` stores one target per key in
//! a dense range while `lookupswitch` stores explicit key/target pairs. Which one is smaller
//! depends on how densely the keys cover their range. Since both use the same padding rule, the
//! comparison is done as though the switch were placed at offset 0.

use super::sizes::{lookup_switch_length, size_at, table_switch_length, MAX_CODE_LENGTH};
use super::{Instruction, Opcode, SwitchCase, SynLabel};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::jvm::Error;
use std::collections::HashMap;

/// Sort cases by key and drop the ones that can't be encoded
///
/// Dropped cases are reported:
///
///   - a key outside of `low..=high` is an error
///   - a case with the same key and target as the previous case is a warning
///   - a case with the same key as the previous case, but a different target, is an error (the
///     first case wins)
///
/// The sort is stable, so "first" means first in the order the cases were supplied.
pub fn sort_cases(
    switch: Opcode,
    low: i32,
    high: i32,
    cases: &[SwitchCase],
    diagnostics: &mut impl Diagnostics,
) -> Vec<SwitchCase> {
    let mut sorted = cases.to_vec();
    sorted.sort_by_key(|case| case.key);

    let mut kept: Vec<SwitchCase> = Vec::with_capacity(sorted.len());
    let mut previous: Option<SwitchCase> = None;
    for case in sorted {
        if case.key < low || case.key > high {
            diagnostics.report(Diagnostic::error(DiagnosticKind::KeyOutOfRange {
                key: case.key,
                low,
                high,
            }));
        } else if let Some(previous) = previous.filter(|previous| previous.key == case.key) {
            if previous.target == case.target {
                diagnostics.report(Diagnostic::warning(DiagnosticKind::DuplicateCase {
                    key: case.key,
                    switch,
                }));
            } else {
                diagnostics.report(Diagnostic::error(DiagnosticKind::AmbiguousCase {
                    key: case.key,
                    switch,
                    dropped_target: case.target,
                }));
            }
        } else {
            kept.push(case);
        }
        previous = Some(case);
    }

    kept
}

/// Smallest switch with the given default target
///
/// `cases` must already be sorted and free of duplicate keys (see [`sort_cases`]). Cases jumping
/// to the default are redundant and get removed. If that leaves nothing, the result is an empty
/// `lookupswitch`.
pub fn smallest_switch_with_default(default: SynLabel, cases: &[SwitchCase]) -> Instruction {
    let cases: Vec<SwitchCase> = cases
        .iter()
        .filter(|case| case.target != default)
        .copied()
        .collect();

    let (low, high) = match (cases.first(), cases.last()) {
        (Some(first), Some(last)) => (first.key, last.key),
        _ => return Instruction::LookupSwitch { default, cases },
    };

    if table_switch_length(0, low, high) < lookup_switch_length(0, cases.len()) {
        Instruction::TableSwitch {
            default,
            low,
            high,
            cases,
        }
    } else {
        Instruction::LookupSwitch { default, cases }
    }
}

/// Smallest switch covering only the given cases, where any key not in the cases may go to any
/// of the case targets
///
/// The default target is picked from: the target of the highest key, then the target of the
/// lowest key, then the most frequent target (if it is used more than once and differs from the
/// previous two). A later candidate only replaces an earlier one if the switch it leads to is
/// strictly smaller.
pub fn smallest_switch(
    cases: &[SwitchCase],
    diagnostics: &mut impl Diagnostics,
) -> Result<Instruction, Error> {
    let cases = sort_cases(Opcode::LookupSwitch, i32::MIN, i32::MAX, cases, diagnostics);
    let (low_target, high_target) = match (cases.first(), cases.last()) {
        (Some(first), Some(last)) => (first.target, last.target),
        _ => return Err(Error::NoSwitchCases),
    };

    let mut best = smallest_switch_with_default(high_target, &cases);
    let mut best_length = encoded_length(&best);

    let mut candidates = vec![low_target];
    if let Some((frequent, count)) = most_frequent_target(&cases) {
        if count > 1 && frequent != low_target && frequent != high_target {
            candidates.push(frequent);
        }
    }

    for default in candidates {
        let candidate = smallest_switch_with_default(default, &cases);
        let length = encoded_length(&candidate);
        if length < best_length {
            best = candidate;
            best_length = length;
        }
    }

    Ok(best)
}

/// Re-encode a switch in its smallest form, keeping its default
///
/// A `tableswitch` only keeps the cases within its own `low..=high`. Any other instruction is
/// returned as is.
pub fn shrink_switch(insn: Instruction, diagnostics: &mut impl Diagnostics) -> Instruction {
    let shrunk = match insn {
        Instruction::TableSwitch {
            default,
            low,
            high,
            cases,
        } => {
            if low > high {
                diagnostics.report(Diagnostic::error(DiagnosticKind::InvertedSwitchRange {
                    low,
                    high,
                }));
            }
            let sorted = sort_cases(Opcode::TableSwitch, low, high, &cases, diagnostics);
            smallest_switch_with_default(default, &sorted)
        }
        Instruction::LookupSwitch { default, cases } => {
            let sorted = sort_cases(Opcode::LookupSwitch, i32::MIN, i32::MAX, &cases, diagnostics);
            smallest_switch_with_default(default, &sorted)
        }
        other => return other,
    };

    let length = encoded_length(&shrunk);
    if length > MAX_CODE_LENGTH as i64 {
        diagnostics.report(Diagnostic::error(DiagnosticKind::SwitchTooLarge {
            length,
            max: MAX_CODE_LENGTH,
        }));
    }

    shrunk
}

/// Length of a switch at offset 0, even if it is too large
fn encoded_length(insn: &Instruction) -> i64 {
    match size_at(insn, 0) {
        Ok(length) => length as i64,
        Err(err) => err.fallback_length() as i64,
    }
}

/// Most frequent target, along with how often it occurs (ties go to the target whose first case
/// comes first)
fn most_frequent_target(cases: &[SwitchCase]) -> Option<(SynLabel, usize)> {
    let mut counts: HashMap<SynLabel, usize> = HashMap::new();
    for case in cases {
        *counts.entry(case.target).or_insert(0) += 1;
    }

    let mut best: Option<(SynLabel, usize)> = None;
    for case in cases {
        let count = counts[&case.target];
        match best {
            Some((_, best_count)) if best_count >= count => (),
            _ => best = Some((case.target, count)),
        }
    }
    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::jvm::code::{LabelGenerator, SynLabelGenerator};

    fn labels<const N: usize>() -> [SynLabel; N] {
        let mut gen = SynLabelGenerator::default();
        [(); N].map(|_| gen.fresh_label())
    }

    #[test]
    fn duplicate_case_is_dropped_with_warning() {
        let [l1]: [SynLabel; 1] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let cases = [SwitchCase::new(1, l1), SwitchCase::new(1, l1)];
        let sorted = sort_cases(Opcode::LookupSwitch, i32::MIN, i32::MAX, &cases, &mut diagnostics);
        assert_eq!(sorted, vec![SwitchCase::new(1, l1)]);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::warning(DiagnosticKind::DuplicateCase {
                key: 1,
                switch: Opcode::LookupSwitch,
            })]
        );
    }

    #[test]
    fn ambiguous_case_is_dropped_with_error() {
        let [l1, l2]: [SynLabel; 2] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let cases = [SwitchCase::new(1, l1), SwitchCase::new(1, l2)];
        let sorted = sort_cases(Opcode::LookupSwitch, i32::MIN, i32::MAX, &cases, &mut diagnostics);
        assert_eq!(sorted, vec![SwitchCase::new(1, l1)]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::AmbiguousCase { key: 1, dropped_target, .. } if dropped_target == l2
        ));
    }

    #[test]
    fn dropped_case_still_counts_as_previous() {
        // The third case matches the (dropped) second one, so it is a duplicate, not ambiguous
        let [l1, l2]: [SynLabel; 2] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let cases = [
            SwitchCase::new(7, l1),
            SwitchCase::new(7, l2),
            SwitchCase::new(7, l2),
        ];
        let sorted = sort_cases(Opcode::TableSwitch, 0, 10, &cases, &mut diagnostics);
        assert_eq!(sorted, vec![SwitchCase::new(7, l1)]);
        let severities: Vec<Severity> = diagnostics.iter().map(|d| d.severity).collect();
        assert_eq!(severities, vec![Severity::Error, Severity::Warning]);
    }

    #[test]
    fn out_of_range_keys() {
        let [l1, l2, l3]: [SynLabel; 3] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let cases = [
            SwitchCase::new(5, l1),
            SwitchCase::new(-1, l2),
            SwitchCase::new(2, l3),
        ];
        let sorted = sort_cases(Opcode::TableSwitch, 0, 3, &cases, &mut diagnostics);
        assert_eq!(sorted, vec![SwitchCase::new(2, l3)]);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].to_string(), "key -1 is not in range [0,3]");
        assert_eq!(diagnostics[1].to_string(), "key 5 is not in range [0,3]");
    }

    #[test]
    fn dense_cases_use_table() {
        let [dflt, a, b, c]: [SynLabel; 4] = labels();
        let cases = [
            SwitchCase::new(1, a),
            SwitchCase::new(2, b),
            SwitchCase::new(3, c),
            SwitchCase::new(4, a),
        ];
        // table: 1 + 3 + 12 + 16 = 32, lookup: 1 + 3 + 8 + 32 = 44
        assert_eq!(
            smallest_switch_with_default(dflt, &cases),
            Instruction::TableSwitch {
                default: dflt,
                low: 1,
                high: 4,
                cases: cases.to_vec(),
            }
        );
    }

    #[test]
    fn sparse_cases_use_lookup() {
        let [dflt, a, b]: [SynLabel; 3] = labels();
        let cases = [SwitchCase::new(1, a), SwitchCase::new(1000, b)];
        assert_eq!(
            smallest_switch_with_default(dflt, &cases),
            Instruction::LookupSwitch {
                default: dflt,
                cases: cases.to_vec(),
            }
        );
    }

    #[test]
    fn equal_sizes_use_lookup() {
        // One case: table is 1 + 3 + 12 + 4 = 20, lookup is 1 + 3 + 8 + 8 = 20
        let [dflt, a]: [SynLabel; 2] = labels();
        let cases = [SwitchCase::new(42, a)];
        assert!(matches!(
            smallest_switch_with_default(dflt, &cases),
            Instruction::LookupSwitch { .. }
        ));
    }

    #[test]
    fn cases_to_default_are_removed() {
        let [dflt, a]: [SynLabel; 2] = labels();
        let cases = [SwitchCase::new(1, dflt), SwitchCase::new(2, dflt)];
        assert_eq!(
            smallest_switch_with_default(dflt, &cases),
            Instruction::LookupSwitch {
                default: dflt,
                cases: vec![],
            }
        );

        let cases = [
            SwitchCase::new(1, dflt),
            SwitchCase::new(2, a),
            SwitchCase::new(3, dflt),
        ];
        assert_eq!(
            smallest_switch_with_default(dflt, &cases),
            Instruction::LookupSwitch {
                default: dflt,
                cases: vec![SwitchCase::new(2, a)],
            }
        );
    }

    #[test]
    fn default_reconstruction() {
        let [a, b, c]: [SynLabel; 3] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];

        // Highest key's target is tried first and nothing beats it
        let cases = [SwitchCase::new(1, a), SwitchCase::new(2, b)];
        assert_eq!(
            smallest_switch(&cases, &mut diagnostics).unwrap(),
            Instruction::LookupSwitch {
                default: b,
                cases: vec![SwitchCase::new(1, a)],
            }
        );

        // The frequent target in the middle is the best default
        let cases = [
            SwitchCase::new(0, a),
            SwitchCase::new(10, b),
            SwitchCase::new(20, b),
            SwitchCase::new(30, b),
            SwitchCase::new(40, c),
        ];
        assert_eq!(
            smallest_switch(&cases, &mut diagnostics).unwrap(),
            Instruction::LookupSwitch {
                default: b,
                cases: vec![SwitchCase::new(0, a), SwitchCase::new(40, c)],
            }
        );

        // The lowest key's target covers more cases than the highest key's
        let cases = [
            SwitchCase::new(0, a),
            SwitchCase::new(100, a),
            SwitchCase::new(200, c),
        ];
        assert_eq!(
            smallest_switch(&cases, &mut diagnostics).unwrap(),
            Instruction::LookupSwitch {
                default: a,
                cases: vec![SwitchCase::new(200, c)],
            }
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn no_cases_means_no_default() {
        let mut diagnostics: Vec<Diagnostic> = vec![];
        assert!(matches!(
            smallest_switch(&[], &mut diagnostics),
            Err(Error::NoSwitchCases)
        ));
    }

    #[test]
    fn shrink_existing_switches() {
        let [dflt, a, b]: [SynLabel; 3] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];

        // A sparse table becomes a lookup
        let table = Instruction::TableSwitch {
            default: dflt,
            low: 0,
            high: 1000,
            cases: vec![SwitchCase::new(0, a), SwitchCase::new(1000, b)],
        };
        assert_eq!(
            shrink_switch(table, &mut diagnostics),
            Instruction::LookupSwitch {
                default: dflt,
                cases: vec![SwitchCase::new(0, a), SwitchCase::new(1000, b)],
            }
        );

        // A dense lookup becomes a table, narrowed to the keys actually used
        let lookup = Instruction::LookupSwitch {
            default: dflt,
            cases: vec![
                SwitchCase::new(3, b),
                SwitchCase::new(1, a),
                SwitchCase::new(2, a),
                SwitchCase::new(4, b),
            ],
        };
        assert_eq!(
            shrink_switch(lookup, &mut diagnostics),
            Instruction::TableSwitch {
                default: dflt,
                low: 1,
                high: 4,
                cases: vec![
                    SwitchCase::new(1, a),
                    SwitchCase::new(2, a),
                    SwitchCase::new(3, b),
                    SwitchCase::new(4, b),
                ],
            }
        );
        assert!(diagnostics.is_empty());

        assert_eq!(shrink_switch(Instruction::Nop, &mut diagnostics), Instruction::Nop);
    }

    #[test]
    fn inverted_table_is_reported() {
        let [dflt, a]: [SynLabel; 2] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let table = Instruction::TableSwitch {
            default: dflt,
            low: 3,
            high: 1,
            cases: vec![SwitchCase::new(2, a)],
        };
        assert_eq!(
            shrink_switch(table, &mut diagnostics),
            Instruction::LookupSwitch {
                default: dflt,
                cases: vec![],
            }
        );
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::InvertedSwitchRange { low: 3, high: 1 }
        );
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn oversized_switch_is_reported() {
        let [dflt, a]: [SynLabel; 2] = labels();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let cases: Vec<SwitchCase> = (0..9000).map(|key| SwitchCase::new(key * 2, a)).collect();
        let lookup = Instruction::LookupSwitch {
            default: dflt,
            cases,
        };
        let shrunk = shrink_switch(lookup, &mut diagnostics);
        assert!(matches!(shrunk, Instruction::LookupSwitch { .. }));
        assert!(matches!(
            diagnostics.as_slice(),
            [Diagnostic {
                severity: Severity::Error,
                kind: DiagnosticKind::SwitchTooLarge { .. },
            }]
        ));
    }
}
