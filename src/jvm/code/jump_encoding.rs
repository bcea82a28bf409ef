//! Choose between short and wide jumps
//!
//! Most jumps have a signed 16-bit relative offset. When the target is further away than that,
//! `goto` and `jsr` have wide variants (`goto_w` and `jsr_w`), but conditional branches don't. For
//! those, we use a trampoline: the condition is negated to jump over an unconditional `goto_w`.
//!
//! ```text,ignore,no_run
//!     if* L2            ifnot* L3
//!     ...        =>     goto_w L2
//!                   L3: ...
//! ```
//!
//! ### Two passes
//!
//! Widening a jump makes it longer, which pushes other labels further away and can force yet more
//! jumps to be widened. Rather than iterating until nothing changes, we do two linear passes:
//!
//!   1. Every element gets an [`OffsetRange`]: the smallest offset it could end up at (every jump
//!      short, every switch padded as though nothing before it grows) and the largest (every jump
//!      wide or trampolined, every switch padded the most). Labels remember the range they were
//!      placed at.
//!
//!   2. Offsets are fixed from the start of the method. When a jump is reached, everything before
//!      it already has an exact position, so the jump's own offset is exact. Backward targets are
//!      exact too. For forward targets, the distance still has to be bounded using the target's
//!      range, but that bound can be tightened by the slack that has already been resolved: the
//!      current element's exact offset is known to be some bytes below its own maximum, and
//!      every later element is shifted down by at least that much too. If the jump stays short,
//!      the growth it was allowed in pass 1 is also never used, so it comes off the bound as well.
//!
//! Since the ranges are genuine bounds, pass 2 never has to backtrack: a jump that is short is
//! guaranteed to reach its target.
//!
//! ### Folding branches over `goto`
//!
//! Front-ends often produce `if* L1; goto L2; L1:` (branch around an unconditional jump). This
//! is rewritten into `ifnot* L2; L1:` as elements are pushed, before any sizes are accounted for.

use super::sizes::{size_at, worst_case_growth, SizeError, MAX_CODE_LENGTH, WIDE_JUMP_LENGTH};
use super::{
    constants, switches, BranchCondition, CodeElement, Instruction, LabelGenerator, SynLabel,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::jvm::Error;
use crate::settings::Settings;
use crate::util::Offset;
use std::collections::HashMap;

/// Range of offsets something could end up at in the final code array
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OffsetRange {
    pub min: usize,
    pub max: usize,
}

impl OffsetRange {
    pub const ZERO: OffsetRange = OffsetRange { min: 0, max: 0 };

    /// Range containing only one offset
    pub const fn exact(offset: usize) -> OffsetRange {
        OffsetRange {
            min: offset,
            max: offset,
        }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.min <= offset && offset <= self.max
    }

    /// Collapse the range onto the offset that was actually picked, if it is in the range
    pub fn resolve(&self, actual: usize) -> Option<OffsetRange> {
        if self.contains(actual) {
            Some(OffsetRange::exact(actual))
        } else {
            None
        }
    }

    /// Is a jump from `actual` to anywhere in this range guaranteed to fit in a signed 16-bit
    /// relative offset?
    ///
    /// `over` is how far below `max` the target is known to end up if the jump stays short. Unless
    /// it is zero (or the range is a single point), only the forward distance to `max - over` is
    /// checked: ranges that are not a single point are always ahead of the jump.
    pub fn small(&self, actual: usize, over: usize) -> bool {
        let actual = actual as i64;
        let min = self.min as i64;
        let max = self.max as i64;
        if self.min == self.max || over == 0 {
            actual + (i16::MIN as i64) <= min && actual + (i16::MAX as i64) >= max
        } else {
            actual + (i16::MAX as i64) >= max - over as i64
        }
    }
}

/// Which of the elements of `if* L1; goto L2; L1:` have been seen and held back
#[derive(Debug)]
enum Pending {
    Nothing,
    Branch(BranchCondition, SynLabel),
    BranchThenGoto(BranchCondition, SynLabel, SynLabel),
}

/// Accumulates the elements of one method body, then decides on jump widths
///
/// Elements are pushed one by one. Once the whole method body has been pushed, [`Self::finish`]
/// fixes the exact offsets.
pub struct BranchWidthResolver {
    /// Name of the method (only used for diagnostics)
    method_name: String,

    settings: Settings,

    /// Elements accounted for so far, along with the range they start at
    elements: Vec<(CodeElement, OffsetRange)>,

    /// Ranges of labels placed so far
    labels: HashMap<SynLabel, OffsetRange>,

    /// Range of the offset right after the last accounted element
    current: OffsetRange,

    /// Elements held back to see if they can be folded
    pending: Pending,
}

/// Method body with all jump widths decided
#[derive(Debug)]
pub struct ResolvedCode {
    /// Final elements (only `goto`, `goto_w`, `jsr`, and `jsr_w` change width and some labels
    /// and `goto_w`s might be added for trampolines)
    pub elements: Vec<CodeElement>,

    /// Exact offset of every label
    pub label_offsets: HashMap<SynLabel, Offset>,

    /// Range estimated for each label before the offsets were fixed
    pub label_ranges: HashMap<SynLabel, OffsetRange>,

    /// Length of the code array
    pub code_length: usize,
}

impl BranchWidthResolver {
    pub fn new(method_name: impl Into<String>, settings: Settings) -> BranchWidthResolver {
        BranchWidthResolver {
            method_name: method_name.into(),
            settings,
            elements: vec![],
            labels: HashMap::new(),
            current: OffsetRange::ZERO,
            pending: Pending::Nothing,
        }
    }

    /// Range of offsets the next element could be placed at
    ///
    /// Elements held back for folding are not counted yet.
    pub fn current_range(&self) -> OffsetRange {
        self.current
    }

    /// Add the next element of the method body
    ///
    /// Constants and switches are narrowed here (if the settings ask for it), and `goto_w`/`jsr_w`
    /// are turned back into `goto`/`jsr`: the resolver picks jump widths itself.
    pub fn push(
        &mut self,
        element: CodeElement,
        diagnostics: &mut impl Diagnostics,
    ) -> Result<(), Error> {
        let element = match element {
            CodeElement::Instruction(insn) => {
                CodeElement::Instruction(self.narrow_instruction(insn, diagnostics))
            }
            label => label,
        };

        if !self.settings.fold_branch_over_goto {
            return self.account(element, diagnostics);
        }

        if let CodeElement::Instruction(insn) = &element {
            if let Some((condition, target)) = insn.conditional_branch() {
                self.flush_pending(diagnostics)?;
                self.pending = Pending::Branch(condition, target);
                return Ok(());
            }
        }

        match (element, std::mem::replace(&mut self.pending, Pending::Nothing)) {
            (
                CodeElement::Instruction(Instruction::Goto(goto_target)),
                Pending::Branch(condition, target),
            ) => {
                self.pending = Pending::BranchThenGoto(condition, target, goto_target);
                Ok(())
            }
            (CodeElement::Label(label), pending) => {
                match pending {
                    Pending::BranchThenGoto(condition, target, goto_target) if target == label => {
                        log::trace!(
                            "Folding {:?} over goto {:?} in {}",
                            condition.branch(target),
                            goto_target,
                            self.method_name
                        );
                        let folded = (!condition).branch(goto_target);
                        self.account(CodeElement::Instruction(folded), diagnostics)?;
                    }
                    pending => {
                        self.pending = pending;
                        self.flush_pending(diagnostics)?;
                    }
                }
                self.account(CodeElement::Label(label), diagnostics)
            }
            (other, pending) => {
                self.pending = pending;
                self.flush_pending(diagnostics)?;
                self.account(other, diagnostics)
            }
        }
    }

    /// Finalize the offsets of every label and the width of every jump
    ///
    /// Trampolines need fresh labels, which is why a label generator is required. It must not
    /// produce labels already used in the method.
    pub fn finish(
        mut self,
        label_generator: &mut impl LabelGenerator<SynLabel>,
        diagnostics: &mut impl Diagnostics,
    ) -> Result<ResolvedCode, Error> {
        self.flush_pending(diagnostics)?;

        if self.current.max > self.settings.max_code_length {
            diagnostics.report(Diagnostic::error(DiagnosticKind::MethodTooLarge {
                method: self.method_name.clone(),
                size: self.current.max,
                max: self.settings.max_code_length,
            }));
        }

        for (element, _) in &self.elements {
            if let CodeElement::Instruction(insn) = element {
                for target in insn.jump_targets() {
                    if !self.labels.contains_key(&target) {
                        return Err(Error::UndefinedLabel(target));
                    }
                }
            }
        }

        log::debug!(
            "Method {} has {} elements and will be between {} and {} bytes",
            self.method_name,
            self.elements.len(),
            self.current.min,
            self.current.max
        );

        let label_ranges = self.labels.clone();
        let mut output: Vec<CodeElement> = Vec::with_capacity(self.elements.len());
        let mut label_offsets: HashMap<SynLabel, Offset> = HashMap::new();
        let mut offset: usize = 0;

        for (element, range) in std::mem::take(&mut self.elements) {
            let over = range.max.saturating_sub(offset);
            match element {
                CodeElement::Label(label) => {
                    let resolved = range.resolve(offset).ok_or(Error::LabelOutsideRange {
                        label,
                        actual: offset,
                        range,
                    })?;
                    self.labels.insert(label, resolved);
                    label_offsets.insert(label, Offset(offset));
                    output.push(CodeElement::Label(label));
                }
                CodeElement::Instruction(insn) => {
                    // If this jump stays short, everything up to a forward target also ends up at
                    // least as far below its maximum as the jump's own widening would have added
                    let slack = over + worst_case_growth(&insn, range.min);
                    let reaches = |target: &SynLabel| {
                        self.labels
                            .get(target)
                            .map_or(false, |target_range| target_range.small(offset, slack))
                    };

                    let emitted = match insn {
                        Instruction::Goto(target) if !reaches(&target) => Instruction::GotoW(target),
                        Instruction::Jsr(target) if !reaches(&target) => Instruction::JsrW(target),
                        other => match other.conditional_branch() {
                            Some((condition, target)) if !reaches(&target) => {
                                let skip = label_generator.fresh_label();
                                log::debug!(
                                    "Branch {:?} at {} in {} needs a trampoline through {:?}",
                                    other,
                                    offset,
                                    self.method_name,
                                    skip
                                );
                                let negated = (!condition).branch(skip);
                                offset += sized(&negated, offset);
                                output.push(CodeElement::Instruction(negated));
                                output.push(CodeElement::Instruction(Instruction::GotoW(target)));
                                offset += WIDE_JUMP_LENGTH;
                                label_offsets.insert(skip, Offset(offset));
                                output.push(CodeElement::Label(skip));
                                continue;
                            }
                            _ => other,
                        },
                    };

                    offset += sized(&emitted, offset);
                    output.push(CodeElement::Instruction(emitted));
                }
            }
        }

        log::debug!("Method {} resolved to {} bytes", self.method_name, offset);

        Ok(ResolvedCode {
            elements: output,
            label_offsets,
            label_ranges,
            code_length: offset,
        })
    }

    /// Apply the instruction rewrites that happen before sizes are counted
    fn narrow_instruction(
        &self,
        insn: Instruction,
        diagnostics: &mut impl Diagnostics,
    ) -> Instruction {
        let insn = match insn {
            Instruction::GotoW(target) => Instruction::Goto(target),
            Instruction::JsrW(target) => Instruction::Jsr(target),
            other => other,
        };
        let insn = if self.settings.shrink_constants {
            constants::shrink_constant(insn)
        } else {
            insn
        };
        if self.settings.shrink_switches {
            switches::shrink_switch(insn, diagnostics)
        } else {
            insn
        }
    }

    /// Account for anything held back
    fn flush_pending(&mut self, diagnostics: &mut impl Diagnostics) -> Result<(), Error> {
        match std::mem::replace(&mut self.pending, Pending::Nothing) {
            Pending::Nothing => (),
            Pending::Branch(condition, target) => {
                self.account(CodeElement::Instruction(condition.branch(target)), diagnostics)?;
            }
            Pending::BranchThenGoto(condition, target, goto_target) => {
                self.account(CodeElement::Instruction(condition.branch(target)), diagnostics)?;
                self.account(
                    CodeElement::Instruction(Instruction::Goto(goto_target)),
                    diagnostics,
                )?;
            }
        }
        Ok(())
    }

    /// Add an element to the body and advance the current offset range past it
    fn account(
        &mut self,
        element: CodeElement,
        diagnostics: &mut impl Diagnostics,
    ) -> Result<(), Error> {
        let range = self.current;
        match &element {
            CodeElement::Label(label) => {
                if self.labels.insert(*label, range).is_some() {
                    return Err(Error::DuplicateLabel(*label));
                }
            }
            CodeElement::Instruction(insn) => {
                let length = match size_at(insn, range.min) {
                    Ok(length) => length,
                    Err(err) => {
                        // Narrowed switches were already checked by `shrink_switch`
                        if !self.settings.shrink_switches {
                            let kind = match err {
                                SizeError::InvertedRange { low, high, .. } => {
                                    DiagnosticKind::InvertedSwitchRange { low, high }
                                }
                                SizeError::TooLarge { length } => DiagnosticKind::SwitchTooLarge {
                                    length,
                                    max: MAX_CODE_LENGTH,
                                },
                            };
                            diagnostics.report(Diagnostic::error(kind));
                        }
                        err.fallback_length()
                    }
                };
                let growth = worst_case_growth(insn, range.min);
                self.current = OffsetRange {
                    min: range.min.saturating_add(length),
                    max: range.max.saturating_add(length).saturating_add(growth),
                };
            }
        }
        self.elements.push((element, range));
        Ok(())
    }
}

/// Size of an instruction in the final code (oversized switches were already reported)
fn sized(insn: &Instruction, offset: usize) -> usize {
    size_at(insn, offset).unwrap_or_else(|err| err.fallback_length())
}

/// Push a whole method body through a resolver
pub fn resolve_code(
    method_name: impl Into<String>,
    elements: impl IntoIterator<Item = CodeElement>,
    settings: &Settings,
    label_generator: &mut impl LabelGenerator<SynLabel>,
    diagnostics: &mut impl Diagnostics,
) -> Result<ResolvedCode, Error> {
    let mut resolver = BranchWidthResolver::new(method_name, settings.clone());
    for element in elements {
        resolver.push(element, diagnostics)?;
    }
    resolver.finish(label_generator, diagnostics)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::{Diagnostic, Severity};
    use crate::jvm::code::{
        ConstantData, EqComparison, OrdComparison, SwitchCase, SynLabelGenerator,
    };

    fn insn(instruction: Instruction) -> CodeElement {
        CodeElement::Instruction(instruction)
    }

    fn label(lbl: SynLabel) -> CodeElement {
        CodeElement::Label(lbl)
    }

    /// Straight-line filler that is the specified number of bytes long
    fn filler(len: usize) -> impl Iterator<Item = CodeElement> {
        std::iter::repeat_with(|| insn(Instruction::Nop)).take(len)
    }

    fn resolve(
        elements: Vec<CodeElement>,
        label_generator: &mut SynLabelGenerator,
    ) -> (ResolvedCode, Vec<Diagnostic>) {
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let resolved = resolve_code(
            "test",
            elements,
            &Settings::new(),
            label_generator,
            &mut diagnostics,
        )
        .unwrap();
        (resolved, diagnostics)
    }

    fn instructions(resolved: &ResolvedCode) -> Vec<&Instruction> {
        resolved
            .elements
            .iter()
            .filter_map(|element| match element {
                CodeElement::Instruction(insn) => Some(insn),
                CodeElement::Label(_) => None,
            })
            .collect()
    }

    #[test]
    fn small_test() {
        let point = OffsetRange::exact(40_000);
        assert!(!point.small(0, 0));
        assert!(point.small(10_000, 0));

        let backwards = OffsetRange::exact(0);
        assert!(backwards.small(32_768, 0));
        assert!(!backwards.small(32_769, 0));

        let range = OffsetRange {
            min: 30_000,
            max: 40_000,
        };
        assert!(!range.small(0, 0));
        assert!(range.small(0, 7_233));
        assert!(!range.small(0, 7_232));
        assert!(range.small(7_233, 0));

        assert_eq!(range.resolve(35_000), Some(OffsetRange::exact(35_000)));
        assert_eq!(range.resolve(40_001), None);
    }

    #[test]
    fn short_forward_goto() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let mut elements = vec![insn(Instruction::Goto(l1))];
        elements.extend(filler(97));
        elements.push(label(l1));
        elements.push(insn(Instruction::Return));

        let (resolved, diagnostics) = resolve(elements, &mut gen);
        assert!(diagnostics.is_empty());
        assert_eq!(instructions(&resolved)[0], &Instruction::Goto(l1));
        assert_eq!(resolved.label_offsets[&l1], Offset(100));
        assert_eq!(resolved.code_length, 101);
    }

    #[test]
    fn long_forward_goto_is_widened() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let mut elements = vec![insn(Instruction::Goto(l1))];
        elements.extend(filler(40_000));
        elements.push(label(l1));
        elements.push(insn(Instruction::Return));

        let (resolved, _) = resolve(elements, &mut gen);
        assert_eq!(instructions(&resolved)[0], &Instruction::GotoW(l1));
        assert_eq!(resolved.label_offsets[&l1], Offset(40_005));
        assert_eq!(resolved.code_length, 40_006);
    }

    #[test]
    fn long_backward_jsr_is_widened() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let mut elements = vec![label(l1)];
        elements.extend(filler(32_768));
        elements.push(insn(Instruction::Jsr(l1)));
        elements.push(insn(Instruction::JsrW(l1)));
        elements.extend(filler(10));
        elements.push(insn(Instruction::Jsr(l1)));

        let (resolved, _) = resolve(elements, &mut gen);
        let insns = instructions(&resolved);
        // First `jsr` is exactly at -32768, the second `jsr_w` was narrowed then widened again
        assert_eq!(insns[32_768], &Instruction::Jsr(l1));
        assert_eq!(insns[32_769], &Instruction::JsrW(l1));
        assert_eq!(insns[32_780], &Instruction::JsrW(l1));
    }

    /// `goto` after an earlier `goto` was widened, `distance` bytes from its target if short
    fn goto_after_wide_goto(distance: usize) -> (ResolvedCode, SynLabel) {
        let mut gen = SynLabelGenerator::default();
        let [far, near]: [SynLabel; 2] = [gen.fresh_label(), gen.fresh_label()];
        let mut elements = vec![insn(Instruction::Goto(far)), insn(Instruction::Goto(near))];
        elements.extend(filler(distance - 3));
        elements.push(label(near));
        elements.push(insn(Instruction::Return));
        elements.extend(filler(10));
        elements.push(label(far));
        elements.push(insn(Instruction::Return));

        let (resolved, diagnostics) = resolve(elements, &mut gen);
        assert!(diagnostics.is_empty());
        assert_eq!(instructions(&resolved)[0], &Instruction::GotoW(far));
        (resolved, near)
    }

    #[test]
    fn goto_reaching_exactly_i16_max_stays_short() {
        let (resolved, near) = goto_after_wide_goto(32_767);
        assert_eq!(instructions(&resolved)[1], &Instruction::Goto(near));
        assert_eq!(resolved.label_offsets[&near], Offset(5 + 32_767));
        assert!(resolved.label_ranges[&near].contains(5 + 32_767));
    }

    #[test]
    fn goto_one_byte_past_i16_max_is_widened() {
        let (resolved, near) = goto_after_wide_goto(32_768);
        assert_eq!(instructions(&resolved)[1], &Instruction::GotoW(near));
        assert_eq!(resolved.label_offsets[&near], Offset(5 + 32_770));
    }

    #[test]
    fn oversized_switch_without_narrowing_is_reported() {
        let mut gen = SynLabelGenerator::default();
        let dflt = gen.fresh_label();
        let elements = vec![
            insn(Instruction::IConst0),
            insn(Instruction::TableSwitch {
                default: dflt,
                low: 0,
                high: 20_000,
                cases: vec![],
            }),
            label(dflt),
            insn(Instruction::Return),
        ];

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let resolved = resolve_code(
            "m",
            elements,
            &Settings::verbatim(),
            &mut gen,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(resolved.code_length, 80_021);
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::error(DiagnosticKind::SwitchTooLarge {
                    length: 80_019,
                    max: 65_535,
                }),
                Diagnostic::error(DiagnosticKind::MethodTooLarge {
                    method: String::from("m"),
                    size: 80_022,
                    max: 65_535,
                }),
            ]
        );
    }

    #[test]
    fn far_conditional_branch_gets_trampoline() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let mut elements = vec![
            insn(Instruction::ILoad(0)),
            insn(Instruction::If(OrdComparison::LT, l1)),
        ];
        elements.extend(filler(40_000));
        elements.push(label(l1));
        elements.push(insn(Instruction::Return));

        let (resolved, diagnostics) = resolve(elements, &mut gen);
        assert!(diagnostics.is_empty());

        let skip = match &resolved.elements[1..4] {
            [CodeElement::Instruction(Instruction::If(OrdComparison::GE, skip)), CodeElement::Instruction(Instruction::GotoW(target)), CodeElement::Label(skip2)]
                if *target == l1 && skip == skip2 =>
            {
                *skip
            }
            other => panic!("Unexpected trampoline {:?}", other),
        };
        assert_eq!(resolved.label_offsets[&skip], Offset(9));
        assert_eq!(resolved.label_offsets[&l1], Offset(40_009));
        assert_eq!(resolved.code_length, 40_010);
    }

    #[test]
    fn branch_over_goto_is_folded() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let l2 = gen.fresh_label();
        let elements = vec![
            label(l2),
            insn(Instruction::ALoad(0)),
            insn(Instruction::IfNull(EqComparison::EQ, l1)),
            insn(Instruction::Goto(l2)),
            label(l1),
            insn(Instruction::Return),
        ];

        let (resolved, _) = resolve(elements, &mut gen);
        assert_eq!(
            resolved.elements,
            vec![
                label(l2),
                insn(Instruction::ALoad(0)),
                insn(Instruction::IfNull(EqComparison::NE, l2)),
                label(l1),
                insn(Instruction::Return),
            ]
        );
        assert_eq!(resolved.label_offsets[&l1], Offset(4));
    }

    #[test]
    fn branch_over_goto_to_elsewhere_is_kept() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let l2 = gen.fresh_label();
        let l3 = gen.fresh_label();
        let elements = vec![
            insn(Instruction::ILoad(1)),
            insn(Instruction::ILoad(2)),
            insn(Instruction::IfICmp(OrdComparison::GT, l1)),
            insn(Instruction::Goto(l2)),
            label(l3),
            label(l1),
            label(l2),
            insn(Instruction::Return),
        ];

        let (resolved, _) = resolve(elements.clone(), &mut gen);
        assert_eq!(resolved.elements, elements);

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let mut settings = Settings::new();
        settings.fold_branch_over_goto = false;
        let folded_elements = vec![
            insn(Instruction::If(OrdComparison::EQ, l1)),
            insn(Instruction::Goto(l2)),
            label(l1),
            label(l2),
        ];
        let resolved = resolve_code(
            "test",
            folded_elements.clone(),
            &settings,
            &mut gen,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(resolved.elements, folded_elements);
    }

    #[test]
    fn switches_and_constants_are_narrowed() {
        let mut gen = SynLabelGenerator::default();
        let dflt = gen.fresh_label();
        let a = gen.fresh_label();
        let elements = vec![
            insn(Instruction::LdcW(ConstantData::Integer(2))),
            insn(Instruction::LookupSwitch {
                default: dflt,
                cases: vec![
                    SwitchCase::new(1, a),
                    SwitchCase::new(2, a),
                    SwitchCase::new(3, a),
                    SwitchCase::new(4, dflt),
                ],
            }),
            label(a),
            label(dflt),
            insn(Instruction::Return),
        ];

        let (resolved, _) = resolve(elements, &mut gen);
        assert_eq!(
            instructions(&resolved),
            vec![
                &Instruction::IConst2,
                &Instruction::TableSwitch {
                    default: dflt,
                    low: 1,
                    high: 3,
                    cases: vec![
                        SwitchCase::new(1, a),
                        SwitchCase::new(2, a),
                        SwitchCase::new(3, a),
                    ],
                },
                &Instruction::Return,
            ]
        );
        // `tableswitch` at 1: 1 + 2 (padding) + 12 + 3 * 4
        assert_eq!(resolved.label_offsets[&a], Offset(28));
    }

    #[test]
    fn undefined_and_duplicate_labels() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let l2 = gen.fresh_label();
        let mut diagnostics: Vec<Diagnostic> = vec![];

        let undefined = vec![insn(Instruction::Goto(l1)), label(l2)];
        assert!(matches!(
            resolve_code("m", undefined, &Settings::new(), &mut gen, &mut diagnostics),
            Err(Error::UndefinedLabel(lbl)) if lbl == l1
        ));

        let duplicate = vec![label(l1), insn(Instruction::Nop), label(l1)];
        assert!(matches!(
            resolve_code("m", duplicate, &Settings::new(), &mut gen, &mut diagnostics),
            Err(Error::DuplicateLabel(lbl)) if lbl == l1
        ));
    }

    #[test]
    fn oversized_method_is_reported() {
        let mut gen = SynLabelGenerator::default();
        let l1 = gen.fresh_label();
        let mut settings = Settings::new();
        settings.max_code_length = 100;
        let mut elements = vec![insn(Instruction::Goto(l1))];
        elements.extend(filler(97));
        elements.push(label(l1));

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let resolved =
            resolve_code("big", elements, &settings, &mut gen, &mut diagnostics).unwrap();
        assert_eq!(resolved.code_length, 100);
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                severity: Severity::Error,
                kind: DiagnosticKind::MethodTooLarge {
                    method: String::from("big"),
                    size: 102,
                    max: 100,
                },
            }]
        );
    }

    #[test]
    fn short_jumps_land_in_estimated_ranges() {
        // A chain of forward jumps spanning more and more of the method, with switches mixed in
        // so padding moves around
        let mut gen = SynLabelGenerator::default();
        let targets: Vec<SynLabel> = (0..6).map(|_| gen.fresh_label()).collect();
        let mut elements = vec![];
        for (i, target) in targets.iter().enumerate() {
            elements.push(insn(Instruction::If(OrdComparison::NE, *target)));
            elements.push(insn(Instruction::Goto(*target)));
            elements.push(insn(Instruction::LookupSwitch {
                default: *target,
                cases: vec![SwitchCase::new(i as i32, targets[0])],
            }));
            elements.extend(filler(6_000 * i + 1));
        }
        for target in &targets {
            elements.push(label(*target));
            elements.extend(filler(3));
        }

        let (resolved, _) = resolve(elements, &mut gen);
        let mut offset = 0;
        for element in &resolved.elements {
            match element {
                CodeElement::Label(lbl) => assert_eq!(resolved.label_offsets[lbl], Offset(offset)),
                CodeElement::Instruction(insn) => {
                    if let Some(target) = insn.branch_target() {
                        let distance = resolved.label_offsets[&target] - Offset(offset);
                        match insn {
                            Instruction::GotoW(_) | Instruction::JsrW(_) => (),
                            _ => assert!(
                                (i16::MIN as isize..=i16::MAX as isize).contains(&distance),
                                "Short jump {:?} at {} is too long",
                                insn,
                                offset
                            ),
                        }
                    }
                    offset += size_at(insn, offset).unwrap();
                }
            }
        }
        for (lbl, offset) in &resolved.label_offsets {
            if let Some(range) = resolved.label_ranges.get(lbl) {
                assert!(range.contains(offset.0), "{:?} at {:?} outside {:?}", lbl, offset, range);
            }
        }
        assert_eq!(offset, resolved.code_length);
    }
}
