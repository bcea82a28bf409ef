use super::sizes::{size_at, switch_padding, SizeError};
use super::{
    CodeElement, ConstantData, FieldRef, Instruction, InvokeDynamicRef, InvokeType, MethodRef,
    OperandShape, ResolvedCode, SwitchCase, SynLabel,
};
use crate::jvm::{Error, RefType, Serialize};
use byteorder::WriteBytesExt;
use std::collections::HashMap;

/// Constant pool of the class the method is in
///
/// Every call returns the index of an entry for the argument, adding one if needed.
pub trait ConstantPool {
    /// Loadable constant (for `ldc`, `ldc_w`, and `ldc2_w`)
    fn constant_index(&mut self, constant: &ConstantData) -> Result<u16, Error>;

    /// `CONSTANT_Class`
    fn class_index(&mut self, class: &RefType) -> Result<u16, Error>;

    /// `CONSTANT_Fieldref`
    fn field_index(&mut self, field: &FieldRef) -> Result<u16, Error>;

    /// `CONSTANT_Methodref` or `CONSTANT_InterfaceMethodref`
    fn method_index(&mut self, method: &MethodRef) -> Result<u16, Error>;

    /// `CONSTANT_InvokeDynamic`
    fn invoke_dynamic_index(&mut self, call_site: &InvokeDynamicRef) -> Result<u16, Error>;
}

impl ResolvedCode {
    /// Write out the code array
    pub fn serialize_code(&self, constants: &mut impl ConstantPool) -> Result<Vec<u8>, Error> {
        let mut code: Vec<u8> = Vec::with_capacity(self.code_length);
        for element in &self.elements {
            if let CodeElement::Instruction(insn) = element {
                let offset = code.len();
                self.serialize_instruction(insn, offset, constants, &mut code)?;
            }
        }
        Ok(code)
    }

    fn serialize_instruction<W: WriteBytesExt>(
        &self,
        insn: &Instruction,
        offset: usize,
        constants: &mut impl ConstantPool,
        writer: &mut W,
    ) -> Result<(), Error> {
        if let Err(SizeError::TooLarge { length }) = size_at(insn, offset) {
            return Err(Error::SwitchTooLarge { offset, length });
        }

        let opcode = insn.opcode();
        match insn {
            Instruction::ILoad(slot)
            | Instruction::LLoad(slot)
            | Instruction::FLoad(slot)
            | Instruction::DLoad(slot)
            | Instruction::ALoad(slot)
            | Instruction::IStore(slot)
            | Instruction::LStore(slot)
            | Instruction::FStore(slot)
            | Instruction::DStore(slot)
            | Instruction::AStore(slot)
            | Instruction::Ret(slot) => {
                if insn.is_wide() {
                    WIDE.serialize(writer)?;
                    opcode.code().serialize(writer)?;
                    slot.serialize(writer)?;
                } else {
                    opcode.code().serialize(writer)?;
                    if opcode.operand() == OperandShape::LocalSlot {
                        (*slot as u8).serialize(writer)?;
                    }
                }
            }
            Instruction::IInc(slot, increment) => {
                if insn.is_wide() {
                    WIDE.serialize(writer)?;
                    opcode.code().serialize(writer)?;
                    slot.serialize(writer)?;
                    increment.serialize(writer)?;
                } else {
                    opcode.code().serialize(writer)?;
                    (*slot as u8).serialize(writer)?;
                    (*increment as i8).serialize(writer)?;
                }
            }
            Instruction::BiPush(value) => {
                opcode.code().serialize(writer)?;
                value.serialize(writer)?;
            }
            Instruction::SiPush(value) => {
                opcode.code().serialize(writer)?;
                value.serialize(writer)?;
            }
            Instruction::Ldc(constant) => {
                let index = constants.constant_index(constant)?;
                let index = u8::try_from(index).map_err(|_| Error::ConstantIndexOverflow(index))?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
            }
            Instruction::LdcW(constant) | Instruction::Ldc2W(constant) => {
                let index = constants.constant_index(constant)?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
            }
            Instruction::If(_, target)
            | Instruction::IfICmp(_, target)
            | Instruction::IfACmp(_, target)
            | Instruction::IfNull(_, target)
            | Instruction::Goto(target)
            | Instruction::Jsr(target) => {
                let relative = self.relative_offset(*target, offset)?;
                let relative = i16::try_from(relative).map_err(|_| Error::BranchOffsetOverflow {
                    label: *target,
                    from: offset,
                    to: (offset as i64 + relative) as usize,
                })?;
                opcode.code().serialize(writer)?;
                relative.serialize(writer)?;
            }
            Instruction::GotoW(target) | Instruction::JsrW(target) => {
                let relative = self.wide_relative_offset(*target, offset)?;
                opcode.code().serialize(writer)?;
                relative.serialize(writer)?;
            }
            Instruction::TableSwitch {
                default,
                low,
                high,
                cases,
            } => {
                opcode.code().serialize(writer)?;
                for _ in 0..switch_padding(offset) {
                    0u8.serialize(writer)?;
                }
                self.wide_relative_offset(*default, offset)?.serialize(writer)?;
                low.serialize(writer)?;
                high.serialize(writer)?;

                let targets: HashMap<i32, SynLabel> =
                    cases.iter().map(|case| (case.key, case.target)).collect();
                for key in *low as i64..=*high as i64 {
                    let target = targets.get(&(key as i32)).unwrap_or(default);
                    self.wide_relative_offset(*target, offset)?.serialize(writer)?;
                }
            }
            Instruction::LookupSwitch { default, cases } => {
                opcode.code().serialize(writer)?;
                for _ in 0..switch_padding(offset) {
                    0u8.serialize(writer)?;
                }
                self.wide_relative_offset(*default, offset)?.serialize(writer)?;
                (cases.len() as i32).serialize(writer)?;

                // The JVM binary searches the keys, so they must be sorted
                let mut cases: Vec<SwitchCase> = cases.clone();
                cases.sort_by_key(|case| case.key);
                for case in cases {
                    case.key.serialize(writer)?;
                    self.wide_relative_offset(case.target, offset)?.serialize(writer)?;
                }
            }
            Instruction::GetStatic(field)
            | Instruction::PutStatic(field)
            | Instruction::GetField(field)
            | Instruction::PutField(field) => {
                let index = constants.field_index(field)?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
            }
            Instruction::Invoke(invoke_type, method) => {
                let index = constants.method_index(method)?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
                if let InvokeType::Interface = invoke_type {
                    let count = method.descriptor.parameter_length(true);
                    (count as u8).serialize(writer)?;
                    0u8.serialize(writer)?;
                }
            }
            Instruction::InvokeDynamic(call_site) => {
                let index = constants.invoke_dynamic_index(call_site)?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
                0u16.serialize(writer)?;
            }
            Instruction::New(class) => {
                let index = constants.class_index(&RefType::Object(class.clone()))?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
            }
            Instruction::NewArray(element_type) => {
                opcode.code().serialize(writer)?;
                element_type.array_type_code().serialize(writer)?;
            }
            Instruction::ANewArray(class)
            | Instruction::CheckCast(class)
            | Instruction::InstanceOf(class) => {
                let index = constants.class_index(class)?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
            }
            Instruction::MultiANewArray(class, dimensions) => {
                let index = constants.class_index(class)?;
                opcode.code().serialize(writer)?;
                index.serialize(writer)?;
                dimensions.serialize(writer)?;
            }
            _ => opcode.code().serialize(writer)?,
        }
        Ok(())
    }

    fn relative_offset(&self, target: SynLabel, from: usize) -> Result<i64, Error> {
        self.label_offsets
            .get(&target)
            .map(|to| to.0 as i64 - from as i64)
            .ok_or(Error::UndefinedLabel(target))
    }

    fn wide_relative_offset(&self, target: SynLabel, from: usize) -> Result<i32, Error> {
        let relative = self.relative_offset(target, from)?;
        i32::try_from(relative).map_err(|_| Error::BranchOffsetOverflow {
            label: target,
            from,
            to: (from as i64 + relative) as usize,
        })
    }
}

/// Prefix for instructions with 16-bit local variable indices
const WIDE: u8 = 0xc4;

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::jvm::code::{
        resolve_code, EqComparison, LabelGenerator, OrdComparison, SynLabelGenerator,
    };
    use crate::jvm::{
        BaseType, BinaryName, FieldType, MethodDescriptor, Name, ParseDescriptor, UnqualifiedName,
    };
    use crate::settings::Settings;

    /// Hands out indices in the order entries are requested, starting at 1
    #[derive(Default)]
    struct FakePool {
        entries: Vec<String>,
    }

    impl FakePool {
        fn index(&mut self, key: String) -> Result<u16, Error> {
            let position = match self.entries.iter().position(|entry| *entry == key) {
                Some(position) => position,
                None => {
                    self.entries.push(key);
                    self.entries.len() - 1
                }
            };
            Ok(position as u16 + 1)
        }
    }

    impl ConstantPool for FakePool {
        fn constant_index(&mut self, constant: &ConstantData) -> Result<u16, Error> {
            self.index(format!("{:?}", constant))
        }

        fn class_index(&mut self, class: &RefType) -> Result<u16, Error> {
            self.index(format!("{:?}", class))
        }

        fn field_index(&mut self, field: &FieldRef) -> Result<u16, Error> {
            self.index(format!("{:?}", field))
        }

        fn method_index(&mut self, method: &MethodRef) -> Result<u16, Error> {
            self.index(format!("{:?}", method))
        }

        fn invoke_dynamic_index(&mut self, call_site: &InvokeDynamicRef) -> Result<u16, Error> {
            self.index(format!("{:?}", call_site))
        }
    }

    fn assemble(elements: Vec<CodeElement>, settings: &Settings) -> Vec<u8> {
        let mut gen = SynLabelGenerator::new(SynLabel::START.next().next().next().next());
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let resolved =
            resolve_code("test", elements, settings, &mut gen, &mut diagnostics).unwrap();
        assert_eq!(diagnostics, vec![]);
        let code = resolved.serialize_code(&mut FakePool::default()).unwrap();
        assert_eq!(code.len(), resolved.code_length);
        code
    }

    fn insn(instruction: Instruction) -> CodeElement {
        CodeElement::Instruction(instruction)
    }

    #[test]
    fn locals() {
        let code = assemble(
            vec![
                insn(Instruction::ILoad(0)),
                insn(Instruction::ALoad(3)),
                insn(Instruction::LLoad(4)),
                insn(Instruction::DStore(300)),
                insn(Instruction::IInc(2, -1)),
                insn(Instruction::IInc(2, 1000)),
                insn(Instruction::Ret(7)),
            ],
            &Settings::new(),
        );
        assert_eq!(
            code,
            vec![
                0x1a, // iload_0
                0x2d, // aload_3
                0x16, 4, // lload 4
                0xc4, 0x39, 0x01, 0x2c, // wide dstore 300
                0x84, 2, 0xff, // iinc 2 -1
                0xc4, 0x84, 0, 2, 0x03, 0xe8, // wide iinc 2 1000
                0xa9, 7, // ret 7
            ]
        );
    }

    #[test]
    fn branches() {
        let mut gen = SynLabelGenerator::default();
        let l0 = gen.fresh_label();
        let l1 = gen.fresh_label();
        let code = assemble(
            vec![
                CodeElement::Label(l0),
                insn(Instruction::ALoad(0)),
                insn(Instruction::IfNull(EqComparison::NE, l1)),
                insn(Instruction::Goto(l0)),
                CodeElement::Label(l1),
                insn(Instruction::GotoW(l0)),
            ],
            &Settings::verbatim(),
        );
        assert_eq!(
            code,
            vec![
                0x2a, // aload_0
                0xc7, 0, 6, // ifnonnull +6
                0xa7, 0xff, 0xfc, // goto -4
                0xa7, 0xff, 0xf9, // goto -7 (narrowed from goto_w)
            ]
        );
    }

    #[test]
    fn switches() {
        let mut gen = SynLabelGenerator::default();
        let dflt = gen.fresh_label();
        let a = gen.fresh_label();
        let code = assemble(
            vec![
                insn(Instruction::ILoad(1)),
                insn(Instruction::TableSwitch {
                    default: dflt,
                    low: 0,
                    high: 2,
                    cases: vec![SwitchCase::new(0, a), SwitchCase::new(2, a)],
                }),
                insn(Instruction::LookupSwitch {
                    default: dflt,
                    cases: vec![SwitchCase::new(9, a), SwitchCase::new(-3, dflt)],
                }),
                CodeElement::Label(a),
                CodeElement::Label(dflt),
            ],
            &Settings::verbatim(),
        );
        #[rustfmt::skip]
        let expected = vec![
            0x1b, // iload_1
            0xaa, 0, 0, // tableswitch (2 bytes of padding)
            0, 0, 0, 55, // default
            0, 0, 0, 0, // low
            0, 0, 0, 2, // high
            0, 0, 0, 55, // 0
            0, 0, 0, 55, // 1
            0, 0, 0, 55, // 2
            0xab, 0, 0, 0, // lookupswitch (3 bytes of padding)
            0, 0, 0, 28, // default
            0, 0, 0, 2, // npairs
            0xff, 0xff, 0xff, 0xfd, 0, 0, 0, 28, // -3
            0, 0, 0, 9, 0, 0, 0, 28, // 9
        ];
        assert_eq!(code, expected);
    }

    #[test]
    fn member_references() {
        let object = BinaryName::OBJECT;
        let runnable = BinaryName::from_str("java/lang/Runnable").unwrap();
        let run = MethodRef {
            class: RefType::Object(runnable),
            name: UnqualifiedName::from_str("run").unwrap(),
            descriptor: MethodDescriptor::parse("(JI)V").unwrap(),
            is_interface: true,
        };
        let field = FieldRef {
            class: object.clone(),
            name: UnqualifiedName::from_str("count").unwrap(),
            descriptor: FieldType::int(),
        };
        let code = assemble(
            vec![
                insn(Instruction::New(object.clone())),
                insn(Instruction::Invoke(InvokeType::Interface, run)),
                insn(Instruction::GetStatic(field)),
                insn(Instruction::NewArray(BaseType::Long)),
                insn(Instruction::MultiANewArray(
                    RefType::array(FieldType::array(FieldType::object(object.clone()))),
                    2,
                )),
                insn(Instruction::CheckCast(RefType::Object(object))),
                insn(Instruction::Ldc(ConstantData::String(String::from("hi")))),
            ],
            &Settings::new(),
        );
        assert_eq!(
            code,
            vec![
                0xbb, 0, 1, // new #1
                0xb9, 0, 2, 4, 0, // invokeinterface #2 count 4
                0xb2, 0, 3, // getstatic #3
                0xbc, 11, // newarray long
                0xc5, 0, 4, 2, // multianewarray #4 2
                0xc0, 0, 1, // checkcast #1
                0x12, 5, // ldc #5
            ]
        );
    }

    #[test]
    fn ldc_index_must_fit_in_a_byte() {
        let mut pool = FakePool::default();
        for i in 0..300 {
            pool.index(format!("filler {}", i)).unwrap();
        }
        let mut gen = SynLabelGenerator::default();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        let resolved = resolve_code(
            "test",
            vec![insn(Instruction::Ldc(ConstantData::Integer(1_000_000)))],
            &Settings::new(),
            &mut gen,
            &mut diagnostics,
        )
        .unwrap();
        assert!(matches!(
            resolved.serialize_code(&mut pool),
            Err(Error::ConstantIndexOverflow(301))
        ));
    }

    #[test]
    fn oversized_switches_are_not_written() {
        let mut gen = SynLabelGenerator::default();
        let dflt = gen.fresh_label();
        for (low, high) in [(0, 20_000), (i32::MIN, i32::MAX)] {
            let mut diagnostics: Vec<Diagnostic> = vec![];
            let resolved = resolve_code(
                "test",
                vec![
                    insn(Instruction::IConst0),
                    insn(Instruction::TableSwitch {
                        default: dflt,
                        low,
                        high,
                        cases: vec![],
                    }),
                    CodeElement::Label(dflt),
                ],
                &Settings::verbatim(),
                &mut gen,
                &mut diagnostics,
            )
            .unwrap();
            assert!(!diagnostics.is_empty());
            assert!(matches!(
                resolved.serialize_code(&mut FakePool::default()),
                Err(Error::SwitchTooLarge { offset: 1, .. })
            ));
        }
    }

    #[test]
    fn trampolines_serialize() {
        let mut gen = SynLabelGenerator::default();
        let far = gen.fresh_label();
        let mut elements = vec![
            insn(Instruction::ILoad(0)),
            insn(Instruction::ILoad(1)),
            insn(Instruction::IfICmp(OrdComparison::LE, far)),
        ];
        elements.extend(std::iter::repeat_with(|| insn(Instruction::Nop)).take(33_000));
        elements.push(CodeElement::Label(far));
        let code = assemble(elements, &Settings::new());
        assert_eq!(
            &code[..10],
            &[
                0x1a, 0x1b, // iload_0, iload_1
                0xa3, 0, 8, // if_icmpgt +8
                0xc8, 0, 0, 0x80, 0xed, // goto_w +33005
            ]
        );
        assert_eq!(code.len(), 10 + 33_000);
    }
}
