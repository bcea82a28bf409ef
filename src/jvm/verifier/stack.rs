use super::{LocalVariables, VType, VerificationType};
use crate::jvm::code::{Instruction, InvokeType, SynLabel};
use crate::jvm::{ArrayType, BinaryName, Error, FieldType, RefType, StackErrorKind, TypeKind};
use crate::util::{OffsetVec, Width};

/// Types of the values on the operand stack, along with the deepest the stack has been
///
/// Depths are measured in slots: `long` and `double` take two.
#[derive(Clone, Debug)]
pub struct OperandStack {
    stack: OffsetVec<VType>,

    /// High-water mark of the stack depth
    max_stack: usize,

    /// Class of the method (what `UninitializedThis` becomes after `<init>`)
    this_class: BinaryName,
}

impl OperandStack {
    pub fn new(this_class: BinaryName) -> OperandStack {
        OperandStack {
            stack: OffsetVec::new(),
            max_stack: 0,
            this_class,
        }
    }

    /// Current depth, in slots
    pub fn depth(&self) -> usize {
        self.stack.offset_len().0
    }

    /// Deepest the stack has been since it was created
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Empty the stack (the high-water mark is kept)
    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Types on the stack, from bottom to top
    pub fn snapshot(&self) -> Vec<VType> {
        self.stack.iter().map(|(_, _, vtype)| vtype.clone()).collect()
    }

    /// Seed an empty stack (eg. at a label whose frame was recorded elsewhere)
    ///
    /// `Top` entries are skipped.
    pub fn set(&mut self, types: &[VType]) -> Result<(), Error> {
        if !self.stack.is_empty() {
            return Err(Error::StackError {
                instruction: String::from("set"),
                kind: StackErrorKind::NonEmptyStack,
            });
        }
        for vtype in types {
            if *vtype != VerificationType::Top {
                self.push(vtype.clone());
            }
        }
        Ok(())
    }

    /// Update the stack (and locals) to reflect the effect of an instruction
    ///
    /// `origin` is the label placed immediately before the instruction, if any. A `new` needs one,
    /// since that label is what identifies the uninitialized object it pushes.
    pub fn adjust(
        &mut self,
        insn: &Instruction,
        locals: &mut LocalVariables,
        origin: Option<SynLabel>,
    ) -> Result<(), Error> {
        self.adjust_kind(insn, locals, origin)
            .map_err(|kind| Error::StackError {
                instruction: format!("{:?}", insn),
                kind,
            })
    }

    fn adjust_kind(
        &mut self,
        insn: &Instruction,
        locals: &mut LocalVariables,
        origin: Option<SynLabel>,
    ) -> Result<(), StackErrorKind> {
        use Instruction::*;
        use TypeKind::{Double as D, Float as F, Int as I, Long as L, Reference as A};
        use VerificationType::{Double, Float, Integer, Long, Null, Object};

        match insn {
            Nop => (),
            AConstNull => self.push(Null),
            IConstM1 | IConst0 | IConst1 | IConst2 | IConst3 | IConst4 | IConst5 => {
                self.push(Integer)
            }
            LConst0 | LConst1 => self.push(Long),
            FConst0 | FConst1 | FConst2 => self.push(Float),
            DConst0 | DConst1 => self.push(Double),
            BiPush(_) | SiPush(_) => self.push(Integer),
            Ldc(constant) | LdcW(constant) => {
                if constant.is_wide() {
                    return Err(StackErrorKind::InvalidWidth(2));
                }
                self.push(VType::from(constant));
            }
            Ldc2W(constant) => {
                if !constant.is_wide() {
                    return Err(StackErrorKind::InvalidWidth(1));
                }
                self.push(VType::from(constant));
            }

            ILoad(slot) => self.push(locals.load(*slot, I)?),
            LLoad(slot) => self.push(locals.load(*slot, L)?),
            FLoad(slot) => self.push(locals.load(*slot, F)?),
            DLoad(slot) => self.push(locals.load(*slot, D)?),
            ALoad(slot) => self.push(locals.load(*slot, A)?),

            IALoad | BALoad | CALoad | SALoad => {
                self.pop_expecting(I)?;
                self.pop_expecting(A)?;
                self.push(Integer);
            }
            LALoad => {
                self.pop_expecting(I)?;
                self.pop_expecting(A)?;
                self.push(Long);
            }
            FALoad => {
                self.pop_expecting(I)?;
                self.pop_expecting(A)?;
                self.push(Float);
            }
            DALoad => {
                self.pop_expecting(I)?;
                self.pop_expecting(A)?;
                self.push(Double);
            }
            AALoad => {
                self.pop_expecting(I)?;
                let array_type = self.pop_expecting(A)?;
                self.push(element_type(array_type));
            }

            IStore(slot) => {
                let vtype = self.pop_expecting(I)?;
                locals.store(*slot, vtype)?;
            }
            LStore(slot) => {
                let vtype = self.pop_expecting(L)?;
                locals.store(*slot, vtype)?;
            }
            FStore(slot) => {
                let vtype = self.pop_expecting(F)?;
                locals.store(*slot, vtype)?;
            }
            DStore(slot) => {
                let vtype = self.pop_expecting(D)?;
                locals.store(*slot, vtype)?;
            }
            AStore(slot) => {
                let vtype = self.pop_expecting(A)?;
                locals.store(*slot, vtype)?;
            }

            IAStore | BAStore | CAStore | SAStore => self.pop_array_store(I)?,
            LAStore => self.pop_array_store(L)?,
            FAStore => self.pop_array_store(F)?,
            DAStore => self.pop_array_store(D)?,
            AAStore => self.pop_array_store(A)?,

            Pop => {
                let _ = self.pop_expecting_width(1)?;
            }

            Pop2 => {
                let arg1 = self.pop()?;
                match arg1.width() {
                    // Form 1
                    1 => {
                        let _ = self.pop_expecting_width(1)?;
                    }

                    // Form 2
                    2 => (),

                    other => return Err(StackErrorKind::InvalidWidth(other)),
                }
            }

            Dup => {
                let arg1 = self.pop_expecting_width(1)?;
                self.push(arg1.clone());
                self.push(arg1);
            }

            DupX1 => {
                let arg1 = self.pop_expecting_width(1)?;
                let arg2 = self.pop_expecting_width(1)?;
                self.push(arg1.clone());
                self.push(arg2);
                self.push(arg1);
            }

            DupX2 => {
                let arg1 = self.pop_expecting_width(1)?;
                let arg2 = self.pop()?;
                match arg2.width() {
                    // Form 1
                    1 => {
                        let arg3 = self.pop_expecting_width(1)?;
                        self.push(arg1.clone());
                        self.push(arg3);
                        self.push(arg2);
                        self.push(arg1);
                    }

                    // Form 2
                    2 => {
                        self.push(arg1.clone());
                        self.push(arg2);
                        self.push(arg1);
                    }

                    other => return Err(StackErrorKind::InvalidWidth(other)),
                }
            }

            Dup2 => {
                let arg1 = self.pop()?;
                match arg1.width() {
                    // Form 1
                    1 => {
                        let arg2 = self.pop_expecting_width(1)?;
                        self.push(arg2.clone());
                        self.push(arg1.clone());
                        self.push(arg2);
                        self.push(arg1);
                    }

                    // Form 2
                    2 => {
                        self.push(arg1.clone());
                        self.push(arg1);
                    }

                    other => return Err(StackErrorKind::InvalidWidth(other)),
                }
            }

            Dup2X1 => {
                let arg1 = self.pop()?;
                match arg1.width() {
                    // Form 1
                    1 => {
                        let arg2 = self.pop_expecting_width(1)?;
                        let arg3 = self.pop_expecting_width(1)?;
                        self.push(arg2.clone());
                        self.push(arg1.clone());
                        self.push(arg3);
                        self.push(arg2);
                        self.push(arg1);
                    }

                    // Form 2
                    2 => {
                        let arg2 = self.pop_expecting_width(1)?;
                        self.push(arg1.clone());
                        self.push(arg2);
                        self.push(arg1);
                    }

                    other => return Err(StackErrorKind::InvalidWidth(other)),
                }
            }

            Dup2X2 => {
                let arg1 = self.pop()?;
                match arg1.width() {
                    1 => {
                        let arg2 = self.pop_expecting_width(1)?;
                        let arg3 = self.pop()?;
                        match arg3.width() {
                            // Form 1
                            1 => {
                                let arg4 = self.pop_expecting_width(1)?;
                                self.push(arg2.clone());
                                self.push(arg1.clone());
                                self.push(arg4);
                                self.push(arg3);
                                self.push(arg2);
                                self.push(arg1);
                            }

                            // Form 3
                            2 => {
                                self.push(arg2.clone());
                                self.push(arg1.clone());
                                self.push(arg3);
                                self.push(arg2);
                                self.push(arg1);
                            }

                            other => return Err(StackErrorKind::InvalidWidth(other)),
                        }
                    }

                    2 => {
                        let arg2 = self.pop()?;
                        match arg2.width() {
                            // Form 2
                            1 => {
                                let arg3 = self.pop_expecting_width(1)?;
                                self.push(arg1.clone());
                                self.push(arg3);
                                self.push(arg2);
                                self.push(arg1);
                            }

                            // Form 4
                            2 => {
                                self.push(arg1.clone());
                                self.push(arg2);
                                self.push(arg1);
                            }

                            other => return Err(StackErrorKind::InvalidWidth(other)),
                        }
                    }

                    other => return Err(StackErrorKind::InvalidWidth(other)),
                }
            }

            Swap => {
                let arg1 = self.pop_expecting_width(1)?;
                let arg2 = self.pop_expecting_width(1)?;
                self.push(arg1);
                self.push(arg2);
            }

            IAdd | ISub | IDiv | IMul | IRem | IAnd | IOr | IXor | ISh(_) => {
                self.pop_expecting(I)?;
                self.pop_expecting(I)?;
                self.push(Integer);
            }
            LAdd | LSub | LDiv | LMul | LRem | LAnd | LOr | LXor => {
                self.pop_expecting(L)?;
                self.pop_expecting(L)?;
                self.push(Long);
            }
            FAdd | FSub | FDiv | FMul | FRem => {
                self.pop_expecting(F)?;
                self.pop_expecting(F)?;
                self.push(Float);
            }
            DAdd | DSub | DDiv | DMul | DRem => {
                self.pop_expecting(D)?;
                self.pop_expecting(D)?;
                self.push(Double);
            }
            LSh(_) => {
                self.pop_expecting(I)?;
                self.pop_expecting(L)?;
                self.push(Long);
            }

            INeg | I2B | I2C | I2S => {
                self.pop_expecting(I)?;
                self.push(Integer);
            }
            LNeg => {
                self.pop_expecting(L)?;
                self.push(Long);
            }
            FNeg => {
                self.pop_expecting(F)?;
                self.push(Float);
            }
            DNeg => {
                self.pop_expecting(D)?;
                self.push(Double);
            }

            IInc(slot, _) => {
                locals.load(*slot, I)?;
            }

            I2L => self.convert(I, Long)?,
            I2F => self.convert(I, Float)?,
            I2D => self.convert(I, Double)?,
            L2I => self.convert(L, Integer)?,
            L2F => self.convert(L, Float)?,
            L2D => self.convert(L, Double)?,
            F2I => self.convert(F, Integer)?,
            F2L => self.convert(F, Long)?,
            F2D => self.convert(F, Double)?,
            D2I => self.convert(D, Integer)?,
            D2L => self.convert(D, Long)?,
            D2F => self.convert(D, Float)?,

            LCmp => {
                self.pop_expecting(L)?;
                self.pop_expecting(L)?;
                self.push(Integer);
            }
            FCmp(_) => {
                self.pop_expecting(F)?;
                self.pop_expecting(F)?;
                self.push(Integer);
            }
            DCmp(_) => {
                self.pop_expecting(D)?;
                self.pop_expecting(D)?;
                self.push(Integer);
            }

            If(_, _) => {
                self.pop_expecting(I)?;
            }
            IfICmp(_, _) => {
                self.pop_expecting(I)?;
                self.pop_expecting(I)?;
            }
            IfACmp(_, _) => {
                self.pop_expecting(A)?;
                self.pop_expecting(A)?;
            }
            IfNull(_, _) => {
                self.pop_expecting(A)?;
            }
            Goto(_) | GotoW(_) => (),

            // The return address only exists while jumping to the subroutine
            Jsr(_) | JsrW(_) => {
                self.push(Null);
                self.pop()?;
            }
            Ret(_) => (),

            TableSwitch { .. } | LookupSwitch { .. } => {
                self.pop_expecting(I)?;
            }

            IReturn => {
                self.pop_expecting(I)?;
            }
            LReturn => {
                self.pop_expecting(L)?;
            }
            FReturn => {
                self.pop_expecting(F)?;
            }
            DReturn => {
                self.pop_expecting(D)?;
            }
            AReturn | AThrow | MonitorEnter | MonitorExit => {
                self.pop_expecting(A)?;
            }
            Return => (),

            GetStatic(field) => self.push(VType::from(field.descriptor.clone())),
            PutStatic(field) => {
                self.pop_field_type(&field.descriptor)?;
            }
            GetField(field) => {
                self.pop_expecting(A)?;
                self.push(VType::from(field.descriptor.clone()));
            }
            PutField(field) => {
                self.pop_field_type(&field.descriptor)?;
                self.pop_expecting(A)?;
            }

            Invoke(invoke_type, method) => {
                for parameter in method.descriptor.parameters.iter().rev() {
                    self.pop_field_type(parameter)?;
                }

                if *invoke_type != InvokeType::Static {
                    let receiver = self.pop_expecting(A)?;
                    if *invoke_type == InvokeType::Special && method.name.is_init() {
                        let initialized = match receiver {
                            VerificationType::UninitializedThis => {
                                Object(RefType::Object(self.this_class.clone()))
                            }
                            VerificationType::Uninitialized(_) => Object(method.class.clone()),
                            found => {
                                return Err(StackErrorKind::InvalidType {
                                    expected: A,
                                    found,
                                })
                            }
                        };
                        let replace = |vtype: &VType| {
                            if *vtype == receiver {
                                Some(initialized.clone())
                            } else {
                                None
                            }
                        };
                        self.stack.replace_all(replace);
                        locals.replace_all(replace);
                    }
                }

                if let Some(return_type) = &method.descriptor.return_type {
                    self.push(VType::from(return_type.clone()));
                }
            }

            InvokeDynamic(call_site) => {
                for parameter in call_site.descriptor.parameters.iter().rev() {
                    self.pop_field_type(parameter)?;
                }
                if let Some(return_type) = &call_site.descriptor.return_type {
                    self.push(VType::from(return_type.clone()));
                }
            }

            New(_) => {
                let label = origin.ok_or(StackErrorKind::MissingNewLabel)?;
                self.push(VerificationType::Uninitialized(label));
            }
            NewArray(base_type) => {
                self.pop_expecting(I)?;
                self.push(Object(RefType::array(FieldType::Base(*base_type))));
            }
            ANewArray(ref_type) => {
                self.pop_expecting(I)?;
                self.push(Object(RefType::array(FieldType::Ref(ref_type.clone()))));
            }
            MultiANewArray(ref_type, dimensions) => {
                for _ in 0..*dimensions {
                    self.pop_expecting(I)?;
                }
                self.push(Object(ref_type.clone()));
            }
            ArrayLength => {
                self.pop_expecting(A)?;
                self.push(Integer);
            }

            CheckCast(ref_type) => {
                self.pop_expecting(A)?;
                self.push(Object(ref_type.clone()));
            }
            InstanceOf(_) => {
                self.pop_expecting(A)?;
                self.push(Integer);
            }
        }

        Ok(())
    }

    fn push(&mut self, vtype: VType) {
        self.stack.push(vtype);
        self.max_stack = self.max_stack.max(self.depth());
    }

    fn pop(&mut self) -> Result<VType, StackErrorKind> {
        self.stack
            .pop()
            .map(|(_, _, typ)| typ)
            .ok_or(StackErrorKind::EmptyStack)
    }

    fn pop_expecting_width(&mut self, expected_width: usize) -> Result<VType, StackErrorKind> {
        let typ = self.pop()?;
        let found_width = typ.width();
        if found_width == expected_width {
            Ok(typ)
        } else {
            Err(StackErrorKind::InvalidWidth(found_width))
        }
    }

    fn pop_expecting(&mut self, expected: TypeKind) -> Result<VType, StackErrorKind> {
        let typ = self.pop()?;
        if typ.kind() == Some(expected) {
            Ok(typ)
        } else {
            Err(StackErrorKind::InvalidType {
                expected,
                found: typ,
            })
        }
    }

    fn pop_field_type(&mut self, field_type: &FieldType) -> Result<VType, StackErrorKind> {
        let expected = VType::from(field_type.clone())
            .kind()
            .unwrap_or(TypeKind::Reference);
        self.pop_expecting(expected)
    }

    fn pop_array_store(&mut self, element: TypeKind) -> Result<(), StackErrorKind> {
        self.pop_expecting(element)?;
        self.pop_expecting(TypeKind::Int)?;
        self.pop_expecting(TypeKind::Reference)?;
        Ok(())
    }

    fn convert(&mut self, from: TypeKind, to: VType) -> Result<(), StackErrorKind> {
        self.pop_expecting(from)?;
        self.push(to);
        Ok(())
    }
}

/// Type of the elements of an array pulled out by `aaload`
fn element_type(array_type: VType) -> VType {
    match array_type {
        VerificationType::Object(RefType::ObjectArray(arr)) => {
            match arr.additional_dimensions {
                0 => VerificationType::Object(RefType::Object(arr.element_type)),
                n => VerificationType::Object(RefType::ObjectArray(ArrayType {
                    additional_dimensions: n - 1,
                    ..arr
                })),
            }
        }
        VerificationType::Object(RefType::PrimitiveArray(arr)) if arr.additional_dimensions > 0 => {
            VerificationType::Object(RefType::PrimitiveArray(ArrayType {
                additional_dimensions: arr.additional_dimensions - 1,
                ..arr
            }))
        }
        VerificationType::Null => VerificationType::Null,
        _ => VerificationType::Object(RefType::Object(BinaryName::OBJECT)),
    }
}
