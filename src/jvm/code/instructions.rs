//! Abstract bytecode instructions
//!
//! The representation is slightly more abstract than the raw bytecode, to make it convenient for
//! a front-end to produce and for the optimizers to rewrite:
//!
//!   - The `wide` prefix and the `_0` to `_3` short forms don't show up. Local variable
//!     instructions just carry the slot, and the encoding is picked from that.
//!
//!   - Branches are grouped by what they compare, with the comparison as a field. This makes
//!     negating a branch condition a matter of flipping that field.
//!
//!   - Member and constant references are symbolic. Turning them into constant pool indices is
//!     left to a [`super::ConstantPool`] supplied when the code array is written out.

use super::{Opcode, SynLabel};
use crate::jvm::{BaseType, BinaryName, FieldType, MethodDescriptor, RefType, UnqualifiedName};
use std::ops::Not;

/// JVM bytecode instruction
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Nop,
    AConstNull,
    IConstM1,
    IConst0,
    IConst1,
    IConst2,
    IConst3,
    IConst4,
    IConst5,
    LConst0,
    LConst1,
    FConst0,
    FConst1,
    FConst2,
    DConst0,
    DConst1,
    BiPush(i8),
    SiPush(i16),
    Ldc(ConstantData),
    LdcW(ConstantData),
    Ldc2W(ConstantData),
    ILoad(u16), // covers `iload`, `iload_{0,3}`, and `wide iload`
    LLoad(u16),
    FLoad(u16),
    DLoad(u16),
    ALoad(u16),
    IALoad,
    LALoad,
    FALoad,
    DALoad,
    AALoad,
    BALoad,
    CALoad,
    SALoad,
    IStore(u16), // covers `istore`, `istore_{0,3}`, and `wide istore`
    LStore(u16),
    FStore(u16),
    DStore(u16),
    AStore(u16),
    IAStore,
    LAStore,
    FAStore,
    DAStore,
    AAStore,
    BAStore,
    CAStore,
    SAStore,
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    IAdd,
    LAdd,
    FAdd,
    DAdd,
    ISub,
    LSub,
    FSub,
    DSub,
    IMul,
    LMul,
    FMul,
    DMul,
    IDiv,
    LDiv,
    FDiv,
    DDiv,
    IRem,
    LRem,
    FRem,
    DRem,
    INeg,
    LNeg,
    FNeg,
    DNeg,
    ISh(ShiftType), // covers `ishl`, `ishr`, and `iushr`
    LSh(ShiftType), // covers `lshl`, `lshr`, and `lushr`
    IAnd,
    LAnd,
    IOr,
    LOr,
    IXor,
    LXor,
    IInc(u16, i16), // covers `iinc` and `wide iinc`
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    LCmp,
    FCmp(CompareMode), // covers `fcmpl` and `fcmpg`
    DCmp(CompareMode), // covers `dcmpl` and `dcmpg`
    If(OrdComparison, SynLabel),
    IfICmp(OrdComparison, SynLabel),
    IfACmp(EqComparison, SynLabel),
    Goto(SynLabel),
    Jsr(SynLabel),
    Ret(u16), // covers `ret` and `wide ret`
    TableSwitch {
        default: SynLabel,
        low: i32,
        high: i32,

        /// Keys in `low..=high` which have no case jump to `default`
        cases: Vec<SwitchCase>,
    },
    LookupSwitch {
        default: SynLabel,
        cases: Vec<SwitchCase>,
    },
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,
    GetStatic(FieldRef),
    PutStatic(FieldRef),
    GetField(FieldRef),
    PutField(FieldRef),
    Invoke(InvokeType, MethodRef),
    InvokeDynamic(InvokeDynamicRef),
    New(BinaryName),
    NewArray(BaseType),
    ANewArray(RefType),
    ArrayLength,
    AThrow,
    CheckCast(RefType),
    InstanceOf(RefType),
    MonitorEnter,
    MonitorExit,
    MultiANewArray(RefType, u8),
    IfNull(EqComparison, SynLabel), // covers `ifnull` and `ifnonnull`
    GotoW(SynLabel),
    JsrW(SynLabel),
}

impl Instruction {
    /// Opcode this instruction will be encoded with
    ///
    /// For instructions that need the `wide` prefix, this is the opcode following the prefix.
    pub fn opcode(&self) -> Opcode {
        use Instruction::*;

        fn local(slot: u16, short_forms: [Opcode; 4], long_form: Opcode) -> Opcode {
            match slot {
                0..=3 => short_forms[slot as usize],
                _ => long_form,
            }
        }

        match self {
            Nop => Opcode::Nop,
            AConstNull => Opcode::AConstNull,
            IConstM1 => Opcode::IConstM1,
            IConst0 => Opcode::IConst0,
            IConst1 => Opcode::IConst1,
            IConst2 => Opcode::IConst2,
            IConst3 => Opcode::IConst3,
            IConst4 => Opcode::IConst4,
            IConst5 => Opcode::IConst5,
            LConst0 => Opcode::LConst0,
            LConst1 => Opcode::LConst1,
            FConst0 => Opcode::FConst0,
            FConst1 => Opcode::FConst1,
            FConst2 => Opcode::FConst2,
            DConst0 => Opcode::DConst0,
            DConst1 => Opcode::DConst1,
            BiPush(_) => Opcode::BiPush,
            SiPush(_) => Opcode::SiPush,
            Ldc(_) => Opcode::Ldc,
            LdcW(_) => Opcode::LdcW,
            Ldc2W(_) => Opcode::Ldc2W,
            ILoad(slot) => local(*slot, [Opcode::ILoad0, Opcode::ILoad1, Opcode::ILoad2, Opcode::ILoad3], Opcode::ILoad),
            LLoad(slot) => local(*slot, [Opcode::LLoad0, Opcode::LLoad1, Opcode::LLoad2, Opcode::LLoad3], Opcode::LLoad),
            FLoad(slot) => local(*slot, [Opcode::FLoad0, Opcode::FLoad1, Opcode::FLoad2, Opcode::FLoad3], Opcode::FLoad),
            DLoad(slot) => local(*slot, [Opcode::DLoad0, Opcode::DLoad1, Opcode::DLoad2, Opcode::DLoad3], Opcode::DLoad),
            ALoad(slot) => local(*slot, [Opcode::ALoad0, Opcode::ALoad1, Opcode::ALoad2, Opcode::ALoad3], Opcode::ALoad),
            IALoad => Opcode::IALoad,
            LALoad => Opcode::LALoad,
            FALoad => Opcode::FALoad,
            DALoad => Opcode::DALoad,
            AALoad => Opcode::AALoad,
            BALoad => Opcode::BALoad,
            CALoad => Opcode::CALoad,
            SALoad => Opcode::SALoad,
            IStore(slot) => local(*slot, [Opcode::IStore0, Opcode::IStore1, Opcode::IStore2, Opcode::IStore3], Opcode::IStore),
            LStore(slot) => local(*slot, [Opcode::LStore0, Opcode::LStore1, Opcode::LStore2, Opcode::LStore3], Opcode::LStore),
            FStore(slot) => local(*slot, [Opcode::FStore0, Opcode::FStore1, Opcode::FStore2, Opcode::FStore3], Opcode::FStore),
            DStore(slot) => local(*slot, [Opcode::DStore0, Opcode::DStore1, Opcode::DStore2, Opcode::DStore3], Opcode::DStore),
            AStore(slot) => local(*slot, [Opcode::AStore0, Opcode::AStore1, Opcode::AStore2, Opcode::AStore3], Opcode::AStore),
            IAStore => Opcode::IAStore,
            LAStore => Opcode::LAStore,
            FAStore => Opcode::FAStore,
            DAStore => Opcode::DAStore,
            AAStore => Opcode::AAStore,
            BAStore => Opcode::BAStore,
            CAStore => Opcode::CAStore,
            SAStore => Opcode::SAStore,
            Pop => Opcode::Pop,
            Pop2 => Opcode::Pop2,
            Dup => Opcode::Dup,
            DupX1 => Opcode::DupX1,
            DupX2 => Opcode::DupX2,
            Dup2 => Opcode::Dup2,
            Dup2X1 => Opcode::Dup2X1,
            Dup2X2 => Opcode::Dup2X2,
            Swap => Opcode::Swap,
            IAdd => Opcode::IAdd,
            LAdd => Opcode::LAdd,
            FAdd => Opcode::FAdd,
            DAdd => Opcode::DAdd,
            ISub => Opcode::ISub,
            LSub => Opcode::LSub,
            FSub => Opcode::FSub,
            DSub => Opcode::DSub,
            IMul => Opcode::IMul,
            LMul => Opcode::LMul,
            FMul => Opcode::FMul,
            DMul => Opcode::DMul,
            IDiv => Opcode::IDiv,
            LDiv => Opcode::LDiv,
            FDiv => Opcode::FDiv,
            DDiv => Opcode::DDiv,
            IRem => Opcode::IRem,
            LRem => Opcode::LRem,
            FRem => Opcode::FRem,
            DRem => Opcode::DRem,
            INeg => Opcode::INeg,
            LNeg => Opcode::LNeg,
            FNeg => Opcode::FNeg,
            DNeg => Opcode::DNeg,
            ISh(ShiftType::Left) => Opcode::IShl,
            ISh(ShiftType::ArithmeticRight) => Opcode::IShr,
            ISh(ShiftType::LogicalRight) => Opcode::IUShr,
            LSh(ShiftType::Left) => Opcode::LShl,
            LSh(ShiftType::ArithmeticRight) => Opcode::LShr,
            LSh(ShiftType::LogicalRight) => Opcode::LUShr,
            IAnd => Opcode::IAnd,
            LAnd => Opcode::LAnd,
            IOr => Opcode::IOr,
            LOr => Opcode::LOr,
            IXor => Opcode::IXor,
            LXor => Opcode::LXor,
            IInc(_, _) => Opcode::IInc,
            I2L => Opcode::I2L,
            I2F => Opcode::I2F,
            I2D => Opcode::I2D,
            L2I => Opcode::L2I,
            L2F => Opcode::L2F,
            L2D => Opcode::L2D,
            F2I => Opcode::F2I,
            F2L => Opcode::F2L,
            F2D => Opcode::F2D,
            D2I => Opcode::D2I,
            D2L => Opcode::D2L,
            D2F => Opcode::D2F,
            I2B => Opcode::I2B,
            I2C => Opcode::I2C,
            I2S => Opcode::I2S,
            LCmp => Opcode::LCmp,
            FCmp(CompareMode::L) => Opcode::FCmpL,
            FCmp(CompareMode::G) => Opcode::FCmpG,
            DCmp(CompareMode::L) => Opcode::DCmpL,
            DCmp(CompareMode::G) => Opcode::DCmpG,
            If(comp, _) => match comp {
                OrdComparison::EQ => Opcode::IfEq,
                OrdComparison::NE => Opcode::IfNe,
                OrdComparison::LT => Opcode::IfLt,
                OrdComparison::GE => Opcode::IfGe,
                OrdComparison::GT => Opcode::IfGt,
                OrdComparison::LE => Opcode::IfLe,
            },
            IfICmp(comp, _) => match comp {
                OrdComparison::EQ => Opcode::IfICmpEq,
                OrdComparison::NE => Opcode::IfICmpNe,
                OrdComparison::LT => Opcode::IfICmpLt,
                OrdComparison::GE => Opcode::IfICmpGe,
                OrdComparison::GT => Opcode::IfICmpGt,
                OrdComparison::LE => Opcode::IfICmpLe,
            },
            IfACmp(EqComparison::EQ, _) => Opcode::IfACmpEq,
            IfACmp(EqComparison::NE, _) => Opcode::IfACmpNe,
            Goto(_) => Opcode::Goto,
            Jsr(_) => Opcode::Jsr,
            Ret(_) => Opcode::Ret,
            TableSwitch { .. } => Opcode::TableSwitch,
            LookupSwitch { .. } => Opcode::LookupSwitch,
            IReturn => Opcode::IReturn,
            LReturn => Opcode::LReturn,
            FReturn => Opcode::FReturn,
            DReturn => Opcode::DReturn,
            AReturn => Opcode::AReturn,
            Return => Opcode::Return,
            GetStatic(_) => Opcode::GetStatic,
            PutStatic(_) => Opcode::PutStatic,
            GetField(_) => Opcode::GetField,
            PutField(_) => Opcode::PutField,
            Invoke(InvokeType::Virtual, _) => Opcode::InvokeVirtual,
            Invoke(InvokeType::Special, _) => Opcode::InvokeSpecial,
            Invoke(InvokeType::Static, _) => Opcode::InvokeStatic,
            Invoke(InvokeType::Interface, _) => Opcode::InvokeInterface,
            InvokeDynamic(_) => Opcode::InvokeDynamic,
            New(_) => Opcode::New,
            NewArray(_) => Opcode::NewArray,
            ANewArray(_) => Opcode::ANewArray,
            ArrayLength => Opcode::ArrayLength,
            AThrow => Opcode::AThrow,
            CheckCast(_) => Opcode::CheckCast,
            InstanceOf(_) => Opcode::InstanceOf,
            MonitorEnter => Opcode::MonitorEnter,
            MonitorExit => Opcode::MonitorExit,
            MultiANewArray(_, _) => Opcode::MultiANewArray,
            IfNull(EqComparison::EQ, _) => Opcode::IfNull,
            IfNull(EqComparison::NE, _) => Opcode::IfNonNull,
            GotoW(_) => Opcode::GotoW,
            JsrW(_) => Opcode::JsrW,
        }
    }

    /// Does this instruction need the `wide` prefix?
    pub fn is_wide(&self) -> bool {
        match self {
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
            | Instruction::Ret(slot) => *slot > u8::MAX as u16,
            Instruction::IInc(slot, increment) => {
                *slot > u8::MAX as u16 || i8::try_from(*increment).is_err()
            }
            _ => false,
        }
    }

    /// Is this a two-way branch (one with a fallthrough)?
    pub fn is_conditional_branch(&self) -> bool {
        self.conditional_branch().is_some()
    }

    /// Split a two-way branch into its condition and target
    pub fn conditional_branch(&self) -> Option<(BranchCondition, SynLabel)> {
        match self {
            Instruction::If(comp, lbl) => Some((BranchCondition::If(*comp), *lbl)),
            Instruction::IfICmp(comp, lbl) => Some((BranchCondition::IfICmp(*comp), *lbl)),
            Instruction::IfACmp(comp, lbl) => Some((BranchCondition::IfACmp(*comp), *lbl)),
            Instruction::IfNull(comp, lbl) => Some((BranchCondition::IfNull(*comp), *lbl)),
            _ => None,
        }
    }

    /// Does control never fall through to the next instruction?
    ///
    /// `jsr` is not included: the subroutine returns to the instruction after it.
    pub fn is_unconditional_transfer(&self) -> bool {
        matches!(
            self,
            Instruction::Goto(_)
                | Instruction::GotoW(_)
                | Instruction::Ret(_)
                | Instruction::TableSwitch { .. }
                | Instruction::LookupSwitch { .. }
                | Instruction::IReturn
                | Instruction::LReturn
                | Instruction::FReturn
                | Instruction::DReturn
                | Instruction::AReturn
                | Instruction::Return
                | Instruction::AThrow
        )
    }

    /// Target of a branch, `goto`, or `jsr` (in any width)
    pub fn branch_target(&self) -> Option<SynLabel> {
        match self {
            Instruction::If(_, lbl)
            | Instruction::IfICmp(_, lbl)
            | Instruction::IfACmp(_, lbl)
            | Instruction::IfNull(_, lbl)
            | Instruction::Goto(lbl)
            | Instruction::GotoW(lbl)
            | Instruction::Jsr(lbl)
            | Instruction::JsrW(lbl) => Some(*lbl),
            _ => None,
        }
    }

    /// Every label this instruction may jump to, in encoding order (so the default of a switch
    /// comes before its cases)
    pub fn jump_targets(&self) -> Vec<SynLabel> {
        match self {
            Instruction::TableSwitch { default, cases, .. }
            | Instruction::LookupSwitch { default, cases } => std::iter::once(*default)
                .chain(cases.iter().map(|case| case.target))
                .collect(),
            other => other.branch_target().into_iter().collect(),
        }
    }
}

/// Element of a method body: either an instruction or the placement of a label
#[derive(Clone, Debug, PartialEq)]
pub enum CodeElement {
    Label(SynLabel),
    Instruction(Instruction),
}

impl From<Instruction> for CodeElement {
    fn from(instruction: Instruction) -> CodeElement {
        CodeElement::Instruction(instruction)
    }
}

/// One `key: target` entry of a switch
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SwitchCase {
    pub key: i32,
    pub target: SynLabel,
}

impl SwitchCase {
    pub fn new(key: i32, target: SynLabel) -> SwitchCase {
        SwitchCase { key, target }
    }
}

/// Loadable constants (what `ldc`, `ldc_w`, and `ldc2_w` can push)
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantData {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(RefType),
    MethodType(MethodDescriptor),
    MethodHandle(MethodHandleRef),
    Dynamic(DynamicRef),
}

impl ConstantData {
    /// Is this a `long` or `double`, which must be loaded with `ldc2_w`?
    pub fn is_wide(&self) -> bool {
        match self {
            ConstantData::Long(_) | ConstantData::Double(_) => true,
            ConstantData::Dynamic(dynamic) => matches!(
                dynamic.descriptor,
                FieldType::Base(BaseType::Long | BaseType::Double)
            ),
            _ => false,
        }
    }
}

/// Symbolic reference to a field
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: BinaryName,
    pub name: UnqualifiedName,
    pub descriptor: FieldType,
}

/// Symbolic reference to a method
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Class declaring the method (array types can be receivers too, eg. for `clone`)
    pub class: RefType,
    pub name: UnqualifiedName,
    pub descriptor: MethodDescriptor,

    /// Is the declaring class an interface?
    pub is_interface: bool,
}

/// Call site of an `invokedynamic`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvokeDynamicRef {
    /// Index into the `BootstrapMethods` attribute
    pub bootstrap: u16,
    pub name: UnqualifiedName,
    pub descriptor: MethodDescriptor,
}

/// Dynamically computed constant
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DynamicRef {
    /// Index into the `BootstrapMethods` attribute
    pub bootstrap: u16,
    pub name: UnqualifiedName,
    pub descriptor: FieldType,
}

/// Method handle constant
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodHandleRef {
    pub kind: ReferenceKind,
    pub class: BinaryName,
    pub name: UnqualifiedName,

    /// Field or method descriptor, depending on `kind`
    pub descriptor: String,
    pub is_interface: bool,
}

/// Kinds of method handles
///
/// See <https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-5.html#jvms-5.4.3.5>
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReferenceKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

/// Possible bit shifts
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ShiftType {
    Left,
    LogicalRight,
    ArithmeticRight,
}

/// Comparison modes for floating point
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CompareMode {
    /// -1 on NaN
    L,

    /// 1 on NaN
    G,
}

/// Binary comparison operators available for `int` branches
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OrdComparison {
    EQ,
    GE,
    GT,
    LE,
    LT,
    NE,
}

impl Not for OrdComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            OrdComparison::EQ => OrdComparison::NE,
            OrdComparison::GE => OrdComparison::LT,
            OrdComparison::GT => OrdComparison::LE,
            OrdComparison::LE => OrdComparison::GT,
            OrdComparison::LT => OrdComparison::GE,
            OrdComparison::NE => OrdComparison::EQ,
        }
    }
}

/// Condition of a two-way branch
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BranchCondition {
    If(OrdComparison),
    IfICmp(OrdComparison),
    IfACmp(EqComparison),
    IfNull(EqComparison),
}

impl BranchCondition {
    /// Branch to `target` when the condition holds
    pub fn branch(self, target: SynLabel) -> Instruction {
        match self {
            BranchCondition::If(comp) => Instruction::If(comp, target),
            BranchCondition::IfICmp(comp) => Instruction::IfICmp(comp, target),
            BranchCondition::IfACmp(comp) => Instruction::IfACmp(comp, target),
            BranchCondition::IfNull(comp) => Instruction::IfNull(comp, target),
        }
    }
}

impl Not for BranchCondition {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            BranchCondition::If(comp) => BranchCondition::If(!comp),
            BranchCondition::IfICmp(comp) => BranchCondition::IfICmp(!comp),
            BranchCondition::IfACmp(comp) => BranchCondition::IfACmp(!comp),
            BranchCondition::IfNull(comp) => BranchCondition::IfNull(!comp),
        }
    }
}

/// Equality/inequality comparison operators
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum EqComparison {
    EQ,
    NE,
}

impl Not for EqComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            EqComparison::EQ => EqComparison::NE,
            EqComparison::NE => EqComparison::EQ,
        }
    }
}

/// Type of method to invoke
///
/// `invokedynamic` is kept separate because its constant is a call site, not a method. The
/// argument count that `invokeinterface` encodes is derived from the descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum InvokeType {
    Virtual,
    Special,
    Static,
    Interface,
}
