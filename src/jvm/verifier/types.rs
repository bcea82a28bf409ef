use crate::jvm::code::{ConstantData, SynLabel};
use crate::jvm::{BaseType, BinaryName, FieldType, RefType, TypeKind};
use crate::util::Width;

/// These types are from [this hierarchy][0], plus `Top` for unusable local variable slots
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.10.1.2
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum VerificationType<Cls, U> {
    /// Local variable slot that holds nothing usable (never set, or the second half of a `long`
    /// or `double`)
    Top,

    Integer,
    Float,
    Double,
    Long,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    /// Object type
    Object(Cls),

    /// State of an object after `new` has been called but `<init>` has not been called
    ///
    /// While simulating, `U` is the label placed right before the `new` instruction. Once
    /// offsets are known, that can be turned into the offset of the `new`.
    Uninitialized(U),
}

/// Verification type tracked by the stack simulator
pub type VType = VerificationType<RefType, SynLabel>;

impl<Cls, U> VerificationType<Cls, U> {
    /// Category of the type, as far as popping it off the stack is concerned
    ///
    /// `Top` has no category: it can't be loaded or popped.
    pub fn kind(&self) -> Option<TypeKind> {
        match self {
            VerificationType::Top => None,
            VerificationType::Integer => Some(TypeKind::Int),
            VerificationType::Float => Some(TypeKind::Float),
            VerificationType::Double => Some(TypeKind::Double),
            VerificationType::Long => Some(TypeKind::Long),
            _ => Some(TypeKind::Reference),
        }
    }
}

impl<U> From<FieldType> for VerificationType<RefType, U> {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Base(BaseType::Int)
            | FieldType::Base(BaseType::Char)
            | FieldType::Base(BaseType::Short)
            | FieldType::Base(BaseType::Byte)
            | FieldType::Base(BaseType::Boolean) => VerificationType::Integer,
            FieldType::Base(BaseType::Float) => VerificationType::Float,
            FieldType::Base(BaseType::Long) => VerificationType::Long,
            FieldType::Base(BaseType::Double) => VerificationType::Double,
            FieldType::Ref(ref_type) => VerificationType::Object(ref_type),
        }
    }
}

impl<U> From<&ConstantData> for VerificationType<RefType, U> {
    fn from(constant: &ConstantData) -> Self {
        let object = |name: BinaryName| VerificationType::Object(RefType::Object(name));
        match constant {
            ConstantData::Integer(_) => VerificationType::Integer,
            ConstantData::Float(_) => VerificationType::Float,
            ConstantData::Long(_) => VerificationType::Long,
            ConstantData::Double(_) => VerificationType::Double,
            ConstantData::String(_) => object(BinaryName::STRING),
            ConstantData::Class(_) => object(BinaryName::CLASS),
            ConstantData::MethodType(_) => object(BinaryName::METHODTYPE),
            ConstantData::MethodHandle(_) => object(BinaryName::METHODHANDLE),
            ConstantData::Dynamic(dynamic) => VerificationType::from(dynamic.descriptor.clone()),
        }
    }
}

impl<Cls, A> Width for VerificationType<Cls, A> {
    fn width(&self) -> usize {
        match self {
            VerificationType::Double | VerificationType::Long => 2,
            _ => 1,
        }
    }
}
