use super::{VType, VerificationType};
use crate::jvm::{
    BinaryName, MethodAccessFlags, MethodDescriptor, RefType, StackErrorKind, TypeKind,
    UnqualifiedName,
};
use crate::util::Width;

/// Types of the local variables at a point in a method
///
/// Unlike the operand stack, locals are addressed by slot. A `long` or `double` in slot `n` also
/// makes slot `n + 1` unusable, so that slot holds `Top`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LocalVariables {
    slots: Vec<VType>,

    /// Largest number of slots ever in use
    max_locals: usize,
}

impl LocalVariables {
    pub fn new() -> LocalVariables {
        LocalVariables::default()
    }

    /// Locals holding the given types in consecutive positions (so in the form produced by
    /// [`Self::snapshot`])
    pub fn from_types(types: impl IntoIterator<Item = VType>) -> LocalVariables {
        let mut locals = LocalVariables::new();
        for vtype in types {
            locals.append(vtype);
        }
        locals
    }

    /// Add a local variable after the last slot in use
    pub fn append(&mut self, vtype: VType) {
        let width = vtype.width();
        self.slots.push(vtype);
        if width == 2 {
            self.slots.push(VerificationType::Top);
        }
        self.max_locals = self.max_locals.max(self.slots.len());
    }

    /// Number of slots in use (including `Top` slots)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Largest number of slots that have been in use
    pub fn max_locals(&self) -> usize {
        self.max_locals
    }

    /// Type of the local variable in a slot
    pub fn get(&self, slot: u16) -> Result<&VType, StackErrorKind> {
        self.slots
            .get(slot as usize)
            .ok_or(StackErrorKind::InvalidLocal(slot))
    }

    /// Read a local variable, checking that it has the expected category
    pub fn load(&self, slot: u16, expected: TypeKind) -> Result<VType, StackErrorKind> {
        let found = self.get(slot)?;
        if found.kind() == Some(expected) {
            Ok(found.clone())
        } else {
            Err(StackErrorKind::InvalidType {
                expected,
                found: found.clone(),
            })
        }
    }

    /// Write a local variable
    ///
    /// Writing to half of a `long` or `double` invalidates the other half.
    pub fn store(&mut self, slot: u16, vtype: VType) -> Result<(), StackErrorKind> {
        let index = slot as usize;
        let width = vtype.width();
        if index + width > u16::MAX as usize + 1 {
            return Err(StackErrorKind::InvalidLocal(slot));
        }

        if self.slots.len() < index + width {
            self.slots.resize(index + width, VerificationType::Top);
        }

        if index > 0 && self.slots[index - 1].width() == 2 {
            self.slots[index - 1] = VerificationType::Top;
        }

        self.slots[index] = vtype;
        if width == 2 {
            self.slots[index + 1] = VerificationType::Top;
        }

        self.max_locals = self.max_locals.max(self.slots.len());
        Ok(())
    }

    /// Update every local in place
    pub fn replace_all(&mut self, mut update: impl FnMut(&VType) -> Option<VType>) {
        for slot in self.slots.iter_mut() {
            if let Some(replacement) = update(slot) {
                *slot = replacement;
            }
        }
    }

    /// Locals as they appear in a stack map frame
    ///
    /// The `Top` following a `long` or `double` is implicit there, and trailing `Top` slots are
    /// dropped.
    pub fn snapshot(&self) -> Vec<VType> {
        let mut types = vec![];
        let mut slot = 0;
        while slot < self.slots.len() {
            let vtype = &self.slots[slot];
            slot += vtype.width();
            types.push(vtype.clone());
        }
        while let Some(VerificationType::Top) = types.last() {
            types.pop();
        }
        types
    }

    /// Slot-by-slot view (with the `Top` after each `long` and `double`)
    pub fn slots(&self) -> &[VType] {
        &self.slots
    }
}

/// Locals on entry to a method
///
/// Non-static methods get their receiver in slot 0: `UninitializedThis` in a constructor (until
/// the superclass constructor is called) and the class type otherwise.
pub fn initial_locals(
    this_class: &BinaryName,
    method_name: &UnqualifiedName,
    descriptor: &MethodDescriptor,
    access_flags: MethodAccessFlags,
) -> LocalVariables {
    let mut locals = LocalVariables::new();
    if access_flags.has_receiver() {
        if method_name.is_init() {
            locals.append(VerificationType::UninitializedThis);
        } else {
            locals.append(VerificationType::Object(RefType::Object(this_class.clone())));
        }
    }
    for parameter in &descriptor.parameters {
        locals.append(VType::from(parameter.clone()));
    }
    locals
}
