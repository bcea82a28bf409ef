use super::{initial_locals, LocalVariables, OperandStack, VType};
use crate::jvm::code::{CodeElement, Instruction, SynLabel};
use crate::jvm::{BinaryName, Error, MethodAccessFlags, MethodDescriptor, UnqualifiedName};
use std::collections::HashMap;

/// Stack and local variable types on entry to a label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelFrame {
    pub locals: LocalVariables,

    /// Stack types, from bottom to top
    pub stack: Vec<VType>,
}

impl LabelFrame {
    /// Locals in the compact stack map form
    pub fn locals_snapshot(&self) -> Vec<VType> {
        self.locals.snapshot()
    }
}

/// Walks a method body, tracking the types on the operand stack and in the locals
///
/// This runs independently of branch width resolution: it only needs the order of elements, not
/// their offsets. Control flow is followed only as far as a linear pass allows. When code can't be
/// reached by falling through (eg. after a `goto`), the state at the next label is taken from an
/// externally supplied frame, a frame recorded from an earlier jump to that label, or else an
/// empty stack.
pub struct StackSimulator {
    stack: OperandStack,
    locals: LocalVariables,

    /// Frames supplied from outside (eg. exception handler entries)
    snapshots: HashMap<SynLabel, LabelFrame>,

    /// Frames computed so far
    frames: HashMap<SynLabel, LabelFrame>,

    /// Can the next element be reached by falling through?
    reachable: bool,

    /// Label placed right before the next instruction
    origin: Option<SynLabel>,

    max_locals: usize,
}

impl StackSimulator {
    pub fn new(this_class: BinaryName, locals: LocalVariables) -> StackSimulator {
        StackSimulator {
            stack: OperandStack::new(this_class),
            max_locals: locals.max_locals(),
            locals,
            snapshots: HashMap::new(),
            frames: HashMap::new(),
            reachable: true,
            origin: None,
        }
    }

    /// Simulator for a method, with locals seeded from its signature
    pub fn for_method(
        this_class: BinaryName,
        method_name: &UnqualifiedName,
        descriptor: &MethodDescriptor,
        access_flags: MethodAccessFlags,
    ) -> StackSimulator {
        let locals = initial_locals(&this_class, method_name, descriptor, access_flags);
        StackSimulator::new(this_class, locals)
    }

    /// Supply the frame at a label, to be used instead of whatever is simulated
    pub fn add_snapshot(&mut self, label: SynLabel, frame: LabelFrame) {
        self.snapshots.insert(label, frame);
    }

    /// Simulate the next element of the method body
    pub fn push(&mut self, element: &CodeElement) -> Result<(), Error> {
        match element {
            CodeElement::Label(label) => self.place_label(*label),
            CodeElement::Instruction(insn) => self.simulate_instruction(insn),
        }
    }

    /// Simulate a whole method body
    pub fn simulate<'a>(
        &mut self,
        elements: impl IntoIterator<Item = &'a CodeElement>,
    ) -> Result<(), Error> {
        for element in elements {
            self.push(element)?;
        }
        Ok(())
    }

    fn place_label(&mut self, label: SynLabel) -> Result<(), Error> {
        let seed = match self.snapshots.get(&label) {
            Some(snapshot) => Some(snapshot.clone()),
            None if !self.reachable => self.frames.get(&label).cloned(),
            None => None,
        };

        if let Some(frame) = seed {
            log::trace!("Seeding stack at {:?} with {:?}", label, frame.stack);
            self.reseed(frame)?;
        } else if !self.reachable {
            log::trace!("No frame for unreachable {:?}, assuming an empty stack", label);
            self.stack.clear();
        }

        let frame = self.current_frame();
        self.frames.insert(label, frame);
        self.reachable = true;
        self.origin = Some(label);
        Ok(())
    }

    fn simulate_instruction(&mut self, insn: &Instruction) -> Result<(), Error> {
        self.stack.adjust(insn, &mut self.locals, self.origin)?;
        self.max_locals = self.max_locals.max(self.locals.max_locals());

        // The target of a `jsr` sees the return address on the stack, which isn't tracked
        if !matches!(insn, Instruction::Jsr(_) | Instruction::JsrW(_)) {
            for target in insn.jump_targets() {
                if !self.frames.contains_key(&target) {
                    let frame = self.current_frame();
                    self.frames.insert(target, frame);
                }
            }
        }

        self.reachable = !insn.is_unconditional_transfer();
        self.origin = None;
        Ok(())
    }

    fn reseed(&mut self, frame: LabelFrame) -> Result<(), Error> {
        self.stack.clear();
        self.stack.set(&frame.stack)?;
        self.locals = frame.locals;
        self.max_locals = self.max_locals.max(self.locals.max_locals());
        Ok(())
    }

    fn current_frame(&self) -> LabelFrame {
        LabelFrame {
            locals: self.locals.clone(),
            stack: self.stack.snapshot(),
        }
    }

    /// Deepest the operand stack got
    pub fn max_stack(&self) -> usize {
        self.stack.max_stack()
    }

    /// Number of local variable slots used
    pub fn max_locals(&self) -> usize {
        self.max_locals
    }

    /// Frame at a label (once the label has been placed or jumped to)
    pub fn frame_at(&self, label: SynLabel) -> Option<&LabelFrame> {
        self.frames.get(&label)
    }

    pub fn frames(&self) -> &HashMap<SynLabel, LabelFrame> {
        &self.frames
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn locals(&self) -> &LocalVariables {
        &self.locals
    }
}
