use bitflags::bitflags;

bitflags! {
    /// Access flags on methods
    ///
    /// Only `STATIC` changes anything about code generation (it decides whether local 0 holds the
    /// receiver), but the full set is kept so front-ends can pass the method's flags through
    /// unchanged.
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

impl MethodAccessFlags {
    /// Does the method receive `this` in local 0?
    pub fn has_receiver(&self) -> bool {
        !self.contains(MethodAccessFlags::STATIC)
    }
}
