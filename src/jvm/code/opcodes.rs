//! Static metadata for every JVM opcode
//!
//! See <https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-7.html> for the numbering.

/// Encoded length of an opcode (including the opcode byte itself)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpcodeLength {
    Fixed(usize),

    /// Length depends on the operands (and for switches, on alignment)
    Variable,
}

/// What follows the opcode byte
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperandShape {
    None,
    Byte,
    Short,
    LocalSlot,
    LocalSlotIncrement,
    Label,
    WideLabel,
    Switch,
    ConstantPoolByte,
    ConstantPool,
    InterfaceMethod,
    InvokeDynamic,
    PrimitiveType,
    MultiArray,
    Wide,
}

macro_rules! opcodes {
    ($( $variant:ident = $code:literal, $mnemonic:literal, $length:literal, $operand:ident; )*) => {
        /// Every opcode the JVM defines (`breakpoint` and the `impdep` codes are reserved, so
        /// they are left out)
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Opcode {
            $( $variant = $code, )*
        }

        impl Opcode {
            /// All opcodes, ordered by their numeric code
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$variant, )* ];

            /// Name of the instruction, as `javap` prints it
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$variant => $mnemonic, )*
                }
            }

            /// Length of the encoded instruction
            pub const fn length(self) -> OpcodeLength {
                // `0` marks the variable length instructions in the table
                match self {
                    $( Opcode::$variant => match $length {
                        0 => OpcodeLength::Variable,
                        n => OpcodeLength::Fixed(n),
                    }, )*
                }
            }

            pub const fn operand(self) -> OperandShape {
                match self {
                    $( Opcode::$variant => OperandShape::$operand, )*
                }
            }

            /// Look up an opcode by its numeric code
            pub const fn from_code(code: u8) -> Option<Opcode> {
                match code {
                    $( $code => Some(Opcode::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00, "nop", 1, None;
    AConstNull = 0x01, "aconst_null", 1, None;
    IConstM1 = 0x02, "iconst_m1", 1, None;
    IConst0 = 0x03, "iconst_0", 1, None;
    IConst1 = 0x04, "iconst_1", 1, None;
    IConst2 = 0x05, "iconst_2", 1, None;
    IConst3 = 0x06, "iconst_3", 1, None;
    IConst4 = 0x07, "iconst_4", 1, None;
    IConst5 = 0x08, "iconst_5", 1, None;
    LConst0 = 0x09, "lconst_0", 1, None;
    LConst1 = 0x0a, "lconst_1", 1, None;
    FConst0 = 0x0b, "fconst_0", 1, None;
    FConst1 = 0x0c, "fconst_1", 1, None;
    FConst2 = 0x0d, "fconst_2", 1, None;
    DConst0 = 0x0e, "dconst_0", 1, None;
    DConst1 = 0x0f, "dconst_1", 1, None;
    BiPush = 0x10, "bipush", 2, Byte;
    SiPush = 0x11, "sipush", 3, Short;
    Ldc = 0x12, "ldc", 2, ConstantPoolByte;
    LdcW = 0x13, "ldc_w", 3, ConstantPool;
    Ldc2W = 0x14, "ldc2_w", 3, ConstantPool;
    ILoad = 0x15, "iload", 2, LocalSlot;
    LLoad = 0x16, "lload", 2, LocalSlot;
    FLoad = 0x17, "fload", 2, LocalSlot;
    DLoad = 0x18, "dload", 2, LocalSlot;
    ALoad = 0x19, "aload", 2, LocalSlot;
    ILoad0 = 0x1a, "iload_0", 1, None;
    ILoad1 = 0x1b, "iload_1", 1, None;
    ILoad2 = 0x1c, "iload_2", 1, None;
    ILoad3 = 0x1d, "iload_3", 1, None;
    LLoad0 = 0x1e, "lload_0", 1, None;
    LLoad1 = 0x1f, "lload_1", 1, None;
    LLoad2 = 0x20, "lload_2", 1, None;
    LLoad3 = 0x21, "lload_3", 1, None;
    FLoad0 = 0x22, "fload_0", 1, None;
    FLoad1 = 0x23, "fload_1", 1, None;
    FLoad2 = 0x24, "fload_2", 1, None;
    FLoad3 = 0x25, "fload_3", 1, None;
    DLoad0 = 0x26, "dload_0", 1, None;
    DLoad1 = 0x27, "dload_1", 1, None;
    DLoad2 = 0x28, "dload_2", 1, None;
    DLoad3 = 0x29, "dload_3", 1, None;
    ALoad0 = 0x2a, "aload_0", 1, None;
    ALoad1 = 0x2b, "aload_1", 1, None;
    ALoad2 = 0x2c, "aload_2", 1, None;
    ALoad3 = 0x2d, "aload_3", 1, None;
    IALoad = 0x2e, "iaload", 1, None;
    LALoad = 0x2f, "laload", 1, None;
    FALoad = 0x30, "faload", 1, None;
    DALoad = 0x31, "daload", 1, None;
    AALoad = 0x32, "aaload", 1, None;
    BALoad = 0x33, "baload", 1, None;
    CALoad = 0x34, "caload", 1, None;
    SALoad = 0x35, "saload", 1, None;
    IStore = 0x36, "istore", 2, LocalSlot;
    LStore = 0x37, "lstore", 2, LocalSlot;
    FStore = 0x38, "fstore", 2, LocalSlot;
    DStore = 0x39, "dstore", 2, LocalSlot;
    AStore = 0x3a, "astore", 2, LocalSlot;
    IStore0 = 0x3b, "istore_0", 1, None;
    IStore1 = 0x3c, "istore_1", 1, None;
    IStore2 = 0x3d, "istore_2", 1, None;
    IStore3 = 0x3e, "istore_3", 1, None;
    LStore0 = 0x3f, "lstore_0", 1, None;
    LStore1 = 0x40, "lstore_1", 1, None;
    LStore2 = 0x41, "lstore_2", 1, None;
    LStore3 = 0x42, "lstore_3", 1, None;
    FStore0 = 0x43, "fstore_0", 1, None;
    FStore1 = 0x44, "fstore_1", 1, None;
    FStore2 = 0x45, "fstore_2", 1, None;
    FStore3 = 0x46, "fstore_3", 1, None;
    DStore0 = 0x47, "dstore_0", 1, None;
    DStore1 = 0x48, "dstore_1", 1, None;
    DStore2 = 0x49, "dstore_2", 1, None;
    DStore3 = 0x4a, "dstore_3", 1, None;
    AStore0 = 0x4b, "astore_0", 1, None;
    AStore1 = 0x4c, "astore_1", 1, None;
    AStore2 = 0x4d, "astore_2", 1, None;
    AStore3 = 0x4e, "astore_3", 1, None;
    IAStore = 0x4f, "iastore", 1, None;
    LAStore = 0x50, "lastore", 1, None;
    FAStore = 0x51, "fastore", 1, None;
    DAStore = 0x52, "dastore", 1, None;
    AAStore = 0x53, "aastore", 1, None;
    BAStore = 0x54, "bastore", 1, None;
    CAStore = 0x55, "castore", 1, None;
    SAStore = 0x56, "sastore", 1, None;
    Pop = 0x57, "pop", 1, None;
    Pop2 = 0x58, "pop2", 1, None;
    Dup = 0x59, "dup", 1, None;
    DupX1 = 0x5a, "dup_x1", 1, None;
    DupX2 = 0x5b, "dup_x2", 1, None;
    Dup2 = 0x5c, "dup2", 1, None;
    Dup2X1 = 0x5d, "dup2_x1", 1, None;
    Dup2X2 = 0x5e, "dup2_x2", 1, None;
    Swap = 0x5f, "swap", 1, None;
    IAdd = 0x60, "iadd", 1, None;
    LAdd = 0x61, "ladd", 1, None;
    FAdd = 0x62, "fadd", 1, None;
    DAdd = 0x63, "dadd", 1, None;
    ISub = 0x64, "isub", 1, None;
    LSub = 0x65, "lsub", 1, None;
    FSub = 0x66, "fsub", 1, None;
    DSub = 0x67, "dsub", 1, None;
    IMul = 0x68, "imul", 1, None;
    LMul = 0x69, "lmul", 1, None;
    FMul = 0x6a, "fmul", 1, None;
    DMul = 0x6b, "dmul", 1, None;
    IDiv = 0x6c, "idiv", 1, None;
    LDiv = 0x6d, "ldiv", 1, None;
    FDiv = 0x6e, "fdiv", 1, None;
    DDiv = 0x6f, "ddiv", 1, None;
    IRem = 0x70, "irem", 1, None;
    LRem = 0x71, "lrem", 1, None;
    FRem = 0x72, "frem", 1, None;
    DRem = 0x73, "drem", 1, None;
    INeg = 0x74, "ineg", 1, None;
    LNeg = 0x75, "lneg", 1, None;
    FNeg = 0x76, "fneg", 1, None;
    DNeg = 0x77, "dneg", 1, None;
    IShl = 0x78, "ishl", 1, None;
    LShl = 0x79, "lshl", 1, None;
    IShr = 0x7a, "ishr", 1, None;
    LShr = 0x7b, "lshr", 1, None;
    IUShr = 0x7c, "iushr", 1, None;
    LUShr = 0x7d, "lushr", 1, None;
    IAnd = 0x7e, "iand", 1, None;
    LAnd = 0x7f, "land", 1, None;
    IOr = 0x80, "ior", 1, None;
    LOr = 0x81, "lor", 1, None;
    IXor = 0x82, "ixor", 1, None;
    LXor = 0x83, "lxor", 1, None;
    IInc = 0x84, "iinc", 3, LocalSlotIncrement;
    I2L = 0x85, "i2l", 1, None;
    I2F = 0x86, "i2f", 1, None;
    I2D = 0x87, "i2d", 1, None;
    L2I = 0x88, "l2i", 1, None;
    L2F = 0x89, "l2f", 1, None;
    L2D = 0x8a, "l2d", 1, None;
    F2I = 0x8b, "f2i", 1, None;
    F2L = 0x8c, "f2l", 1, None;
    F2D = 0x8d, "f2d", 1, None;
    D2I = 0x8e, "d2i", 1, None;
    D2L = 0x8f, "d2l", 1, None;
    D2F = 0x90, "d2f", 1, None;
    I2B = 0x91, "i2b", 1, None;
    I2C = 0x92, "i2c", 1, None;
    I2S = 0x93, "i2s", 1, None;
    LCmp = 0x94, "lcmp", 1, None;
    FCmpL = 0x95, "fcmpl", 1, None;
    FCmpG = 0x96, "fcmpg", 1, None;
    DCmpL = 0x97, "dcmpl", 1, None;
    DCmpG = 0x98, "dcmpg", 1, None;
    IfEq = 0x99, "ifeq", 3, Label;
    IfNe = 0x9a, "ifne", 3, Label;
    IfLt = 0x9b, "iflt", 3, Label;
    IfGe = 0x9c, "ifge", 3, Label;
    IfGt = 0x9d, "ifgt", 3, Label;
    IfLe = 0x9e, "ifle", 3, Label;
    IfICmpEq = 0x9f, "if_icmpeq", 3, Label;
    IfICmpNe = 0xa0, "if_icmpne", 3, Label;
    IfICmpLt = 0xa1, "if_icmplt", 3, Label;
    IfICmpGe = 0xa2, "if_icmpge", 3, Label;
    IfICmpGt = 0xa3, "if_icmpgt", 3, Label;
    IfICmpLe = 0xa4, "if_icmple", 3, Label;
    IfACmpEq = 0xa5, "if_acmpeq", 3, Label;
    IfACmpNe = 0xa6, "if_acmpne", 3, Label;
    Goto = 0xa7, "goto", 3, Label;
    Jsr = 0xa8, "jsr", 3, Label;
    Ret = 0xa9, "ret", 2, LocalSlot;
    TableSwitch = 0xaa, "tableswitch", 0, Switch;
    LookupSwitch = 0xab, "lookupswitch", 0, Switch;
    IReturn = 0xac, "ireturn", 1, None;
    LReturn = 0xad, "lreturn", 1, None;
    FReturn = 0xae, "freturn", 1, None;
    DReturn = 0xaf, "dreturn", 1, None;
    AReturn = 0xb0, "areturn", 1, None;
    Return = 0xb1, "return", 1, None;
    GetStatic = 0xb2, "getstatic", 3, ConstantPool;
    PutStatic = 0xb3, "putstatic", 3, ConstantPool;
    GetField = 0xb4, "getfield", 3, ConstantPool;
    PutField = 0xb5, "putfield", 3, ConstantPool;
    InvokeVirtual = 0xb6, "invokevirtual", 3, ConstantPool;
    InvokeSpecial = 0xb7, "invokespecial", 3, ConstantPool;
    InvokeStatic = 0xb8, "invokestatic", 3, ConstantPool;
    InvokeInterface = 0xb9, "invokeinterface", 5, InterfaceMethod;
    InvokeDynamic = 0xba, "invokedynamic", 5, InvokeDynamic;
    New = 0xbb, "new", 3, ConstantPool;
    NewArray = 0xbc, "newarray", 2, PrimitiveType;
    ANewArray = 0xbd, "anewarray", 3, ConstantPool;
    ArrayLength = 0xbe, "arraylength", 1, None;
    AThrow = 0xbf, "athrow", 1, None;
    CheckCast = 0xc0, "checkcast", 3, ConstantPool;
    InstanceOf = 0xc1, "instanceof", 3, ConstantPool;
    MonitorEnter = 0xc2, "monitorenter", 1, None;
    MonitorExit = 0xc3, "monitorexit", 1, None;
    Wide = 0xc4, "wide", 0, Wide;
    MultiANewArray = 0xc5, "multianewarray", 4, MultiArray;
    IfNull = 0xc6, "ifnull", 3, Label;
    IfNonNull = 0xc7, "ifnonnull", 3, Label;
    GotoW = 0xc8, "goto_w", 5, WideLabel;
    JsrW = 0xc9, "jsr_w", 5, WideLabel;
}

impl Opcode {
    /// Numeric code of the opcode
    pub const fn code(self) -> u8 {
        self as u8
    }
}
