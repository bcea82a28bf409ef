use super::{ConstantData, Instruction};

/// Rewrite a constant push into the narrowest instruction pushing the same value
///
/// Only `ldc`, `ldc_w`, `ldc2_w`, `bipush`, and `sipush` are candidates. Everything else (and any
/// constant that has no shorter form) is returned unchanged, so the rewrite is idempotent.
///
/// Floating point zeros are compared bitwise: `-0.0` must keep its sign bit, so it never becomes
/// `fconst_0`/`dconst_0`.
pub fn shrink_constant(insn: Instruction) -> Instruction {
    let shrunk = match &insn {
        Instruction::Ldc(constant) => shrink_constant_data(constant, false),
        Instruction::LdcW(constant) | Instruction::Ldc2W(constant) => {
            shrink_constant_data(constant, true)
        }
        Instruction::BiPush(value) => shrink_int(*value as i32, false),
        Instruction::SiPush(value) => shrink_int(*value as i32, false),
        _ => None,
    };
    shrunk.unwrap_or(insn)
}

fn shrink_constant_data(constant: &ConstantData, wide_form: bool) -> Option<Instruction> {
    match constant {
        ConstantData::Integer(value) => shrink_int(*value, wide_form),
        ConstantData::Long(0) => Some(Instruction::LConst0),
        ConstantData::Long(1) => Some(Instruction::LConst1),
        ConstantData::Float(value) if value.to_bits() == 0 => Some(Instruction::FConst0),
        ConstantData::Float(value) if *value == 1.0 => Some(Instruction::FConst1),
        ConstantData::Float(value) if *value == 2.0 => Some(Instruction::FConst2),
        ConstantData::Double(value) if value.to_bits() == 0 => Some(Instruction::DConst0),
        ConstantData::Double(value) if *value == 1.0 => Some(Instruction::DConst1),
        _ => None,
    }
}

/// `sipush` is as long as `ldc_w` but avoids a constant pool entry. It is longer than `ldc`, so
/// it is only used when replacing the wide form.
fn shrink_int(value: i32, wide_form: bool) -> Option<Instruction> {
    let insn = match value {
        -1 => Instruction::IConstM1,
        0 => Instruction::IConst0,
        1 => Instruction::IConst1,
        2 => Instruction::IConst2,
        3 => Instruction::IConst3,
        4 => Instruction::IConst4,
        5 => Instruction::IConst5,
        _ => {
            if let Ok(byte) = i8::try_from(value) {
                Instruction::BiPush(byte)
            } else {
                match i16::try_from(value) {
                    Ok(short) if wide_form => Instruction::SiPush(short),
                    _ => return None,
                }
            }
        }
    };
    Some(insn)
}
