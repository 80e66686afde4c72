//! Call, function entry and return.
//!
//! The machine has no call stack, so each call builds a frame on the working
//! stack:
//!
//! ```text
//! ARG  -> argument 0 .. argument n-1
//!         return address
//!         saved LCL, ARG, THIS, THAT
//! LCL  -> local 0 .. local k-1
//!         working stack
//! ```

use crate::{
    asm::*,
    ast::BaseRegister::{self, *},
    translator::{pop_d, push_d},
};

/// Frame base snapshot taken by `return`.
pub const FRAME: u16 = 14;
/// Return address saved by `return` before the frame is unwound.
pub const RET_ADDR: u16 = 15;

/// Registers saved by `call`, in push order.
const SAVED: [BaseRegister; 4] = [Lcl, Arg, This, That];

/// Words pushed by `call` on top of the arguments.
const FRAME_WORDS: u16 = 5;

pub fn return_label(id: u32) -> String {
    format!("RETURN_{}", id)
}

pub fn call(function: &str, nargs: u16, id: u32) -> Vec<Asm> {
    let ret = return_label(id);

    let mut out = vec![at_sym(&ret), set(Dest::D, Comp::A)];
    out.extend(push_d());

    for reg in SAVED {
        out.extend([at_reg(reg), set(Dest::D, Comp::M)]);
        out.extend(push_d());
    }

    // ARG = SP - 5 - nargs
    out.extend([
        at_reg(Sp),
        set(Dest::D, Comp::M),
        at_const(FRAME_WORDS),
        set(Dest::D, Comp::DMinusA),
        at_const(nargs),
        set(Dest::D, Comp::DMinusA),
        at_reg(Arg),
        set(Dest::M, Comp::D),
    ]);

    // LCL = SP
    out.extend([
        at_reg(Sp),
        set(Dest::D, Comp::M),
        at_reg(Lcl),
        set(Dest::M, Comp::D),
    ]);

    out.extend([at_sym(function), jump(Comp::Zero, Jump::JMP), label(&ret)]);
    out
}

pub fn function(name: &str, nvars: u16) -> Vec<Asm> {
    let mut out = vec![label(name)];
    for _ in 0..nvars {
        out.extend([
            at_reg(Sp),
            set(Dest::M, Comp::MPlusOne),
            set(Dest::A, Comp::MMinusOne),
            set(Dest::M, Comp::Zero),
        ]);
    }
    out
}

/// `reg = *(FRAME - offset)`
fn restore(reg: BaseRegister, offset: u16) -> [Asm; 7] {
    [
        at_ram(FRAME),
        set(Dest::D, Comp::M),
        at_const(offset),
        set(Dest::A, Comp::DMinusA),
        set(Dest::D, Comp::M),
        at_reg(reg),
        set(Dest::M, Comp::D),
    ]
}

pub fn ret() -> Vec<Asm> {
    // FRAME = LCL
    let mut out = vec![
        at_reg(Lcl),
        set(Dest::D, Comp::M),
        at_ram(FRAME),
        set(Dest::M, Comp::D),
    ];

    // RET = *(FRAME - 5); with no arguments *ARG is this same slot
    out.extend([
        at_const(FRAME_WORDS),
        set(Dest::A, Comp::DMinusA),
        set(Dest::D, Comp::M),
        at_ram(RET_ADDR),
        set(Dest::M, Comp::D),
    ]);

    // *ARG = pop()
    out.extend(pop_d());
    out.extend([at_reg(Arg), set(Dest::A, Comp::M), set(Dest::M, Comp::D)]);

    // SP = ARG + 1
    out.extend([
        at_reg(Arg),
        set(Dest::D, Comp::MPlusOne),
        at_reg(Sp),
        set(Dest::M, Comp::D),
    ]);

    // Reverse of the push order, always relative to FRAME
    for (offset, reg) in (1..).zip(SAVED.iter().rev()) {
        out.extend(restore(*reg, offset));
    }

    out.extend([
        at_ram(RET_ADDR),
        set(Dest::A, Comp::M),
        jump(Comp::Zero, Jump::JMP),
    ]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(asm: &[Asm]) -> Vec<String> {
        asm.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn call_pushes_return_address_then_saved_registers() {
        let lines = text(&call("Math.add", 2, 3));
        assert_eq!(&lines[..2], ["@RETURN_3", "D=A"]);
        let pushed: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| ["@LCL", "@ARG", "@THIS", "@THAT"].contains(l))
            .collect();
        assert_eq!(&pushed[..4], ["@LCL", "@ARG", "@THIS", "@THAT"]);
        assert_eq!(&lines[lines.len() - 3..], ["@Math.add", "0;JMP", "(RETURN_3)"]);
    }

    #[test]
    fn function_zeroes_locals() {
        let lines = text(&function("Main.main", 2));
        assert_eq!(lines[0], "(Main.main)");
        assert_eq!(lines.iter().filter(|l| *l == "M=0").count(), 2);
        assert_eq!(text(&function("Main.leaf", 0)), ["(Main.leaf)"]);
    }

    #[test]
    fn return_restores_in_reverse_order() {
        let lines = text(&ret());
        let restored: Vec<&str> = lines
            .windows(2)
            .filter(|w| w[1] == "M=D" && ["@THAT", "@THIS", "@ARG", "@LCL"].contains(&w[0].as_str()))
            .map(|w| w[0].as_str())
            .collect();
        assert_eq!(restored, ["@THAT", "@THIS", "@ARG", "@LCL"]);
        assert_eq!(&lines[lines.len() - 3..], ["@R15", "A=M", "0;JMP"]);
    }
}
