use log::trace;

use crate::{
    asm::*,
    ast::{BaseRegister::*, Command::*, *},
    frame,
    error::{Error, ParseError},
    parser::SourceCommand,
};

/// Holds a computed destination address while `pop` reads the stack.
pub const POP_ADDR: u16 = 13;

/// Push microcode: `*SP = D; SP++`.
pub(crate) fn push_d() -> [Asm; 4] {
    [
        at_reg(Sp),
        set(Dest::M, Comp::MPlusOne),
        set(Dest::A, Comp::MMinusOne), // Don't need to refetch SP; this is safe
        set(Dest::M, Comp::D),
    ]
}

/// Pop microcode: `SP--; D = *SP`.
pub(crate) fn pop_d() -> [Asm; 3] {
    [
        at_reg(Sp),
        set(Dest::AM, Comp::MMinusOne), // SP--, A <- new SP (val to be popped)
        set(Dest::D, Comp::M),
    ]
}

fn push(segment: Segment, index: u16) -> Vec<Asm> {
    let mut out = match segment.address(index) {
        Addressing::Constant(value) => vec![at_const(value), set(Dest::D, Comp::A)],
        Addressing::Direct(addr) => vec![at_ram(addr), set(Dest::D, Comp::M)],
        Addressing::Indirect(base, offset) => vec![
            at_reg(base),
            set(Dest::D, Comp::M),
            at_const(offset),
            set(Dest::A, Comp::DPlusA), // A = SEG+arg
            set(Dest::D, Comp::M),
        ],
    };
    out.extend(push_d());
    out
}

fn pop(segment: Segment, index: u16) -> Vec<Asm> {
    match segment.address(index) {
        // Nowhere to store it; the value is dropped.
        Addressing::Constant(_) => vec![at_reg(Sp), set(Dest::M, Comp::MMinusOne)],
        Addressing::Direct(addr) => {
            let mut out = pop_d().to_vec();
            out.extend([at_ram(addr), set(Dest::M, Comp::D)]);
            out
        }
        Addressing::Indirect(base, offset) => {
            // Address goes to R13 before SP moves
            let mut out = vec![
                at_reg(base),
                set(Dest::D, Comp::M),
                at_const(offset),
                set(Dest::D, Comp::DPlusA),
                at_ram(POP_ADDR),
                set(Dest::M, Comp::D),
            ];
            out.extend(pop_d());
            out.extend([
                at_ram(POP_ADDR),
                set(Dest::A, Comp::M),
                set(Dest::M, Comp::D),
            ]);
            out
        }
    }
}

fn simple_un_op(op: Comp) -> Vec<Asm> {
    vec![at_reg(Sp), set(Dest::A, Comp::MMinusOne), set(Dest::M, op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(op: Comp) -> Vec<Asm> {
    let mut out = pop_d().to_vec(); // Right arg in D
    out.extend([
        set(Dest::A, Comp::AMinusOne), // Looking at second arg of stack, will overwrite
        set(Dest::M, op),
    ]);
    out
}

fn compare(name: &str, jump_on: Jump, id: u32) -> Vec<Asm> {
    let true_sym = format!("{}_TRUE_{}", name, id);
    let end_sym = format!("{}_END_{}", name, id);
    let mut out = pop_d().to_vec();
    out.extend([
        set(Dest::A, Comp::AMinusOne),
        set(Dest::D, Comp::MMinusD),
        at_sym(&true_sym),
        jump(Comp::D, jump_on),
        set(Dest::D, Comp::Zero),
        at_sym(&end_sym),
        jump(Comp::Zero, Jump::JMP),
        label(&true_sym),
        set(Dest::D, Comp::NegOne),
        label(&end_sym),
        at_reg(Sp),
        set(Dest::A, Comp::MMinusOne),
        set(Dest::M, Comp::D),
    ]);
    out
}

fn goto(sym: &str) -> Vec<Asm> {
    vec![at_sym(sym), jump(Comp::Zero, Jump::JMP)]
}

fn if_goto(sym: &str) -> Vec<Asm> {
    let mut out = pop_d().to_vec();
    out.extend([at_sym(sym), jump(Comp::D, Jump::JNE)]); // False is 0
    out
}

fn set_register(reg: BaseRegister, value: u16) -> Vec<Asm> {
    vec![
        at_const(value),
        set(Dest::D, Comp::A),
        at_reg(reg),
        set(Dest::M, Comp::D),
    ]
}

fn halt(id: u32) -> Vec<Asm> {
    let sym = format!("HALT_{}", id);
    vec![label(&sym), at_sym(&sym), jump(Comp::Zero, Jump::JMP)]
}

/// Generate code for a single command. `id` is the command's counter value
/// and namespaces every label the command defines.
pub fn translate_command(command: &Command, id: u32) -> Vec<Asm> {
    match command {
        Push(seg, arg) => push(*seg, *arg),
        Pop(seg, arg) => pop(*seg, *arg),
        Not => simple_un_op(Comp::NotM),
        Neg => simple_un_op(Comp::NegM),
        Add => simple_bin_op(Comp::DPlusM),
        Sub => simple_bin_op(Comp::MMinusD),
        And => simple_bin_op(Comp::DAndM),
        Or => simple_bin_op(Comp::DOrM),
        Eq => compare("EQ", Jump::JEQ, id),
        Gt => compare("GT", Jump::JGT, id),
        Lt => compare("LT", Jump::JLT, id),
        Label(sym) => vec![label(sym)],
        Goto(sym) => goto(sym),
        IfGoto(sym) => if_goto(sym),
        Function(name, nvars) => frame::function(name, *nvars),
        Call(name, nargs) => frame::call(name, *nargs, id),
        Return => frame::ret(),
        Set(reg, value) => set_register(*reg, *value),
        End => halt(id),
    }
}

/// Translation-order counter shared by every unit of a program.
///
/// Generated labels live in one flat namespace once units are concatenated,
/// so the same counter must be threaded through all of them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LabelCounter(u32);

impl LabelCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(value: u32) -> Self {
        LabelCounter(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Hand out the current value and move past it. `None` once the
    /// counter cannot move any further.
    pub fn advance(&mut self) -> Option<u32> {
        let tmp = self.0;
        self.0 = self.0.checked_add(1)?;
        Some(tmp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Emit a comment header per unit and per command.
    pub annotate: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { annotate: true }
    }
}

pub struct Translator<'a> {
    unit: &'a str,
    options: &'a Options,
}

impl<'a> Translator<'a> {
    pub fn new(unit: &'a str, options: &'a Options) -> Self {
        Translator { unit, options }
    }

    /// Translate a parsed unit. `counter` is only updated on success.
    pub fn translate(
        &self,
        commands: &[SourceCommand],
        counter: &mut LabelCounter,
    ) -> Result<Vec<Asm>, Error> {
        let mut next = *counter;
        let mut instructions: Vec<Asm> = vec![];

        if self.options.annotate {
            instructions.push(comment(self.unit));
        }

        for SourceCommand { line, command } in commands {
            let id = next.advance().ok_or_else(|| Error {
                unit: self.unit.to_string(),
                line: *line,
                source: ParseError::LabelsExhausted,
            })?;
            trace!("{}:{} #{} {}", self.unit, line, id, command);

            if self.options.annotate {
                instructions.push(comment(command));
            }
            instructions.extend(translate_command(command, id));
        }

        *counter = next;
        Ok(instructions)
    }
}
