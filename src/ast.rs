use std::{fmt, str::FromStr};

/// Registers holding the stack pointer and the segment base addresses.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BaseRegister {
    Sp,
    Lcl,
    Arg,
    This,
    That,
}

impl BaseRegister {
    /// Predefined assembler symbol for the register.
    pub fn symbol(self) -> &'static str {
        match self {
            BaseRegister::Sp => "SP",
            BaseRegister::Lcl => "LCL",
            BaseRegister::Arg => "ARG",
            BaseRegister::This => "THIS",
            BaseRegister::That => "THAT",
        }
    }

    /// Name used by the `set` instruction.
    pub fn keyword(self) -> &'static str {
        match self {
            BaseRegister::Sp => "sp",
            BaseRegister::Lcl => "local",
            BaseRegister::Arg => "argument",
            BaseRegister::This => "this",
            BaseRegister::That => "that",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

/// Where a segment reference lives.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Addressing {
    /// The index itself, no memory read.
    Constant(u16),
    /// A fixed RAM address.
    Direct(u16),
    /// Base register contents plus an offset.
    Indirect(BaseRegister, u16),
}

pub const TEMP_BASE: u16 = 5;
pub const POINTER_BASE: u16 = 3;

impl Segment {
    pub fn keyword(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }

    pub fn address(self, index: u16) -> Addressing {
        match self {
            Segment::Constant => Addressing::Constant(index),
            Segment::Temp => Addressing::Direct(TEMP_BASE.wrapping_add(index)),
            Segment::Pointer => Addressing::Direct(POINTER_BASE.wrapping_add(index)),
            // Statics map straight onto RAM, no per-unit pool.
            Segment::Static => Addressing::Direct(index),
            Segment::Local => Addressing::Indirect(BaseRegister::Lcl, index),
            Segment::Argument => Addressing::Indirect(BaseRegister::Arg, index),
            Segment::This => Addressing::Indirect(BaseRegister::This, index),
            Segment::That => Addressing::Indirect(BaseRegister::That, index),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Opcode {
    Push,
    Pop,
    Add,
    Sub,
    And,
    Or,
    Neg,
    Not,
    Eq,
    Lt,
    Gt,
    Label,
    Goto,
    IfGoto,
    Set,
    Function,
    Call,
    Return,
    End,
}

impl Opcode {
    pub const ALL: [Opcode; 19] = [
        Opcode::Push,
        Opcode::Pop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::And,
        Opcode::Or,
        Opcode::Neg,
        Opcode::Not,
        Opcode::Eq,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::Label,
        Opcode::Goto,
        Opcode::IfGoto,
        Opcode::Set,
        Opcode::Function,
        Opcode::Call,
        Opcode::Return,
        Opcode::End,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Opcode::Push => "push",
            Opcode::Pop => "pop",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Neg => "neg",
            Opcode::Not => "not",
            Opcode::Eq => "eq",
            Opcode::Lt => "lt",
            Opcode::Gt => "gt",
            Opcode::Label => "label",
            Opcode::Goto => "goto",
            Opcode::IfGoto => "if-goto",
            Opcode::Set => "set",
            Opcode::Function => "function",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::End => "end",
        }
    }
}

impl FromStr for Opcode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.keyword() == s)
            .ok_or_else(|| format!("invalid Opcode `{}`", s))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    And,
    Or,
    Neg,
    Not,
    Eq,
    Lt,
    Gt,

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Function(String, u16),
    Call(String, u16),
    Return,

    // Machine setup
    Set(BaseRegister, u16),
    End,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Push(..) => Opcode::Push,
            Command::Pop(..) => Opcode::Pop,
            Command::Add => Opcode::Add,
            Command::Sub => Opcode::Sub,
            Command::And => Opcode::And,
            Command::Or => Opcode::Or,
            Command::Neg => Opcode::Neg,
            Command::Not => Opcode::Not,
            Command::Eq => Opcode::Eq,
            Command::Lt => Opcode::Lt,
            Command::Gt => Opcode::Gt,
            Command::Label(_) => Opcode::Label,
            Command::Goto(_) => Opcode::Goto,
            Command::IfGoto(_) => Opcode::IfGoto,
            Command::Function(..) => Opcode::Function,
            Command::Call(..) => Opcode::Call,
            Command::Return => Opcode::Return,
            Command::Set(..) => Opcode::Set,
            Command::End => Opcode::End,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode();
        match self {
            Command::Push(seg, idx) | Command::Pop(seg, idx) => {
                write!(f, "{} {} {}", op, seg.keyword(), idx)
            }
            Command::Label(sym) | Command::Goto(sym) | Command::IfGoto(sym) => {
                write!(f, "{} {}", op, sym)
            }
            Command::Function(name, n) | Command::Call(name, n) => {
                write!(f, "{} {} {}", op, name, n)
            }
            Command::Set(reg, value) => write!(f, "{} {} {}", op, reg.keyword(), value),
            _ => write!(f, "{}", op),
        }
    }
}
