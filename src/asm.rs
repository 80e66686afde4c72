//! Structured Hack assembly.
//!
//! Generators build [`Asm`] records; text only appears when a record is
//! displayed, so the translation logic never deals with formatting.

use std::{fmt, str::FromStr};

use crate::ast::BaseRegister;

/// The value loaded by an A-instruction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Operand {
    Constant(u16),
    /// Absolute RAM address.
    Ram(u16),
    Base(BaseRegister),
    Symbol(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "{}", value),
            // Only R0..R15 are predefined
            Operand::Ram(addr) if *addr < 16 => write!(f, "R{}", addr),
            Operand::Ram(addr) => write!(f, "{}", addr),
            Operand::Base(reg) => f.write_str(reg.symbol()),
            Operand::Symbol(sym) => f.write_str(sym),
        }
    }
}

macro_rules! mnemonics {
    ($name:ident { $($variant:ident => $text:expr),* $(,)? }) => {
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $($name::$variant => $text),*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.mnemonic())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|x| x.mnemonic() == s)
                    .ok_or_else(|| format!("invalid {} `{}`", stringify!($name), s))
            }
        }
    };
}

mnemonics!(Dest {
    Null => "",
    M => "M",
    D => "D",
    MD => "MD",
    A => "A",
    AM => "AM",
    AD => "AD",
    AMD => "AMD",
});

impl Dest {
    pub fn writes_a(self) -> bool {
        matches!(self, Dest::A | Dest::AM | Dest::AD | Dest::AMD)
    }

    pub fn writes_d(self) -> bool {
        matches!(self, Dest::D | Dest::MD | Dest::AD | Dest::AMD)
    }

    pub fn writes_m(self) -> bool {
        matches!(self, Dest::M | Dest::MD | Dest::AM | Dest::AMD)
    }
}

mnemonics!(Comp {
    Zero => "0",
    One => "1",
    NegOne => "-1",
    D => "D",
    A => "A",
    M => "M",
    NotD => "!D",
    NotA => "!A",
    NotM => "!M",
    NegD => "-D",
    NegA => "-A",
    NegM => "-M",
    DPlusOne => "D+1",
    APlusOne => "A+1",
    MPlusOne => "M+1",
    DMinusOne => "D-1",
    AMinusOne => "A-1",
    MMinusOne => "M-1",
    DPlusA => "D+A",
    DPlusM => "D+M",
    DMinusA => "D-A",
    DMinusM => "D-M",
    AMinusD => "A-D",
    MMinusD => "M-D",
    DAndA => "D&A",
    DAndM => "D&M",
    DOrA => "D|A",
    DOrM => "D|M",
});

mnemonics!(Jump {
    Null => "",
    JGT => "JGT",
    JEQ => "JEQ",
    JGE => "JGE",
    JLT => "JLT",
    JNE => "JNE",
    JLE => "JLE",
    JMP => "JMP",
});

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Asm {
    At(Operand),
    Compute { dest: Dest, comp: Comp, jump: Jump },
    Label(String),
    Comment(String),
}

impl fmt::Display for Asm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asm::At(operand) => write!(f, "@{}", operand),
            Asm::Compute { dest, comp, jump } => {
                if *dest != Dest::Null {
                    write!(f, "{}=", dest)?;
                }
                write!(f, "{}", comp)?;
                if *jump != Jump::Null {
                    write!(f, ";{}", jump)?;
                }
                Ok(())
            }
            Asm::Label(sym) => write!(f, "({})", sym),
            Asm::Comment(text) => write!(f, "// {}", text),
        }
    }
}

pub fn at_const(value: u16) -> Asm {
    Asm::At(Operand::Constant(value))
}

pub fn at_ram(addr: u16) -> Asm {
    Asm::At(Operand::Ram(addr))
}

pub fn at_reg(reg: BaseRegister) -> Asm {
    Asm::At(Operand::Base(reg))
}

pub fn at_sym(sym: &str) -> Asm {
    Asm::At(Operand::Symbol(sym.to_string()))
}

/// `dest=comp`
pub fn set(dest: Dest, comp: Comp) -> Asm {
    Asm::Compute {
        dest,
        comp,
        jump: Jump::Null,
    }
}

/// `comp;jump`
pub fn jump(comp: Comp, jump: Jump) -> Asm {
    Asm::Compute {
        dest: Dest::Null,
        comp,
        jump,
    }
}

pub fn label(sym: &str) -> Asm {
    Asm::Label(sym.to_string())
}

pub fn comment(text: impl fmt::Display) -> Asm {
    Asm::Comment(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_instructions() {
        assert_eq!(at_ram(13).to_string(), "@R13");
        assert_eq!(at_ram(300).to_string(), "@300");
        assert_eq!(at_reg(BaseRegister::Lcl).to_string(), "@LCL");
        assert_eq!(set(Dest::AM, Comp::MMinusOne).to_string(), "AM=M-1");
        assert_eq!(jump(Comp::D, Jump::JNE).to_string(), "D;JNE");
        assert_eq!(jump(Comp::Zero, Jump::JMP).to_string(), "0;JMP");
        assert_eq!(label("LOOP").to_string(), "(LOOP)");
        assert_eq!(comment("push constant 1").to_string(), "// push constant 1");
    }

    #[test]
    fn mnemonics_parse_back() {
        for comp in Comp::ALL {
            assert_eq!(comp.mnemonic().parse::<Comp>(), Ok(*comp));
        }
        assert_eq!("AMD".parse::<Dest>(), Ok(Dest::AMD));
        assert!("M+D".parse::<Comp>().is_err());
        assert!("JXX".parse::<Jump>().is_err());
    }

    #[test]
    fn dest_targets() {
        assert!(Dest::AM.writes_a() && Dest::AM.writes_m() && !Dest::AM.writes_d());
        assert!(!Dest::Null.writes_a() && !Dest::Null.writes_d() && !Dest::Null.writes_m());
    }
}
