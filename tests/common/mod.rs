//! A small Hack CPU used to execute translated programs.

#![allow(dead_code)]

use std::collections::HashMap;

use vm_translator::{
    asm::{Comp, Dest, Jump},
    render, translate_unit, LabelCounter, Options,
};

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    A(u16),
    C { dest: Dest, comp: Comp, jump: Jump },
}

pub struct Hack {
    rom: Vec<Op>,
    pub ram: Vec<i16>,
    pub a: i16,
    pub d: i16,
    pub pc: usize,
    pub halted: bool,
}

fn predefined(sym: &str) -> Option<u16> {
    let addr = match sym {
        "SP" => 0,
        "LCL" => 1,
        "ARG" => 2,
        "THIS" => 3,
        "THAT" => 4,
        "SCREEN" => 16384,
        "KBD" => 24576,
        _ => {
            let n: u16 = sym.strip_prefix('R')?.parse().ok()?;
            return (n < 16).then_some(n);
        }
    };
    Some(addr)
}

fn parse_c(text: &str) -> Op {
    let (rest, jump) = match text.split_once(';') {
        Some((rest, jump)) => (rest, jump.parse().unwrap()),
        None => (text, Jump::Null),
    };
    let (dest, comp) = match rest.split_once('=') {
        Some((dest, comp)) => (dest.parse().unwrap(), comp),
        None => (Dest::Null, rest),
    };
    let comp = comp
        .parse()
        .unwrap_or_else(|e| panic!("{} in `{}`", e, text));
    Op::C { dest, comp, jump }
}

fn eval(comp: Comp, a: i16, d: i16, m: i16) -> i16 {
    match comp {
        Comp::Zero => 0,
        Comp::One => 1,
        Comp::NegOne => -1,
        Comp::D => d,
        Comp::A => a,
        Comp::M => m,
        Comp::NotD => !d,
        Comp::NotA => !a,
        Comp::NotM => !m,
        Comp::NegD => d.wrapping_neg(),
        Comp::NegA => a.wrapping_neg(),
        Comp::NegM => m.wrapping_neg(),
        Comp::DPlusOne => d.wrapping_add(1),
        Comp::APlusOne => a.wrapping_add(1),
        Comp::MPlusOne => m.wrapping_add(1),
        Comp::DMinusOne => d.wrapping_sub(1),
        Comp::AMinusOne => a.wrapping_sub(1),
        Comp::MMinusOne => m.wrapping_sub(1),
        Comp::DPlusA => d.wrapping_add(a),
        Comp::DPlusM => d.wrapping_add(m),
        Comp::DMinusA => d.wrapping_sub(a),
        Comp::DMinusM => d.wrapping_sub(m),
        Comp::AMinusD => a.wrapping_sub(d),
        Comp::MMinusD => m.wrapping_sub(d),
        Comp::DAndA => d & a,
        Comp::DAndM => d & m,
        Comp::DOrA => d | a,
        Comp::DOrM => d | m,
    }
}

fn taken(jump: Jump, value: i16) -> bool {
    match jump {
        Jump::Null => false,
        Jump::JGT => value > 0,
        Jump::JEQ => value == 0,
        Jump::JGE => value >= 0,
        Jump::JLT => value < 0,
        Jump::JNE => value != 0,
        Jump::JLE => value <= 0,
        Jump::JMP => true,
    }
}

impl Hack {
    /// Assemble program text. Every label must be defined exactly once.
    pub fn load(program: &str) -> Self {
        let lines: Vec<&str> = program
            .lines()
            .map(|l| l.split_once("//").map(|(s, _)| s).unwrap_or(l).trim())
            .filter(|l| !l.is_empty())
            .collect();

        let mut symbols: HashMap<String, u16> = HashMap::new();
        let mut addr = 0u16;
        for line in &lines {
            if let Some(sym) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                let prev = symbols.insert(sym.to_string(), addr);
                assert!(prev.is_none(), "label {} defined twice", sym);
            } else {
                addr += 1;
            }
        }

        let mut rom = vec![];
        for line in &lines {
            if line.starts_with('(') {
                continue;
            }
            let op = match line.strip_prefix('@') {
                // Translated code never relies on variable allocation
                Some(value) => Op::A(
                    value
                        .parse()
                        .ok()
                        .or_else(|| predefined(value))
                        .or_else(|| symbols.get(value).copied())
                        .unwrap_or_else(|| panic!("undefined symbol {}", value)),
                ),
                None => parse_c(line),
            };
            rom.push(op);
        }

        Hack {
            rom,
            ram: vec![0; 32768],
            a: 0,
            d: 0,
            pc: 0,
            halted: false,
        }
    }

    fn step(&mut self) {
        match self.rom[self.pc].clone() {
            Op::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Op::C { dest, comp, jump } => {
                let addr = self.a as u16 as usize;
                let value = eval(comp, self.a, self.d, self.ram[addr & 0x7fff]);
                let target = addr;
                if dest.writes_m() {
                    self.ram[addr & 0x7fff] = value;
                }
                if dest.writes_a() {
                    self.a = value;
                }
                if dest.writes_d() {
                    self.d = value;
                }
                if taken(jump, value) {
                    // `(X) @X 0;JMP` spins forever
                    if target + 1 == self.pc {
                        self.halted = true;
                    }
                    self.pc = target;
                } else {
                    self.pc += 1;
                }
            }
        }
    }

    /// Run until execution falls off the end or reaches a halt loop.
    pub fn run(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if self.halted || self.pc >= self.rom.len() {
                return;
            }
            self.step();
        }
        panic!("program did not finish within {} steps", max_steps);
    }

    pub fn sp(&self) -> i16 {
        self.ram[SP]
    }

    /// Top `n` stack words, deepest first.
    pub fn stack_top(&self, n: usize) -> &[i16] {
        let sp = self.sp() as usize;
        &self.ram[sp - n..sp]
    }
}

/// Translate units in order with one shared counter and concatenate them.
pub fn build(units: &[(&str, &str)]) -> String {
    let options = Options::default();
    let mut counter = LabelCounter::new();
    units
        .iter()
        .map(|(name, src)| render(&translate_unit(name, src, &mut counter, &options).unwrap()))
        .collect()
}

/// Translate and run a single unit.
pub fn run_vm(src: &str) -> Hack {
    let mut cpu = Hack::load(&build(&[("Test", src)]));
    cpu.run(1_000_000);
    cpu
}
