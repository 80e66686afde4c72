//! Translator from stack-machine VM code to Hack assembly.
//!
//! Each unit is parsed in full, then translated command by command. A single
//! [`LabelCounter`] is threaded through every unit of a program so that the
//! labels it generates stay unique once the units are concatenated.

pub mod asm;
pub mod ast;
pub mod error;
pub mod frame;
pub mod parser;
pub mod translator;

use log::debug;

pub use crate::{
    asm::Asm,
    error::{Error, ParseError},
    translator::{LabelCounter, Options, Translator},
};

/// Translate one unit of VM source.
///
/// On error nothing is returned and `counter` is left as it was, so the
/// caller can drop the unit without skewing labels for later ones.
pub fn translate_unit(
    unit: &str,
    source: &str,
    counter: &mut LabelCounter,
    options: &Options,
) -> Result<Vec<Asm>, Error> {
    let commands = parser::parse(unit, source)?;
    let first = counter.value();
    let asm = Translator::new(unit, options).translate(&commands, counter)?;
    debug!(
        "{}: {} commands -> {} lines (labels {}..{})",
        unit,
        commands.len(),
        asm.len(),
        first,
        counter.value()
    );
    Ok(asm)
}

/// One instruction per line, newline terminated.
pub fn render(asm: &[Asm]) -> String {
    asm.iter().map(|line| format!("{}\n", line)).collect()
}
