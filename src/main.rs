use std::{
    ffi::OsStr,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, LevelFilter};

use vm_translator::{render, translate_unit, LabelCounter, Options};

#[derive(Parser, Debug)]
#[command(
    name = "vm-translator",
    version,
    about = "Translate VM code into Hack assembly",
    long_about = "Translate VM code into Hack assembly.

Inputs are translated in the order given and concatenated into one program,
so put the entry unit first. Labels generated for comparisons, calls and
halts are numbered across all inputs."
)]
struct Args {
    /// VM source files
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Output file, `-` for stdout [default: first input with .asm extension]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not annotate the output with source comments
    #[arg(long)]
    no_comments: bool,

    /// First value of the label counter
    #[arg(long, value_name = "N", default_value_t = 0)]
    counter_start: u32,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn unit_name(path: &Path) -> &str {
    path.file_stem().and_then(OsStr::to_str).unwrap_or("unit")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let options = Options {
        annotate: !args.no_comments,
    };
    let mut counter = LabelCounter::starting_at(args.counter_start);
    let mut program = String::new();

    // Nothing is written until every unit has translated.
    for input in &args.inputs {
        let source = fs::read_to_string(input)
            .with_context(|| format!("Error while reading file: {}", input.display()))?;
        let asm = translate_unit(unit_name(input), &source, &mut counter, &options)?;
        info!("translated {} ({} lines)", input.display(), asm.len());
        program.push_str(&render(&asm));
    }

    let output = args
        .output
        .unwrap_or_else(|| args.inputs[0].with_extension("asm"));

    if output.as_os_str() == "-" {
        io::stdout().write_all(program.as_bytes())?;
    } else {
        fs::write(&output, program)
            .with_context(|| format!("Error while writing file: {}", output.display()))?;
        info!("wrote {}", output.display());
    }

    Ok(())
}
