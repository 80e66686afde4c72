use nom::{
    branch::alt,
    bytes::complete::{is_a, tag, take_till1},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, value, verify},
    sequence::{preceded, tuple},
    IResult,
};

use crate::{
    ast::{Command::*, Segment::*, *},
    error::{Error, ParseError},
};

/// A command together with the 1-based line it came from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SourceCommand {
    pub line: usize,
    pub command: Command,
}

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

#[test]
fn test_integer() {
    assert_eq!(integer("65535"), Ok(("", 65535)));
    assert!(integer("65536").is_err());
}

fn segment(input: &str) -> IResult<&str, Segment> {
    alt((
        value(Constant, tag("constant")),
        value(Local, tag("local")),
        value(Static, tag("static")),
        value(Argument, tag("argument")),
        value(This, tag("this")),
        value(That, tag("that")),
        value(Pointer, tag("pointer")),
        value(Temp, tag("temp")),
    ))(input)
}

fn register(input: &str) -> IResult<&str, BaseRegister> {
    alt((
        value(BaseRegister::Sp, tag("sp")),
        value(BaseRegister::Lcl, tag("local")),
        value(BaseRegister::Arg, tag("argument")),
        value(BaseRegister::This, tag("this")),
        value(BaseRegister::That, tag("that")),
    ))(input)
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

#[test]
fn test_symbol() {
    assert_eq!(symbol("Main.loop$1"), Ok(("", "Main.loop$1".to_string())));
    assert!(symbol("1abc").is_err());
}

fn opcode(input: &str) -> IResult<&str, Opcode> {
    map_res(take_till1(char::is_whitespace), |s: &str| s.parse::<Opcode>())(input)
}

fn segment_ref(input: &str) -> IResult<&str, (Segment, u16)> {
    map(
        tuple((space1, segment, space1, integer)),
        |(_, segment, _, arg)| (segment, arg),
    )(input)
}

fn named_count(input: &str) -> IResult<&str, (String, u16)> {
    map(
        tuple((space1, symbol, space1, integer)),
        |(_, name, _, count)| (name, count),
    )(input)
}

fn operands(op: Opcode, input: &str) -> IResult<&str, Command> {
    match op {
        Opcode::Push => map(segment_ref, |(seg, arg)| Push(seg, arg))(input),
        Opcode::Pop => map(segment_ref, |(seg, arg)| Pop(seg, arg))(input),
        Opcode::Label => map(preceded(space1, symbol), Label)(input),
        Opcode::Goto => map(preceded(space1, symbol), Goto)(input),
        Opcode::IfGoto => map(preceded(space1, symbol), IfGoto)(input),
        Opcode::Function => map(named_count, |(name, n)| Function(name, n))(input),
        Opcode::Call => map(named_count, |(name, n)| Call(name, n))(input),
        Opcode::Set => map(
            tuple((space1, register, space1, integer)),
            |(_, reg, _, val)| Set(reg, val),
        )(input),
        Opcode::Add => Ok((input, Add)),
        Opcode::Sub => Ok((input, Sub)),
        Opcode::And => Ok((input, And)),
        Opcode::Or => Ok((input, Or)),
        Opcode::Neg => Ok((input, Neg)),
        Opcode::Not => Ok((input, Not)),
        Opcode::Eq => Ok((input, Eq)),
        Opcode::Lt => Ok((input, Lt)),
        Opcode::Gt => Ok((input, Gt)),
        Opcode::Return => Ok((input, Return)),
        Opcode::End => Ok((input, End)),
    }
}

fn expected(op: Opcode) -> &'static str {
    match op {
        Opcode::Push | Opcode::Pop => "a segment and an index",
        Opcode::Label | Opcode::Goto | Opcode::IfGoto => "a label",
        Opcode::Function | Opcode::Call => "a function name and a count",
        Opcode::Set => "a register (sp, local, argument, this, that) and a value",
        _ => "no operands",
    }
}

/// Parse one comment-free, non-empty line.
pub fn command(line: &str) -> Result<Command, ParseError> {
    let (rest, op) = opcode(line).map_err(|_| {
        ParseError::UnknownOpcode(line.split_whitespace().next().unwrap_or("").to_string())
    })?;

    match operands(op, rest) {
        Ok((remainder, command)) if remainder.trim().is_empty() => match command {
            Pop(Constant, _) => Err(ParseError::PopConstant),
            command => Ok(command),
        },
        _ => Err(ParseError::MalformedOperands {
            opcode: op,
            expected: expected(op),
        }),
    }
}

#[test]
fn test_push() {
    assert_eq!(command("push  pointer  1"), Ok(Push(Pointer, 1)));
    assert_eq!(command("push\tconstant 7"), Ok(Push(Constant, 7)));
}

#[test]
fn test_pop() {
    assert_eq!(command("pop that 4"), Ok(Pop(That, 4)));
    assert_eq!(command("pop constant 4"), Err(ParseError::PopConstant));
}

#[test]
fn test_prim() {
    assert_eq!(command("neg"), Ok(Neg));
    assert_eq!(command("gt"), Ok(Gt));
}

#[test]
fn test_functions() {
    assert_eq!(command("function Main.fib 2"), Ok(Function("Main.fib".into(), 2)));
    assert_eq!(command("call Main.fib 1"), Ok(Call("Main.fib".into(), 1)));
    assert_eq!(command("return"), Ok(Return));
}

#[test]
fn test_set() {
    assert_eq!(command("set sp 256"), Ok(Set(BaseRegister::Sp, 256)));
    assert_eq!(command("set argument 400"), Ok(Set(BaseRegister::Arg, 400)));
    assert!(command("set temp 3").is_err());
}

#[test]
fn test_bad_commands() {
    assert_eq!(
        command("jump LOOP"),
        Err(ParseError::UnknownOpcode("jump".into()))
    );
    assert_eq!(
        command("adds"),
        Err(ParseError::UnknownOpcode("adds".into()))
    );
    assert!(matches!(
        command("push local x"),
        Err(ParseError::MalformedOperands { opcode: Opcode::Push, .. })
    ));
    assert!(matches!(
        command("push heap 1"),
        Err(ParseError::MalformedOperands { .. })
    ));
    assert!(matches!(command("goto"), Err(ParseError::MalformedOperands { .. })));
    assert!(matches!(command("add 1"), Err(ParseError::MalformedOperands { .. })));
    assert!(matches!(
        command("call f"),
        Err(ParseError::MalformedOperands { opcode: Opcode::Call, .. })
    ));
}

fn strip_comment(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

/// Parse a whole unit, stopping at the first bad line.
pub fn parse(unit: &str, input: &str) -> Result<Vec<SourceCommand>, Error> {
    let mut commands = vec![];

    for (idx, line) in input.lines().enumerate() {
        let line = strip_comment(line);
        if line.is_empty() {
            continue;
        }

        match command(line) {
            Ok(command) => commands.push(SourceCommand {
                line: idx + 1,
                command,
            }),
            Err(source) => {
                return Err(Error {
                    unit: unit.to_string(),
                    line: idx + 1,
                    source,
                })
            }
        }
    }

    Ok(commands)
}

#[test]
fn test_parse_skips_comments_and_blanks() {
    let src = "// header\n\npush constant 7   // seven\n   \nadd\n";
    let parsed = parse("Main", src).unwrap();
    assert_eq!(
        parsed,
        vec![
            SourceCommand {
                line: 3,
                command: Push(Constant, 7)
            },
            SourceCommand {
                line: 5,
                command: Add
            },
        ]
    );
}

#[test]
fn test_parse_reports_line() {
    let err = parse("Main", "push constant 1\nfrobnicate\n").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.unit, "Main");
    assert_eq!(err.to_string(), "Main:2: unknown operation `frobnicate`");
}
