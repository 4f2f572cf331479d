//! Assembles DroneASM source text into a [`Program`].
//!
//! Assembly is two passes over the source. Pass one strips comments,
//! uppercases each line, tokenizes it with a small state machine, and records
//! label definitions against the index of the next instruction. Pass two
//! validates every instruction against the per-opcode signature generated from
//! the table in [`crate::isa`] (arity, operand kinds, register ranges) and
//! resolves label references. Any failure aborts assembly; there is no partial
//! program.
//!
//! Source is case-insensitive: lines are uppercased before tokenizing, which
//! also uppercases string literals. A `#` starts a comment for the rest of the
//! line, even inside a string literal.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::AsmError;
use crate::isa::Opcode;
use crate::operand::{DisplayArg, FaceReg, NumReg, NumSource, PicReg};
use crate::operand::{FACE_REGISTER_COUNT, NUM_REGISTER_COUNT, PIC_REGISTER_COUNT};
use crate::program::{Instr, Op, Program};
use crate::{error, for_each_opcode};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TokenKind {
    Number,
    NumReg,
    PicReg,
    FaceReg,
    Str,
    Ident,
    LabelDef,
}

/// One lexed token. `text` holds the payload only: register digits without
/// the `$R`/`$P`/`$F` prefix, string contents without quotes, label names
/// without the trailing colon.
#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    text: String,
    /// 1-based column of the token's first character.
    col: usize,
}

impl Token {
    fn describe(&self) -> String {
        match self.kind {
            TokenKind::Number => format!("number `{}`", self.text),
            TokenKind::NumReg => format!("register `$R{}`", self.text),
            TokenKind::PicReg => format!("register `$P{}`", self.text),
            TokenKind::FaceReg => format!("register `$F{}`", self.text),
            TokenKind::Str => format!("string \"{}\"", self.text),
            TokenKind::Ident => format!("identifier `{}`", self.text),
            TokenKind::LabelDef => format!("label definition `{}:`", self.text),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LexState {
    Start,
    Dollar,
    NumRegStart,
    NumRegDigits,
    PicRegStart,
    PicRegDigits,
    FaceRegStart,
    FaceRegDigits,
    Num,
    NumFrac,
    Str,
    StrEnd,
    Ident,
    LabelEnd,
}

fn syntax(line: usize, col: usize, message: impl Into<String>) -> AsmError {
    AsmError::Syntax {
        line,
        col,
        message: message.into(),
    }
}

/// Emits the token accumulated in `buf` (if any) and resets to `Start`.
fn flush(
    line: usize,
    state: &mut LexState,
    buf: &mut String,
    start_col: usize,
    tokens: &mut Vec<Token>,
) -> Result<(), AsmError> {
    let kind = match *state {
        LexState::Start => {
            return Ok(());
        }
        LexState::Dollar
        | LexState::NumRegStart
        | LexState::PicRegStart
        | LexState::FaceRegStart => {
            return Err(syntax(line, start_col, "incomplete register"));
        }
        LexState::Str => {
            return Err(syntax(line, start_col, "unterminated string"));
        }
        LexState::Num | LexState::NumFrac => {
            if buf.parse::<f64>().is_err() {
                return Err(syntax(line, start_col, format!("invalid number `{buf}`")));
            }
            TokenKind::Number
        }
        LexState::NumRegDigits => TokenKind::NumReg,
        LexState::PicRegDigits => TokenKind::PicReg,
        LexState::FaceRegDigits => TokenKind::FaceReg,
        LexState::StrEnd => TokenKind::Str,
        LexState::Ident => TokenKind::Ident,
        LexState::LabelEnd => TokenKind::LabelDef,
    };
    tokens.push(Token {
        kind,
        text: std::mem::take(buf),
        col: start_col,
    });
    *state = LexState::Start;
    Ok(())
}

/// Tokenizes one comment-stripped, uppercased line.
fn tokenize(line: usize, text: &str) -> Result<Vec<Token>, AsmError> {
    let mut tokens = Vec::new();
    let mut state = LexState::Start;
    let mut buf = String::new();
    let mut start_col = 1usize;

    for (i, ch) in text.chars().enumerate() {
        let col = i + 1;
        if ch.is_whitespace() && state != LexState::Str {
            flush(line, &mut state, &mut buf, start_col, &mut tokens)?;
            continue;
        }
        state = match state {
            LexState::Start => {
                start_col = col;
                buf.clear();
                match ch {
                    '$' => LexState::Dollar,
                    '"' => LexState::Str,
                    '0'..='9' | '+' | '-' => {
                        buf.push(ch);
                        LexState::Num
                    }
                    'A'..='Z' => {
                        buf.push(ch);
                        LexState::Ident
                    }
                    _ => return Err(syntax(line, col, format!("unexpected character `{ch}`"))),
                }
            }
            LexState::Dollar => match ch {
                'R' => LexState::NumRegStart,
                'P' => LexState::PicRegStart,
                'F' => LexState::FaceRegStart,
                _ => {
                    return Err(syntax(
                        line,
                        col,
                        format!("expected R, P, or F after `$`, found `{ch}`"),
                    ))
                }
            },
            LexState::NumRegStart | LexState::NumRegDigits if ch.is_ascii_digit() => {
                buf.push(ch);
                LexState::NumRegDigits
            }
            LexState::PicRegStart | LexState::PicRegDigits if ch.is_ascii_digit() => {
                buf.push(ch);
                LexState::PicRegDigits
            }
            LexState::FaceRegStart | LexState::FaceRegDigits if ch.is_ascii_digit() => {
                buf.push(ch);
                LexState::FaceRegDigits
            }
            LexState::NumRegStart
            | LexState::NumRegDigits
            | LexState::PicRegStart
            | LexState::PicRegDigits
            | LexState::FaceRegStart
            | LexState::FaceRegDigits => {
                return Err(syntax(
                    line,
                    col,
                    format!("expected a digit in register index, found `{ch}`"),
                ));
            }
            LexState::Num => match ch {
                '0'..='9' => {
                    buf.push(ch);
                    LexState::Num
                }
                '.' => {
                    buf.push(ch);
                    LexState::NumFrac
                }
                _ => return Err(syntax(line, col, format!("unexpected `{ch}` in number"))),
            },
            LexState::NumFrac => match ch {
                '0'..='9' => {
                    buf.push(ch);
                    LexState::NumFrac
                }
                _ => return Err(syntax(line, col, format!("unexpected `{ch}` in number"))),
            },
            LexState::Str => {
                if ch == '"' {
                    LexState::StrEnd
                } else {
                    buf.push(ch);
                    LexState::Str
                }
            }
            LexState::StrEnd => {
                return Err(syntax(line, col, "expected whitespace after string"));
            }
            LexState::Ident => match ch {
                'A'..='Z' | '0'..='9' | '_' => {
                    buf.push(ch);
                    LexState::Ident
                }
                ':' => LexState::LabelEnd,
                _ => {
                    return Err(syntax(
                        line,
                        col,
                        format!("unexpected `{ch}` in identifier"),
                    ))
                }
            },
            LexState::LabelEnd => {
                return Err(syntax(line, col, "expected whitespace after label"));
            }
        };
    }
    flush(line, &mut state, &mut buf, start_col, &mut tokens)?;
    Ok(tokens)
}

/// A `#` ends the line even inside a string literal.
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn operand_type(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
    expected: &'static str,
) -> AsmError {
    AsmError::OperandType {
        line,
        col: tok.col,
        mnemonic,
        slot,
        expected,
        found: tok.describe(),
    }
}

fn parse_number(tok: &Token, line: usize) -> Result<f64, AsmError> {
    tok.text
        .parse::<f64>()
        .map_err(|_| syntax(line, tok.col, format!("invalid number `{}`", tok.text)))
}

fn parse_num_reg(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<NumReg, AsmError> {
    if tok.kind != TokenKind::NumReg {
        return Err(operand_type(tok, line, mnemonic, slot, "a numeric register"));
    }
    let index = tok.text.parse::<u32>().unwrap_or(u32::MAX);
    NumReg::new(index).ok_or_else(|| AsmError::RegisterRange {
        line,
        col: tok.col,
        register: format!("$R{}", tok.text),
        max: NUM_REGISTER_COUNT,
    })
}

fn parse_pic_reg(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<PicReg, AsmError> {
    if tok.kind != TokenKind::PicReg {
        return Err(operand_type(tok, line, mnemonic, slot, "a picture register"));
    }
    let index = tok.text.parse::<u32>().unwrap_or(u32::MAX);
    PicReg::new(index).ok_or_else(|| AsmError::RegisterRange {
        line,
        col: tok.col,
        register: format!("$P{}", tok.text),
        max: PIC_REGISTER_COUNT,
    })
}

fn parse_face_reg(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<FaceReg, AsmError> {
    if tok.kind != TokenKind::FaceReg {
        return Err(operand_type(tok, line, mnemonic, slot, "a face register"));
    }
    let index = tok.text.parse::<u32>().unwrap_or(u32::MAX);
    FaceReg::new(index).ok_or_else(|| AsmError::RegisterRange {
        line,
        col: tok.col,
        register: format!("$F{}", tok.text),
        max: FACE_REGISTER_COUNT,
    })
}

fn parse_num_source(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<NumSource, AsmError> {
    match tok.kind {
        TokenKind::Number => Ok(NumSource::Imm(parse_number(tok, line)?)),
        TokenKind::NumReg => Ok(NumSource::Reg(parse_num_reg(tok, line, mnemonic, slot)?)),
        _ => Err(operand_type(
            tok,
            line,
            mnemonic,
            slot,
            "a number or numeric register",
        )),
    }
}

fn parse_label_ref(
    tok: &Token,
    labels: &HashMap<String, usize>,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<usize, AsmError> {
    if tok.kind != TokenKind::Ident {
        return Err(operand_type(tok, line, mnemonic, slot, "a label name"));
    }
    labels
        .get(&tok.text)
        .copied()
        .ok_or_else(|| AsmError::UnresolvedLabel {
            line,
            col: tok.col,
            label: tok.text.clone(),
        })
}

fn parse_display(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<DisplayArg, AsmError> {
    match tok.kind {
        TokenKind::Number => Ok(DisplayArg::Number(parse_number(tok, line)?)),
        TokenKind::NumReg => Ok(DisplayArg::Reg(parse_num_reg(tok, line, mnemonic, slot)?)),
        TokenKind::PicReg => Ok(DisplayArg::Pic(parse_pic_reg(tok, line, mnemonic, slot)?)),
        TokenKind::Str => Ok(DisplayArg::Text(tok.text.clone())),
        _ => Err(operand_type(
            tok,
            line,
            mnemonic,
            slot,
            "a number, register, or string",
        )),
    }
}

fn parse_string(
    tok: &Token,
    line: usize,
    mnemonic: &'static str,
    slot: usize,
) -> Result<String, AsmError> {
    if tok.kind != TokenKind::Str {
        return Err(operand_type(tok, line, mnemonic, slot, "a quoted string"));
    }
    Ok(tok.text.clone())
}

// Generates `parse_op`: one match arm per opcode, pulling each operand
// through the parser its signature kind demands.
macro_rules! define_parse_op {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ]
        ),* $(,)?
    ) => {
        fn parse_op(
            opcode: Opcode,
            args: &[Token],
            labels: &HashMap<String, usize>,
            line: usize,
        ) -> Result<Op, AsmError> {
            match opcode {
                $(
                    Opcode::$name => define_parse_op!(
                        @construct $name, $mnemonic, args, labels, line; $( $field : $kind ),*
                    ),
                )*
            }
        }
    };

    (@construct $name:ident, $mn:literal, $args:ident, $labels:ident, $line:ident; ) => {
        Ok(Op::$name {})
    };

    (@construct $name:ident, $mn:literal, $args:ident, $labels:ident, $line:ident;
        $( $field:ident : $kind:ident ),+
    ) => {{
        let mut it = $args.iter();
        let mut slot = 0usize;
        Ok(Op::$name {
            $(
                $field: {
                    slot += 1;
                    // arity was checked before dispatch
                    let tok = it.next().unwrap();
                    define_parse_op!(@operand $kind, tok, $labels, $line, $mn, slot)?
                },
            )+
        })
    }};

    (@operand NumOrReg, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_num_source($tok, $line, $mn, $slot)
    };
    (@operand NumReg, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_num_reg($tok, $line, $mn, $slot)
    };
    (@operand PicReg, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_pic_reg($tok, $line, $mn, $slot)
    };
    (@operand FaceReg, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_face_reg($tok, $line, $mn, $slot)
    };
    (@operand Label, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_label_ref($tok, $labels, $line, $mn, $slot)
    };
    (@operand Show, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_display($tok, $line, $mn, $slot)
    };
    (@operand Str, $tok:ident, $labels:ident, $line:ident, $mn:literal, $slot:ident) => {
        parse_string($tok, $line, $mn, $slot)
    };
}

for_each_opcode!(define_parse_op);

fn parse_line(
    tokens: &[Token],
    labels: &HashMap<String, usize>,
    line: usize,
) -> Result<Op, AsmError> {
    let head = &tokens[0];
    if head.kind != TokenKind::Ident {
        return Err(syntax(
            line,
            head.col,
            format!("expected a command, found {}", head.describe()),
        ));
    }
    let opcode =
        Opcode::from_mnemonic(&head.text).ok_or_else(|| AsmError::UnknownCommand {
            line,
            col: head.col,
            mnemonic: head.text.clone(),
        })?;
    let args = &tokens[1..];
    if args.len() != opcode.arity() {
        return Err(AsmError::ArityMismatch {
            line,
            col: head.col,
            mnemonic: opcode.mnemonic(),
            expected: opcode.arity(),
            found: args.len(),
        });
    }
    parse_op(opcode, args, labels, line)
}

fn assemble_inner(source: &str) -> Result<Program, AsmError> {
    // Pass 1: tokenize and collect labels. A label names the index of the
    // next instruction; a label on the last line resolves past the end.
    let mut parsed: Vec<(usize, Vec<Token>)> = Vec::new();
    let mut labels: HashMap<String, usize> = HashMap::new();
    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let text = strip_comment(raw).to_ascii_uppercase();
        let mut tokens = tokenize(line_no, &text)?;
        if tokens.is_empty() {
            continue;
        }
        if tokens[0].kind == TokenKind::LabelDef {
            let tok = tokens.remove(0);
            if labels.contains_key(&tok.text) {
                return Err(AsmError::DuplicateLabel {
                    line: line_no,
                    col: tok.col,
                    label: tok.text,
                });
            }
            labels.insert(tok.text, parsed.len());
            if tokens.is_empty() {
                continue;
            }
        }
        parsed.push((line_no, tokens));
    }

    // Pass 2: validate signatures and resolve label references.
    let mut code = Vec::with_capacity(parsed.len());
    for (line_no, tokens) in &parsed {
        let op = parse_line(tokens, &labels, *line_no)?;
        code.push(Instr {
            op,
            line: *line_no,
        });
    }
    Ok(Program::new(code, labels))
}

/// Renders an assembly error with the offending source line and a caret.
fn render_diagnostic(source: &str, name: &str, err: &AsmError) -> String {
    let mut out = err.to_string();
    if let Some((line, col)) = err.location() {
        if let Some(text) = source.lines().nth(line - 1) {
            out.push_str(&format!("\n  --> {name}:{line}:{col}"));
            out.push_str(&format!("\n   | {text}"));
            out.push_str(&format!("\n   | {}^", " ".repeat(col.saturating_sub(1))));
        }
    }
    out
}

fn assemble_named(source: &str, name: &str) -> Result<Program, AsmError> {
    assemble_inner(source).map_err(|err| {
        error!("{}", render_diagnostic(source, name, &err));
        err
    })
}

/// Assembles source text into a program.
pub fn assemble_source(source: &str) -> Result<Program, AsmError> {
    assemble_named(source, "<source>")
}

/// Reads and assembles a source file.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Program, AsmError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|err| AsmError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    assemble_named(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nr(index: u32) -> NumReg {
        NumReg::new(index).unwrap()
    }

    fn pr(index: u32) -> PicReg {
        PicReg::new(index).unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(1, &source.to_ascii_uppercase())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenize_mixed_line() {
        let toks =
            tokenize(1, r#"MARK1: JUMP 12.3 -3.4 +16 $R6 $P6 $F2 "HELLO, WORLD!""#).unwrap();
        let expected = [
            (TokenKind::LabelDef, "MARK1"),
            (TokenKind::Ident, "JUMP"),
            (TokenKind::Number, "12.3"),
            (TokenKind::Number, "-3.4"),
            (TokenKind::Number, "+16"),
            (TokenKind::NumReg, "6"),
            (TokenKind::PicReg, "6"),
            (TokenKind::FaceReg, "2"),
            (TokenKind::Str, "HELLO, WORLD!"),
        ];
        assert_eq!(toks.len(), expected.len());
        for (tok, (kind, text)) in toks.iter().zip(expected) {
            assert_eq!(tok.kind, kind);
            assert_eq!(tok.text, text);
        }
    }

    #[test]
    fn tokenize_records_columns() {
        let toks = tokenize(1, "NOP  $R1").unwrap();
        assert_eq!(toks[0].col, 1);
        assert_eq!(toks[1].col, 6);
    }

    #[test]
    fn tokenize_rejects_bad_register_bank() {
        assert!(tokenize(1, "$X1").is_err());
        assert!(tokenize(1, "$R").is_err());
        assert!(tokenize(1, "$P IDENT").is_err());
    }

    #[test]
    fn tokenize_rejects_malformed_numbers() {
        assert!(tokenize(1, "3..4").is_err());
        assert!(tokenize(1, "3.4.5").is_err());
        assert!(tokenize(1, "+").is_err());
        assert!(tokenize(1, "-").is_err());
        assert!(tokenize(1, "3X").is_err());
    }

    #[test]
    fn tokenize_rejects_unterminated_string() {
        assert!(tokenize(1, "DISPLAY \"ABC").is_err());
    }

    #[test]
    fn tokenize_requires_whitespace_after_string_and_label() {
        assert!(tokenize(1, "\"AB\"X").is_err());
        assert!(tokenize(1, "FOO:BAR").is_err());
    }

    #[test]
    fn tokenize_rejects_stray_characters() {
        assert!(tokenize(1, "@").is_err());
        assert!(tokenize(1, "NOP ;").is_err());
    }

    #[test]
    fn tokenize_accepts_label_kinds() {
        assert_eq!(
            kinds("loop: add $r1 1 $r1"),
            vec![
                TokenKind::LabelDef,
                TokenKind::Ident,
                TokenKind::NumReg,
                TokenKind::Number,
                TokenKind::NumReg,
            ]
        );
    }

    #[test]
    fn empty_source_assembles_to_empty_program() {
        let prog = assemble_source("").unwrap();
        assert!(prog.is_empty());
    }

    #[test]
    fn blank_and_comment_lines_produce_no_instructions() {
        let prog = assemble_source("\n# full line comment\n   \nNOP # trailing\n").unwrap();
        assert_eq!(prog.len(), 1);
        assert_eq!(prog.get(0).map(|i| i.line), Some(4));
    }

    #[test]
    fn source_is_case_insensitive() {
        let prog = assemble_source("store 5 $r1").unwrap();
        assert_eq!(
            prog.get(0).map(|i| &i.op),
            Some(&Op::Store {
                value: NumSource::Imm(5.0),
                dst: nr(1),
            })
        );
    }

    #[test]
    fn string_literals_are_uppercased() {
        let prog = assemble_source("DISPLAY \"hello world\"").unwrap();
        assert_eq!(
            prog.get(0).map(|i| &i.op),
            Some(&Op::Display {
                value: DisplayArg::Text("HELLO WORLD".to_string()),
            })
        );
    }

    #[test]
    fn comment_truncates_string_literals() {
        // `#` wins over string syntax, leaving an unterminated literal.
        let err = assemble_source("DISPLAY \"A # B\"").unwrap_err();
        assert!(matches!(err, AsmError::Syntax { line: 1, .. }));
    }

    #[test]
    fn store_accepts_register_source() {
        let prog = assemble_source("STORE $R2 $R1").unwrap();
        assert_eq!(
            prog.get(0).map(|i| &i.op),
            Some(&Op::Store {
                value: NumSource::Reg(nr(2)),
                dst: nr(1),
            })
        );
    }

    #[test]
    fn labels_name_the_next_instruction() {
        let source = "NOP\nTOP:\nNOP\nMID: NOP\nEND:";
        let prog = assemble_source(source).unwrap();
        assert_eq!(prog.len(), 3);
        assert_eq!(prog.label("TOP"), Some(1));
        assert_eq!(prog.label("MID"), Some(2));
        // A trailing label resolves past the last instruction.
        assert_eq!(prog.label("END"), Some(3));
    }

    #[test]
    fn label_prefix_still_assembles_the_instruction() {
        let prog = assemble_source("LOOP: JUMP LOOP").unwrap();
        assert_eq!(prog.len(), 1);
        assert_eq!(prog.get(0).map(|i| &i.op), Some(&Op::Jump { target: 0 }));
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = assemble_source("A:\nNOP\nA:\n").unwrap_err();
        assert_eq!(
            err,
            AsmError::DuplicateLabel {
                line: 3,
                col: 1,
                label: "A".to_string(),
            }
        );
    }

    #[test]
    fn unresolved_label_names_the_label() {
        let err = assemble_source("JUMP NOWHERE").unwrap_err();
        assert_eq!(
            err,
            AsmError::UnresolvedLabel {
                line: 1,
                col: 6,
                label: "NOWHERE".to_string(),
            }
        );
    }

    #[test]
    fn forward_references_resolve() {
        let prog = assemble_source("JUMP END\nNOP\nEND: HALT").unwrap();
        assert_eq!(prog.get(0).map(|i| &i.op), Some(&Op::Jump { target: 2 }));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = assemble_source("NOP\nFLY 10").unwrap_err();
        assert_eq!(
            err,
            AsmError::UnknownCommand {
                line: 2,
                col: 1,
                mnemonic: "FLY".to_string(),
            }
        );
    }

    #[test]
    fn arity_is_checked() {
        let err = assemble_source("STORE 5").unwrap_err();
        assert!(matches!(
            err,
            AsmError::ArityMismatch {
                line: 1,
                mnemonic: "STORE",
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert!(assemble_source("NOP 1").is_err());
        assert!(assemble_source("ADD 1 2 $R1 $R2").is_err());
    }

    #[test]
    fn operand_kinds_are_checked() {
        let err = assemble_source("STORE $P1 $R1").unwrap_err();
        assert!(matches!(
            err,
            AsmError::OperandType {
                line: 1,
                mnemonic: "STORE",
                slot: 1,
                ..
            }
        ));
        // Math destination must be a register, not an immediate.
        assert!(assemble_source("ADD 1 2 3").is_err());
        // Branch target must be an identifier.
        let err = assemble_source("BRANCH_EQ 1 2 $R1").unwrap_err();
        assert!(matches!(
            err,
            AsmError::OperandType {
                slot: 3,
                expected: "a label name",
                ..
            }
        ));
    }

    #[test]
    fn label_definition_cannot_be_an_operand() {
        assert!(assemble_source("FOO:\nJUMP FOO:").is_err());
    }

    #[test]
    fn expected_command_diagnostic() {
        let err = assemble_source("42 NOP").unwrap_err();
        assert!(matches!(err, AsmError::Syntax { line: 1, col: 1, .. }));
    }

    #[test]
    fn register_ranges_are_checked_at_assembly() {
        for source in ["STORE 1 $R17", "STORE 1 $R0", "PUSH_PIC $P9", "STORE 1 $R99999999999"] {
            let err = assemble_source(source).unwrap_err();
            assert!(
                matches!(err, AsmError::RegisterRange { line: 1, .. }),
                "{source}: {err}"
            );
        }
        assert!(assemble_source("STORE 1 $R16").is_ok());
        assert!(assemble_source("PUSH_PIC $P8").is_ok());
    }

    #[test]
    fn display_accepts_each_operand_form() {
        let prog =
            assemble_source("DISPLAY 3.5\nDISPLAY $R2\nDISPLAY $P1\nDISPLAY \"HI\"").unwrap();
        assert_eq!(prog.len(), 4);
        assert_eq!(
            prog.get(2).map(|i| &i.op),
            Some(&Op::Display {
                value: DisplayArg::Pic(pr(1)),
            })
        );
        let err = assemble_source("DISPLAY $F1").unwrap_err();
        assert!(matches!(err, AsmError::OperandType { .. }));
    }

    #[test]
    fn vision_opcodes_assemble() {
        let source = "LOAD_PIC \"FACES.PNG\" $P1\nDETECT_FACE $P1 0 $F1\nMATCH_FACE $F1 $P1 $R1";
        let prog = assemble_source(source).unwrap();
        assert_eq!(prog.len(), 3);
        assert_eq!(
            prog.get(0).map(|i| &i.op),
            Some(&Op::LoadPic {
                path: "FACES.PNG".to_string(),
                dst: pr(1),
            })
        );
    }

    #[test]
    fn instructions_remember_their_source_line() {
        let prog = assemble_source("NOP\n\n# gap\nHALT").unwrap();
        assert_eq!(prog.get(0).map(|i| i.line), Some(1));
        assert_eq!(prog.get(1).map(|i| i.line), Some(4));
    }

    #[test]
    fn diagnostic_rendering_points_at_the_column() {
        let source = "NOP\nSTORE 1 $R99";
        let err = assemble_inner(source).unwrap_err();
        let rendered = render_diagnostic(source, "test.dasm", &err);
        assert!(rendered.contains("test.dasm:2:9"));
        assert!(rendered.contains("STORE 1 $R99"));
        assert!(rendered.lines().last().unwrap().ends_with("        ^"));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = assemble_file("/nonexistent/prog.dasm").unwrap_err();
        assert!(matches!(err, AsmError::Io { .. }));
    }
}
