//! Parser for the tree command language.
//!
//! One command per line, `#` starts a comment. Nodes are addressed by path from
//! the root: `.` is the root, `L`/`R` characters descend left/right (`LR` is
//! the right child of the root's left child).

use std::mem;

use crate::domain::Side;
use crate::script::ScriptError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New(String),
    Destroy,
    Insert {
        path: Vec<Side>,
        side: Side,
        value: String,
    },
    Set {
        path: Vec<Side>,
        value: String,
    },
    Delete {
        path: Vec<Side>,
    },
    Print,
    Show,
    Dump,
    ExpectSize(usize),
}

/// A parsed command with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub command: Command,
}

pub fn parse_script(source: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    for (idx, text) in source.lines().enumerate() {
        let number = idx + 1;
        if let Some(command) = parse_line(text, number)? {
            lines.push(Line { number, command });
        }
    }
    Ok(lines)
}

/// Parses one line; blank and comment-only lines yield `None`.
pub fn parse_line(text: &str, number: usize) -> Result<Option<Command>, ScriptError> {
    let tokens = tokenize(text, number)?;
    let Some((keyword, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let parse_err = |message: String| ScriptError::Parse { line: number, message };
    let expect_args = |n: usize, usage: &str| {
        if args.len() == n {
            Ok(())
        } else {
            Err(parse_err(format!("usage: {}", usage)))
        }
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "new" => {
            expect_args(1, "new <value>")?;
            Command::New(args[0].clone())
        }
        "destroy" => {
            expect_args(0, "destroy")?;
            Command::Destroy
        }
        "insert" => {
            expect_args(3, "insert <path> <left|right> <value>")?;
            Command::Insert {
                path: parse_path(&args[0], number)?,
                side: args[1].parse().map_err(|e| parse_err(format!("{}", e)))?,
                value: args[2].clone(),
            }
        }
        "set" => {
            expect_args(2, "set <path> <value>")?;
            Command::Set {
                path: parse_path(&args[0], number)?,
                value: args[1].clone(),
            }
        }
        "delete" => {
            expect_args(1, "delete <path>")?;
            Command::Delete {
                path: parse_path(&args[0], number)?,
            }
        }
        "print" => {
            expect_args(0, "print")?;
            Command::Print
        }
        "show" => {
            expect_args(0, "show")?;
            Command::Show
        }
        "dump" => {
            expect_args(0, "dump")?;
            Command::Dump
        }
        "expect-size" => {
            expect_args(1, "expect-size <n>")?;
            let n = args[0]
                .parse()
                .map_err(|_| parse_err(format!("invalid size '{}'", args[0])))?;
            Command::ExpectSize(n)
        }
        other => return Err(parse_err(format!("unknown command '{}'", other))),
    };

    Ok(Some(command))
}

/// `.` for the root, otherwise a run of `L`/`R` (case-insensitive).
pub fn parse_path(text: &str, number: usize) -> Result<Vec<Side>, ScriptError> {
    if text == "." {
        return Ok(Vec::new());
    }
    text.chars()
        .map(|c| match c {
            'L' | 'l' => Ok(Side::Left),
            'R' | 'r' => Ok(Side::Right),
            _ => Err(ScriptError::Parse {
                line: number,
                message: format!("invalid path '{}' (use '.' or L/R steps)", text),
            }),
        })
        .collect()
}

/// Renders a path back to its textual form.
pub fn format_path(path: &[Side]) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    path.iter()
        .map(|side| match side {
            Side::Left => 'L',
            Side::Right => 'R',
        })
        .collect()
}

/// Splits on whitespace, honouring double quotes. An unquoted `#` at the start
/// of a token ends the line.
fn tokenize(text: &str, number: usize) -> Result<Vec<String>, ScriptError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            '#' if !in_quotes && !in_token => break,
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ScriptError::Parse {
            line: number,
            message: "unterminated quote".to_string(),
        });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
