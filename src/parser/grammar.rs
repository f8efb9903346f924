//! Line/indentation protocol and the token cursor shared by [`super::command`]
//! and [`super::expr`] (spec.md §4.2.1).

use super::ast::{CommandKind, Position, TagInfo, TopLevel};
use super::command::parse_command_list;
use super::error::ParseError;
use crate::tokenizer::{tokenize, Line, Token, TokenKind};
use std::collections::HashMap;

/// A read-only walk over one line's remaining tokens. Both command and
/// expression parsing share this cursor so that "whitespace ends the
/// current argument" is enforced in one place.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    pub fn peek_ahead(&self, n: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    pub fn bump(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// The position of the next token, or the end-of-line position if none
    /// remain.
    pub fn position(&self) -> Position {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.position)
            .unwrap_or((0, 0))
    }

    /// True once only a (possibly empty) `TrailingWhitespace`/`Comment`
    /// remains — a trailing comment carries no grammar of its own.
    pub fn at_line_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(TokenKind::TrailingWhitespace(_)) | Some(TokenKind::Comment(_))
        )
    }

    /// True at a point where a new command name may start: either at
    /// line-end, or right after a single whitespace run.
    pub fn is_whitespace(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(TokenKind::Space(_)) | Some(TokenKind::TrailingWhitespace(_)) | Some(TokenKind::Comment(_)) | None
        )
    }

    /// Consumes exactly one whitespace token (`Space` or `TrailingWhitespace`),
    /// the separator spec.md §6 calls "a single run of whitespace".
    pub fn skip_one_whitespace(&mut self) -> bool {
        if matches!(self.peek_kind(), Some(TokenKind::Space(_))) {
            self.bump();
            true
        } else {
            false
        }
    }
}

enum LineKind<'a> {
    Blank,
    Tag {
        name: String,
        params: Vec<String>,
        rest: &'a [Token],
    },
    Body {
        level: usize,
        rest: &'a [Token],
    },
}

fn is_meaningful(tokens: &[Token]) -> bool {
    !tokens.iter().all(|t| {
        matches!(
            t.kind,
            TokenKind::TrailingWhitespace(_) | TokenKind::Space(_) | TokenKind::Comment(_)
        )
    })
}

fn classify(line: &Line, errors: &mut Vec<ParseError>) -> LineKind<'_> {
    if line.is_empty() || !is_meaningful(line) {
        return LineKind::Blank;
    }

    match &line[0].kind {
        TokenKind::Identifier(name) => {
            let name = name.clone();
            let mut idx = 1;
            let mut params = Vec::new();
            if matches!(line.get(idx).map(|t| &t.kind), Some(TokenKind::LParen)) {
                idx += 1;
                loop {
                    match line.get(idx).map(|t| &t.kind) {
                        Some(TokenKind::Identifier(p)) => {
                            params.push(p.clone());
                            idx += 1;
                        }
                        Some(TokenKind::Comma) => {
                            idx += 1;
                        }
                        Some(TokenKind::RParen) => {
                            idx += 1;
                            break;
                        }
                        _ => {
                            let pos = line.get(idx).map(|t| t.position).unwrap_or(line[0].position);
                            errors.push(ParseError::new("unterminated parameter list", pos.0, pos.1));
                            break;
                        }
                    }
                }
            }
            if idx < line.len() && !is_meaningful(&line[idx..]) {
                idx = line.len();
            } else if idx < line.len() && !matches!(line[idx].kind, TokenKind::Space(_)) {
                let pos = line[idx].position;
                errors.push(ParseError::new(
                    "expected whitespace after tag name",
                    pos.0,
                    pos.1,
                ));
            } else if idx < line.len() {
                idx += 1; // the separating space itself
            }
            LineKind::Tag {
                name,
                params,
                rest: &line[idx..],
            }
        }
        TokenKind::LeadingWhitespace(_) => {
            let mut idx = 1;
            let mut level = 0;
            loop {
                match line.get(idx).map(|t| &t.kind) {
                    Some(TokenKind::Dot) => {
                        let dot_pos = line[idx].position;
                        level += 1;
                        idx += 1;
                        match line.get(idx).map(|t| &t.kind) {
                            Some(TokenKind::Space(_)) => idx += 1,
                            Some(TokenKind::Dot) | None => {
                                errors.push(ParseError::new(
                                    "missing space after '.' indent marker",
                                    dot_pos.0,
                                    dot_pos.1,
                                ));
                            }
                            _ => idx += 1,
                        }
                    }
                    _ => break,
                }
            }
            LineKind::Body {
                level,
                rest: &line[idx..],
            }
        }
        other => {
            let pos = line[0].position;
            errors.push(ParseError::new(
                format!("Expected command name, found {other:?}"),
                pos.0,
                pos.1,
            ));
            LineKind::Blank
        }
    }
}

/// Parses an entire source string into a [`TopLevel`] plus any recoverable
/// parse errors (spec.md §2, §7).
pub fn parse(source: &str) -> (TopLevel, Vec<ParseError>) {
    let lines = tokenize(source);
    let mut errors = Vec::new();
    let mut top = TopLevel::default();

    let mut classified = lines
        .iter()
        .map(|l| classify(l, &mut errors))
        .collect::<Vec<_>>();
    let mut i = 0;
    while i < classified.len() {
        match std::mem::replace(&mut classified[i], LineKind::Blank) {
            LineKind::Blank => i += 1,
            LineKind::Tag { name, params, rest } => {
                let index = top.commands.len();
                top.tags.insert(name, TagInfo { index, params });
                let mut cursor = Cursor::new(rest);
                top.commands.extend(parse_command_list(&mut cursor, &mut errors));
                i += 1;
            }
            LineKind::Body { level, rest } => {
                if level != 0 {
                    let pos = rest.first().map(|t| t.position).unwrap_or((i, 0));
                    errors.push(ParseError::new("unexpected indentation", pos.0, pos.1));
                }
                let mut cursor = Cursor::new(rest);
                let mut cmds = parse_command_list(&mut cursor, &mut errors);
                i += 1;
                fill_do_blocks(&mut cmds, &classified, &mut i, level, &mut errors);
                top.commands.extend(cmds);
            }
        }
    }

    (top, errors)
}

/// Fills in the children of any [`CommandKind::DoBlock`] markers left empty
/// by [`parse_command_list`], consuming subsequent lines whose dot-prefix is
/// deeper than `level` (spec.md §4.2.1).
fn fill_do_blocks(
    cmds: &mut [super::ast::Command],
    classified: &[LineKind<'_>],
    i: &mut usize,
    level: usize,
    errors: &mut Vec<ParseError>,
) {
    for cmd in cmds.iter_mut() {
        if let CommandKind::DoBlock(children) = &mut cmd.kind {
            *children = parse_block(classified, i, level + 1, errors);
        }
    }
}

fn parse_block(
    classified: &[LineKind<'_>],
    i: &mut usize,
    level: usize,
    errors: &mut Vec<ParseError>,
) -> Vec<super::ast::Command> {
    let mut out = Vec::new();
    while *i < classified.len() {
        match &classified[*i] {
            LineKind::Blank => {
                *i += 1;
            }
            LineKind::Tag { .. } => break,
            LineKind::Body { level: l, .. } if *l < level => break,
            LineKind::Body { level: l, rest } => {
                let extra = *l - level;
                let rest = *rest;
                if extra != 0 {
                    let pos = rest.first().map(|t| t.position).unwrap_or((*i, 0));
                    errors.push(ParseError::new("unexpected indentation", pos.0, pos.1));
                }
                let mut cursor = Cursor::new(rest);
                let mut cmds = parse_command_list(&mut cursor, errors);
                *i += 1;
                fill_do_blocks(&mut cmds, classified, i, level, errors);
                out.extend(cmds);
            }
        }
    }
    out
}
