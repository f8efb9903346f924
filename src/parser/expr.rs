//! Expression grammar: left-to-right, no precedence except explicit
//! parentheses (spec.md §4.2.4), plus the call/builtin/variable forms it is
//! built from.

use super::ast::{Builtin, BinOp, CallArg, CallExpr, Expr, UnaryOp, VarRef};
use super::error::ParseError;
use super::grammar::Cursor;
use crate::tokenizer::TokenKind;

fn binop_for(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Bang => Some(BinOp::Or),
        TokenKind::Amp => Some(BinOp::And),
        TokenKind::Eq => Some(BinOp::Eq),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        TokenKind::StarStar => Some(BinOp::Pow),
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Backslash => Some(BinOp::IntDiv),
        TokenKind::Hash => Some(BinOp::Mod),
        TokenKind::Underscore => Some(BinOp::Concat),
        _ => None,
    }
}

/// Parses a full left-to-right expression: a primary (possibly preceded by
/// unary operators), then zero or more `(op, primary)` pairs applied
/// strictly in order (spec.md §4.2.4).
pub fn parse_expr(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Expr {
    let mut left = parse_unary(cursor, errors);
    loop {
        // A leading `'` negates the binary comparison it precedes (spec.md
        // §4.2.4); only treat it that way when a binary operator genuinely
        // follows, otherwise it belongs to the next unary-not primary.
        let negated = matches!(cursor.peek_kind(), Some(TokenKind::Apostrophe))
            && cursor.peek_ahead(1).and_then(binop_for).is_some();
        let op_start = cursor.position();
        if negated {
            cursor.bump();
        }
        let Some(kind) = cursor.peek_kind().cloned() else { break };
        let Some(op) = binop_for(&kind) else { break };
        cursor.bump();
        let right = parse_unary(cursor, errors);
        left = Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            negated,
            position: op_start,
        };
    }
    left
}

/// Parses an optional chain of unary prefix operators followed by one
/// primary expression.
fn parse_unary(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Expr {
    let pos = cursor.position();
    match cursor.peek_kind() {
        Some(TokenKind::Apostrophe) => {
            cursor.bump();
            Expr::Unary(UnaryOp::Not, Box::new(parse_unary(cursor, errors)), pos)
        }
        Some(TokenKind::Plus) => {
            cursor.bump();
            Expr::Unary(UnaryOp::Plus, Box::new(parse_unary(cursor, errors)), pos)
        }
        Some(TokenKind::Minus) => {
            cursor.bump();
            Expr::Unary(UnaryOp::Minus, Box::new(parse_unary(cursor, errors)), pos)
        }
        _ => parse_primary(cursor, errors),
    }
}

fn parse_primary(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Expr {
    let pos = cursor.position();
    match cursor.peek_kind() {
        Some(TokenKind::Number(n)) => {
            let n = *n;
            cursor.bump();
            Expr::Num(n)
        }
        Some(TokenKind::Str(s)) => {
            let s = s.clone();
            cursor.bump();
            Expr::Str(s)
        }
        Some(TokenKind::LParen) => {
            cursor.bump();
            let inner = parse_expr(cursor, errors);
            if matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
                cursor.bump();
            } else {
                errors.push(ParseError::new("unterminated parenthesis", pos.0, pos.1));
            }
            Expr::Paren(Box::new(inner))
        }
        Some(TokenKind::Dollar) => parse_dollar(cursor, errors),
        Some(TokenKind::Identifier(name)) => {
            let name = name.clone();
            cursor.bump();
            let subscripts = parse_subscripts(cursor, errors);
            Expr::Var(VarRef {
                name,
                subscripts,
                position: pos,
            })
        }
        _ => {
            errors.push(ParseError::new("expected an expression", pos.0, pos.1));
            Expr::Str(String::new())
        }
    }
}

/// Parses `(e1, e2, ...)` as a subscript list, or returns empty if no `(`
/// follows (spec.md §4.3.3).
fn parse_subscripts(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<Expr> {
    if !matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
        return Vec::new();
    }
    cursor.bump();
    let mut out = Vec::new();
    if matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
        cursor.bump();
        return out;
    }
    loop {
        out.push(parse_expr(cursor, errors));
        match cursor.peek_kind() {
            Some(TokenKind::Comma) => {
                cursor.bump();
            }
            Some(TokenKind::RParen) => {
                cursor.bump();
                break;
            }
            _ => {
                let pos = cursor.position();
                errors.push(ParseError::new("expected ',' or ')'", pos.0, pos.1));
                break;
            }
        }
    }
    out
}

/// Parses anything starting with `$`: a builtin call, a `$$tag(...)`
/// value-returning call, or the `$TEST` pseudo-read used by conditionals
/// handled directly in `exec` (spec.md §4.2.3).
fn parse_dollar(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Expr {
    let pos = cursor.position();
    cursor.bump(); // '$'
    let double = matches!(cursor.peek_kind(), Some(TokenKind::Dollar));
    if double {
        cursor.bump();
    }
    let name = match cursor.peek_kind() {
        Some(TokenKind::Identifier(n)) => {
            let n = n.clone();
            cursor.bump();
            n
        }
        _ => {
            errors.push(ParseError::new("expected a name after '$'", pos.0, pos.1));
            String::new()
        }
    };
    if double {
        let args = parse_call_args(cursor, errors);
        return Expr::Call(CallExpr {
            name,
            args,
            position: pos,
        });
    }
    parse_builtin(name, pos, cursor, errors)
}

fn parse_call_args(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<CallArg> {
    let mut out = Vec::new();
    if !matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
        return out;
    }
    cursor.bump();
    if matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
        cursor.bump();
        return out;
    }
    loop {
        if matches!(cursor.peek_kind(), Some(TokenKind::Dot)) {
            cursor.bump();
            match cursor.peek_kind() {
                Some(TokenKind::Identifier(n)) => {
                    out.push(CallArg::Ref(n.clone()));
                    cursor.bump();
                }
                _ => {
                    let pos = cursor.position();
                    errors.push(ParseError::new("expected identifier after '.'", pos.0, pos.1));
                }
            }
        } else {
            out.push(CallArg::Expr(parse_expr(cursor, errors)));
        }
        match cursor.peek_kind() {
            Some(TokenKind::Comma) => {
                cursor.bump();
            }
            Some(TokenKind::RParen) => {
                cursor.bump();
                break;
            }
            _ => {
                let pos = cursor.position();
                errors.push(ParseError::new("expected ',' or ')'", pos.0, pos.1));
                break;
            }
        }
    }
    out
}

const BUILTIN_NAMES: &[&str] = &[
    "order", "length", "extract", "select", "find", "random", "ascii", "char",
];

fn match_builtin_name(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    BUILTIN_NAMES.iter().find(|n| n.starts_with(&lower)).copied()
}

fn parse_plain_args(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<Expr> {
    let mut out = Vec::new();
    if !matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
        return out;
    }
    cursor.bump();
    if matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
        cursor.bump();
        return out;
    }
    loop {
        out.push(parse_expr(cursor, errors));
        match cursor.peek_kind() {
            Some(TokenKind::Comma) => {
                cursor.bump();
            }
            Some(TokenKind::RParen) => {
                cursor.bump();
                break;
            }
            _ => {
                let pos = cursor.position();
                errors.push(ParseError::new("expected ',' or ')'", pos.0, pos.1));
                break;
            }
        }
    }
    out
}

fn parse_builtin(name: String, pos: super::ast::Position, cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Expr {
    let Some(matched) = match_builtin_name(&name) else {
        errors.push(ParseError::new(format!("unknown builtin '${name}'"), pos.0, pos.1));
        return Expr::Builtin(Builtin::Length(Box::new(Expr::Str(String::new()))), pos);
    };

    let builtin = match matched {
        "order" => {
            if !matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
                errors.push(ParseError::new("$O requires a variable argument", pos.0, pos.1));
                Builtin::Order(VarRef::bare("", pos), None)
            } else {
                cursor.bump();
                let var_pos = cursor.position();
                let var = match cursor.peek_kind() {
                    Some(TokenKind::Identifier(n)) => {
                        let n = n.clone();
                        cursor.bump();
                        VarRef {
                            name: n,
                            subscripts: parse_subscripts(cursor, errors),
                            position: var_pos,
                        }
                    }
                    _ => {
                        errors.push(ParseError::new("$O argument must be a variable", var_pos.0, var_pos.1));
                        VarRef::bare("", var_pos)
                    }
                };
                if var.subscripts.is_empty() {
                    errors.push(ParseError::new("$O requires a subscripted variable", var_pos.0, var_pos.1));
                }
                let dir = if matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
                    cursor.bump();
                    Some(Box::new(parse_expr(cursor, errors)))
                } else {
                    None
                };
                if matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
                    cursor.bump();
                } else {
                    errors.push(ParseError::new("expected ')'", cursor.position().0, cursor.position().1));
                }
                Builtin::Order(var, dir)
            }
        }
        "length" => {
            let mut args = parse_plain_args(cursor, errors);
            if args.len() != 1 {
                errors.push(ParseError::new("$L takes exactly 1 argument", pos.0, pos.1));
                args.resize_with(1, || Expr::Str(String::new()));
            }
            Builtin::Length(Box::new(args.remove(0)))
        }
        "extract" => {
            let mut args = parse_plain_args(cursor, errors);
            if args.is_empty() || args.len() > 3 {
                errors.push(ParseError::new("$E takes 1 to 3 arguments", pos.0, pos.1));
                args.resize_with(1, || Expr::Str(String::new()));
            }
            let end = if args.len() > 2 { Some(Box::new(args.remove(2))) } else { None };
            let start = if args.len() > 1 { Some(Box::new(args.remove(1))) } else { None };
            Builtin::Extract(Box::new(args.remove(0)), start, end)
        }
        "select" => {
            let mut out = Vec::new();
            if matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
                cursor.bump();
                loop {
                    let cond = parse_expr(cursor, errors);
                    if matches!(cursor.peek_kind(), Some(TokenKind::Colon)) {
                        cursor.bump();
                    } else {
                        errors.push(ParseError::new("expected ':' in $S pair", cursor.position().0, cursor.position().1));
                    }
                    let value = parse_expr(cursor, errors);
                    out.push((cond, value));
                    match cursor.peek_kind() {
                        Some(TokenKind::Comma) => {
                            cursor.bump();
                        }
                        Some(TokenKind::RParen) => {
                            cursor.bump();
                            break;
                        }
                        _ => {
                            errors.push(ParseError::new("expected ',' or ')'", cursor.position().0, cursor.position().1));
                            break;
                        }
                    }
                }
            }
            Builtin::Select(out)
        }
        "find" => {
            let mut args = parse_plain_args(cursor, errors);
            if args.len() < 2 || args.len() > 3 {
                errors.push(ParseError::new("$F takes 2 or 3 arguments", pos.0, pos.1));
                args.resize_with(2, || Expr::Str(String::new()));
            }
            let start = if args.len() > 2 { Some(Box::new(args.remove(2))) } else { None };
            let needle = Box::new(args.remove(1));
            let hay = Box::new(args.remove(0));
            Builtin::Find(hay, needle, start)
        }
        "random" => {
            let mut args = parse_plain_args(cursor, errors);
            if args.len() != 1 {
                errors.push(ParseError::new("$R takes exactly 1 argument", pos.0, pos.1));
                args.resize_with(1, || Expr::Num(0.0));
            }
            Builtin::Random(Box::new(args.remove(0)))
        }
        "ascii" => {
            let mut args = parse_plain_args(cursor, errors);
            if args.len() != 1 {
                errors.push(ParseError::new("$A takes exactly 1 argument", pos.0, pos.1));
                args.resize_with(1, || Expr::Str(String::new()));
            }
            Builtin::Ascii(Box::new(args.remove(0)))
        }
        "char" => {
            let mut args = parse_plain_args(cursor, errors);
            if args.len() != 1 {
                errors.push(ParseError::new("$C takes exactly 1 argument", pos.0, pos.1));
                args.resize_with(1, || Expr::Num(0.0));
            }
            Builtin::Char(Box::new(args.remove(0)))
        }
        _ => unreachable!(),
    };
    Expr::Builtin(builtin, pos)
}
