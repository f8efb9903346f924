//! Command-name prefix matching and per-command argument parsing
//! (spec.md §4.2.2).

use super::ast::{Command, CommandKind, ForArg, ForParam, SetTarget, VarRef, WriteArg};
use super::error::ParseError;
use super::expr::parse_expr;
use super::grammar::Cursor;
use crate::tokenizer::TokenKind;

/// Canonical command order (spec.md §4.2.2, §9 "Prefix matching of names"):
/// ambiguity, were it possible among these eleven, resolves to the first
/// match in this list.
const COMMAND_NAMES: &[&str] = &[
    "write", "quit", "do", "if", "else", "for", "set", "new", "kill", "merge", "halt",
];

fn match_command_name(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    COMMAND_NAMES.iter().find(|n| n.starts_with(&lower)).copied()
}

/// Parses a space-separated sequence of commands from `cursor` until
/// line-end. `if`/`else`/`for`/bare-`do` each swallow every command that
/// follows them on the same line as their in-line body (spec.md §4.2.2), so
/// once one of those is parsed the loop stops.
pub fn parse_command_list(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<Command> {
    let mut out = Vec::new();
    loop {
        if cursor.at_line_end() {
            break;
        }
        let Some(cmd) = parse_one_command(cursor, errors) else {
            break;
        };
        let swallows_rest = matches!(
            cmd.kind,
            CommandKind::If(..) | CommandKind::Else(_) | CommandKind::For(..) | CommandKind::DoBlock(_)
        );
        out.push(cmd);
        if swallows_rest {
            break;
        }
        if cursor.at_line_end() {
            break;
        }
        if !cursor.skip_one_whitespace() {
            let pos = cursor.position();
            errors.push(ParseError::new(
                "expected whitespace between commands",
                pos.0,
                pos.1,
            ));
            break;
        }
    }
    out
}

fn parse_one_command(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Option<Command> {
    let pos = cursor.position();
    let name = match cursor.peek_kind() {
        Some(TokenKind::Identifier(n)) => n.clone(),
        other => {
            errors.push(ParseError::new(
                format!("Expected command name, found {other:?}"),
                pos.0,
                pos.1,
            ));
            return None;
        }
    };
    let Some(matched) = match_command_name(&name) else {
        errors.push(ParseError::new(format!("unknown command '{name}'"), pos.0, pos.1));
        return None;
    };
    cursor.bump();

    let postcond = if matches!(cursor.peek_kind(), Some(TokenKind::Colon)) {
        cursor.bump();
        Some(parse_expr(cursor, errors))
    } else {
        None
    };

    // `quit`'s value, if any, binds with no separator at all (checked
    // inline below); every other command has a mandatory single-whitespace
    // separator before its arguments (spec.md §4.2.2, §6).
    let kind = match matched {
        "write" => {
            cursor.skip_one_whitespace();
            CommandKind::Write(parse_write_args(cursor, errors))
        }
        "quit" => {
            let value = if cursor.is_whitespace() {
                None
            } else {
                Some(parse_expr(cursor, errors))
            };
            CommandKind::Quit(value)
        }
        "do" => {
            cursor.skip_one_whitespace();
            if cursor.at_line_end() {
                CommandKind::DoBlock(Vec::new())
            } else {
                CommandKind::DoCall(parse_call(cursor, errors))
            }
        }
        "if" => {
            cursor.skip_one_whitespace();
            let mut conds = vec![parse_expr(cursor, errors)];
            while matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
                cursor.bump();
                conds.push(parse_expr(cursor, errors));
            }
            let body = if cursor.skip_one_whitespace() {
                parse_command_list(cursor, errors)
            } else {
                Vec::new()
            };
            CommandKind::If(conds, body)
        }
        "else" => {
            let body = if cursor.skip_one_whitespace() {
                parse_command_list(cursor, errors)
            } else {
                Vec::new()
            };
            CommandKind::Else(body)
        }
        "for" => {
            cursor.skip_one_whitespace();
            let arg = if looks_like_for_arg(cursor) {
                Some(parse_for_arg(cursor, errors))
            } else {
                None
            };
            let body = if cursor.skip_one_whitespace() {
                parse_command_list(cursor, errors)
            } else {
                Vec::new()
            };
            CommandKind::For(arg, body)
        }
        "set" => {
            cursor.skip_one_whitespace();
            CommandKind::Set(parse_set_args(cursor, errors))
        }
        "new" => {
            cursor.skip_one_whitespace();
            CommandKind::New(parse_name_list(cursor, errors))
        }
        "kill" => {
            cursor.skip_one_whitespace();
            CommandKind::Kill(parse_var_list(cursor, errors))
        }
        "merge" => {
            cursor.skip_one_whitespace();
            let dst = parse_var_ref(cursor, errors);
            if matches!(cursor.peek_kind(), Some(TokenKind::Eq)) {
                cursor.bump();
            } else {
                let p = cursor.position();
                errors.push(ParseError::new("expected '=' in merge", p.0, p.1));
            }
            let src = parse_var_ref(cursor, errors);
            CommandKind::Merge(dst, src)
        }
        "halt" => CommandKind::Halt,
        _ => unreachable!(),
    };

    Some(Command {
        kind,
        postcond,
        position: pos,
    })
}

/// True when what follows looks like a `for`-argument (`identifier=...`,
/// glued with no space) rather than the start of an in-line body command
/// (spec.md §4.2.2).
fn looks_like_for_arg(cursor: &Cursor<'_>) -> bool {
    matches!(cursor.peek_kind(), Some(TokenKind::Identifier(_)))
        && matches!(cursor.peek_ahead(1), Some(TokenKind::Eq))
}

fn parse_write_args(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<WriteArg> {
    let mut out = Vec::new();
    loop {
        if cursor.at_line_end() || cursor.is_whitespace() {
            break;
        }
        match cursor.peek_kind() {
            Some(TokenKind::Hash) => {
                cursor.bump();
                out.push(WriteArg::Reset);
            }
            Some(TokenKind::Bang) => {
                cursor.bump();
                out.push(WriteArg::Newline);
            }
            Some(TokenKind::Question) => {
                cursor.bump();
                out.push(WriteArg::Pad(parse_expr(cursor, errors)));
            }
            _ => out.push(WriteArg::Expr(parse_expr(cursor, errors))),
        }
        if matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
            cursor.bump();
        } else {
            break;
        }
    }
    out
}

fn parse_set_args(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<(SetTarget, super::ast::Expr)> {
    let mut out = Vec::new();
    loop {
        if cursor.at_line_end() || cursor.is_whitespace() {
            break;
        }
        let target = parse_set_target(cursor, errors);
        if matches!(cursor.peek_kind(), Some(TokenKind::Eq)) {
            cursor.bump();
        } else {
            let p = cursor.position();
            errors.push(ParseError::new("expected '=' in set", p.0, p.1));
        }
        let value = parse_expr(cursor, errors);
        out.push((target, value));
        if matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
            cursor.bump();
        } else {
            break;
        }
    }
    out
}

fn parse_set_target(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> SetTarget {
    if matches!(cursor.peek_kind(), Some(TokenKind::Dollar)) {
        let pos = cursor.position();
        cursor.bump();
        let name = match cursor.peek_kind() {
            Some(TokenKind::Identifier(n)) => {
                let n = n.clone();
                cursor.bump();
                n
            }
            _ => {
                errors.push(ParseError::new("expected builtin name after '$'", pos.0, pos.1));
                String::new()
            }
        };
        if !"extract".starts_with(&name.to_ascii_lowercase()) || name.is_empty() {
            errors.push(ParseError::new(
                "only $E is valid as a set target",
                pos.0,
                pos.1,
            ));
        }
        let mut args = Vec::new();
        if matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
            cursor.bump();
            loop {
                args.push(parse_expr(cursor, errors));
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
        let var = if args.is_empty() {
            VarRef::bare("", pos)
        } else {
            match args.remove(0) {
                super::ast::Expr::Var(v) => v,
                _ => {
                    errors.push(ParseError::new("$E target must be a variable", pos.0, pos.1));
                    VarRef::bare("", pos)
                }
            }
        };
        let end = if args.len() > 1 { Some(Box::new(args.remove(1))) } else { None };
        let start = if !args.is_empty() { Some(Box::new(args.remove(0))) } else { None };
        let start = start.unwrap_or_else(|| Box::new(super::ast::Expr::Num(1.0)));
        SetTarget::Extract(var, start, end)
    } else {
        SetTarget::Var(parse_var_ref(cursor, errors))
    }
}

fn parse_var_ref(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> VarRef {
    let pos = cursor.position();
    match parse_expr(cursor, errors) {
        super::ast::Expr::Var(v) => v,
        _ => {
            errors.push(ParseError::new("expected a variable", pos.0, pos.1));
            VarRef::bare("", pos)
        }
    }
}

fn parse_var_list(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<VarRef> {
    let mut out = Vec::new();
    loop {
        if cursor.at_line_end() || cursor.is_whitespace() {
            break;
        }
        out.push(parse_var_ref(cursor, errors));
        if matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
            cursor.bump();
        } else {
            break;
        }
    }
    out
}

fn parse_name_list(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        if cursor.at_line_end() || cursor.is_whitespace() {
            break;
        }
        match cursor.peek_kind() {
            Some(TokenKind::Identifier(n)) => {
                out.push(n.clone());
                cursor.bump();
            }
            _ => {
                let p = cursor.position();
                errors.push(ParseError::new("expected an identifier", p.0, p.1));
                break;
            }
        }
        if matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
            cursor.bump();
        } else {
            break;
        }
    }
    out
}

fn parse_for_arg(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> ForArg {
    let pos = cursor.position();
    let var = match cursor.peek_kind() {
        Some(TokenKind::Identifier(n)) => {
            let n = n.clone();
            cursor.bump();
            n
        }
        _ => {
            errors.push(ParseError::new("expected a variable in 'for'", pos.0, pos.1));
            String::new()
        }
    };
    if matches!(cursor.peek_kind(), Some(TokenKind::Eq)) {
        cursor.bump();
    } else {
        let p = cursor.position();
        errors.push(ParseError::new("expected '=' in 'for'", p.0, p.1));
    }
    let mut params = vec![parse_for_param(cursor, errors)];
    while matches!(cursor.peek_kind(), Some(TokenKind::Comma)) {
        cursor.bump();
        params.push(parse_for_param(cursor, errors));
    }
    ForArg { var, params }
}

fn parse_for_param(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> ForParam {
    let start = parse_expr(cursor, errors);
    if !matches!(cursor.peek_kind(), Some(TokenKind::Colon)) {
        return ForParam::Start(start);
    }
    cursor.bump();
    let step = parse_expr(cursor, errors);
    if !matches!(cursor.peek_kind(), Some(TokenKind::Colon)) {
        return ForParam::StartStep(start, step);
    }
    cursor.bump();
    let limit = parse_expr(cursor, errors);
    ForParam::StartStepLimit(start, step, limit)
}

fn parse_call(cursor: &mut Cursor<'_>, errors: &mut Vec<ParseError>) -> super::ast::CallExpr {
    let pos = cursor.position();
    let name = match cursor.peek_kind() {
        Some(TokenKind::Identifier(n)) => {
            let n = n.clone();
            cursor.bump();
            n
        }
        _ => {
            errors.push(ParseError::new("expected a tag name after 'do'", pos.0, pos.1));
            String::new()
        }
    };
    let mut args = Vec::new();
    if matches!(cursor.peek_kind(), Some(TokenKind::LParen)) {
        cursor.bump();
        if !matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
            loop {
                if matches!(cursor.peek_kind(), Some(TokenKind::Dot)) {
                    cursor.bump();
                    match cursor.peek_kind() {
                        Some(TokenKind::Identifier(n)) => {
                            args.push(super::ast::CallArg::Ref(n.clone()));
                            cursor.bump();
                        }
                        _ => {
                            let p = cursor.position();
                            errors.push(ParseError::new("expected identifier after '.'", p.0, p.1));
                        }
                    }
                } else {
                    args.push(super::ast::CallArg::Expr(parse_expr(cursor, errors)));
                }
                match cursor.peek_kind() {
                    Some(TokenKind::Comma) => {
                        cursor.bump();
                    }
                    Some(TokenKind::RParen) => break,
                    _ => {
                        let p = cursor.position();
                        errors.push(ParseError::new("expected ',' or ')'", p.0, p.1));
                        break;
                    }
                }
            }
        }
        if matches!(cursor.peek_kind(), Some(TokenKind::RParen)) {
            cursor.bump();
        }
    }
    super::ast::CallExpr { name, args, position: pos }
}
