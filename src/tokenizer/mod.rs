//! Line-oriented tokenizer (spec.md §4.1).
//!
//! Produces a two-dimensional token stream: an ordered sequence of lines,
//! each an ordered sequence of [`Token`]s. Whitespace, including leading
//! and trailing runs, is preserved as explicit tokens because the parser
//! treats whitespace itself as a statement/argument separator.

mod token;

pub use token::*;

use std::iter::Peekable;
use std::str::Chars;

/// One line's worth of tokens, in source order.
pub type Line = Vec<Token>;

/// Scans a full source string into a grid of tokens, one `Line` per
/// newline-separated physical line. Never panics; unterminated strings and
/// unparsable numbers degrade to the longest token the scanner could make
/// sense of rather than aborting tokenization (spec.md §7: the tokenizer's
/// own lexical errors are out of scope for this crate, but a crate that
/// stops tokenizing outright on malformed input would make every later
/// stage unusable).
pub fn tokenize(source: &str) -> Vec<Line> {
    source
        .split('\n')
        .enumerate()
        .map(|(line_no, text)| LineScanner::new(text, line_no).scan())
        .collect()
}

struct LineScanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
    tokens: Line,
}

impl<'a> LineScanner<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        Self {
            chars: text.chars().peekable(),
            line,
            col: 0,
            tokens: Vec::new(),
        }
    }

    fn pos(&self) -> Position {
        (self.line, self.col)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.col += 1;
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn scan(mut self) -> Line {
        if matches!(self.peek(), Some(c) if c == ' ' || c == '\t') {
            let pos = self.pos();
            let ws = self.take_while(|c| c == ' ' || c == '\t');
            self.tokens.push(Token::new(TokenKind::LeadingWhitespace(ws), pos));
        }

        loop {
            let Some(c) = self.peek() else {
                self.tokens
                    .push(Token::new(TokenKind::TrailingWhitespace(String::new()), self.pos()));
                break;
            };

            if c == ' ' || c == '\t' {
                let pos = self.pos();
                let ws = self.take_while(|c| c == ' ' || c == '\t');
                if self.peek().is_none() {
                    self.tokens.push(Token::new(TokenKind::TrailingWhitespace(ws), pos));
                    break;
                }
                self.tokens.push(Token::new(TokenKind::Space(ws), pos));
                continue;
            }

            if c == ';' {
                let pos = self.pos();
                let rest = self.take_while(|_| true);
                self.tokens.push(Token::new(TokenKind::Comment(rest), pos));
                continue;
            }

            if c.is_ascii_alphabetic() {
                self.scan_identifier();
                continue;
            }

            if c.is_ascii_digit() || (c == '.' && self.starts_number_after_dot()) {
                self.scan_number();
                continue;
            }

            if c == '"' {
                self.scan_string();
                continue;
            }

            self.scan_punctuation();
        }

        self.tokens
    }

    /// `.5` is a number; a bare `.` (indent marker / member access) is not.
    fn starts_number_after_dot(&mut self) -> bool {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        matches!(lookahead.peek(), Some(c) if c.is_ascii_digit())
    }

    fn scan_identifier(&mut self) {
        let pos = self.pos();
        let text = self.take_while(|c| c.is_ascii_alphabetic());
        self.tokens.push(Token::new(TokenKind::Identifier(text), pos));
    }

    fn scan_number(&mut self) {
        let pos = self.pos();
        let mut text = self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let has_sign = matches!(lookahead.peek(), Some('+') | Some('-'));
            if has_sign {
                lookahead.next();
            }
            if matches!(lookahead.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.bump().unwrap());
                if has_sign {
                    text.push(self.bump().unwrap());
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            }
        }
        let value = text.parse::<f64>().unwrap_or(0.0);
        self.tokens.push(Token::new(TokenKind::Number(value), pos));
    }

    fn scan_string(&mut self) {
        let pos = self.pos();
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => break,
                Some('"') => {
                    self.bump();
                    if self.peek() == Some('"') {
                        value.push('"');
                        self.bump();
                        continue;
                    }
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        self.tokens.push(Token::new(TokenKind::Str(value), pos));
    }

    fn scan_punctuation(&mut self) {
        let pos = self.pos();
        let c = self.bump().expect("scan_punctuation called at end of line");
        let kind = match c {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '=' => TokenKind::Eq,
            '$' => TokenKind::Dollar,
            '\'' => TokenKind::Apostrophe,
            '_' => TokenKind::Underscore,
            '#' => TokenKind::Hash,
            '!' => TokenKind::Bang,
            '?' => TokenKind::Question,
            '\\' => TokenKind::Backslash,
            '/' => TokenKind::Slash,
            '*' => {
                if self.peek() == Some('*') {
                    self.bump();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '&' => TokenKind::Amp,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            other => {
                log::debug!("unrecognized character '{other}' at {}:{}", pos.0, pos.1);
                TokenKind::Identifier(other.to_string())
            }
        };
        self.tokens.push(Token::new(kind, pos));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &Line) -> Vec<TokenKind> {
        line.iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn blank_line_is_just_trailing_whitespace() {
        let lines = tokenize("");
        assert_eq!(lines.len(), 1);
        assert_eq!(kinds(&lines[0]), vec![TokenKind::TrailingWhitespace(String::new())]);
    }

    #[test]
    fn leading_and_trailing_whitespace_preserved() {
        let lines = tokenize(" w 1");
        let line = &lines[0];
        assert!(matches!(line[0].kind, TokenKind::LeadingWhitespace(_)));
        assert!(matches!(line.last().unwrap().kind, TokenKind::TrailingWhitespace(_)));
    }

    #[test]
    fn numeric_literal() {
        let lines = tokenize(" w 3.14");
        let nums: Vec<_> = lines[0]
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::Number(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(nums, vec![3.14]);
    }

    #[test]
    fn string_with_doubled_quote() {
        let lines = tokenize(r#" w "he said ""hi""""#);
        let strs: Vec<_> = lines[0]
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Str(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(strs, vec![r#"he said "hi""#.to_string()]);
    }

    #[test]
    fn star_star_is_one_token() {
        let lines = tokenize(" w 2**3");
        assert!(kinds(&lines[0]).contains(&TokenKind::StarStar));
    }

    #[test]
    fn comment_spans_to_end_of_line() {
        let lines = tokenize(" w 1 ;a trailing comment");
        assert!(matches!(lines[0].last().unwrap().kind, TokenKind::TrailingWhitespace(_)));
        assert!(kinds(&lines[0])
            .iter()
            .any(|k| matches!(k, TokenKind::Comment(c) if c == "a trailing comment")));
    }
}
