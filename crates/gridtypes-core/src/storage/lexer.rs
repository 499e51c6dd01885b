//! Tokenizer shared by the declaration, type and literal parsers.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{GridtypesError, Result};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    /// `@TYPEVAR` / `@UNITVAR`, without the `@`.
    Marker(String),
    Number(String),
    Str(String),
    Arrow,
    Punct(char),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\A(?:(?P<ws>\s+)|(?P<comment>#[^\n]*)|"(?P<str>(?:[^"\\]|\\.)*)"|(?P<arrow>->)|@(?P<marker>[A-Za-z]+)|(?P<num>-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)|(?P<ident>[A-Za-z_][A-Za-z0-9_]*)|(?P<punct>[()\[\]{}<>,|*/^]))"#,
        )
        .expect("token regex must compile")
    })
}

/// Split `input` into tokens, skipping whitespace and `#` comments.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let re = token_re();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(caps) = re.captures(rest) else {
            let unexpected = rest.chars().next().unwrap_or(' ');
            return Err(GridtypesError::Parse {
                line,
                message: format!("Unexpected character '{}'", unexpected),
            });
        };
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or("");

        let kind = if caps.name("ws").is_some() || caps.name("comment").is_some() {
            None
        } else if let Some(m) = caps.name("str") {
            Some(TokenKind::Str(unescape(m.as_str())))
        } else if caps.name("arrow").is_some() {
            Some(TokenKind::Arrow)
        } else if let Some(m) = caps.name("marker") {
            Some(TokenKind::Marker(m.as_str().to_string()))
        } else if let Some(m) = caps.name("num") {
            Some(TokenKind::Number(m.as_str().to_string()))
        } else if let Some(m) = caps.name("ident") {
            Some(TokenKind::Ident(m.as_str().to_string()))
        } else {
            caps.name("punct")
                .and_then(|m| m.as_str().chars().next())
                .map(TokenKind::Punct)
        };

        if let Some(kind) = kind {
            tokens.push(Token { kind, line });
        }
        line += whole.matches('\n').count();
        pos += whole.len();
    }

    Ok(tokens)
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}
