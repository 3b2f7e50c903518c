//! A small parser for the tagger's reply grammar:
//! `(outcome "good|bad|neutral") (confidence x) (concepts "a" "b" ...)`
//!
//! LLM replies are not trustworthy input: they arrive wrapped in code
//! fences, missing a trailing paren, or with stray prose before/after. The
//! cleaner pass below strips the common defects before the real parser
//! ever sees the text.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Symbol(String),
    Str(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub tag: String,
    pub args: Vec<Atom>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SexprError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected '(' at top level, found '{0}'")]
    ExpectedOpenParen(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("empty clause")]
    EmptyClause,
}

/// Strips code fences/backticks and auto-balances parentheses: a missing
/// trailing `)` is appended, a stray leading/extra `)` is dropped.
pub fn clean(raw: &str) -> String {
    let without_fences: String = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = without_fences.trim();

    let mut depth: i32 = 0;
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '(' => {
                depth += 1;
                out.push(c);
            }
            ')' => {
                if depth > 0 {
                    depth -= 1;
                    out.push(c);
                }
                // stray close with no matching open: drop it
            }
            _ => out.push(c),
        }
    }
    for _ in 0..depth {
        out.push(')');
    }
    out
}

/// Parses a cleaned reply into its top-level clauses.
pub fn parse_clauses(cleaned: &str) -> Result<Vec<Clause>, SexprError> {
    let mut chars = cleaned.chars().peekable();
    let mut clauses = Vec::new();

    loop {
        skip_whitespace(&mut chars);
        match chars.peek() {
            None => break,
            Some('(') => clauses.push(parse_clause(&mut chars)?),
            Some(&other) => return Err(SexprError::ExpectedOpenParen(other)),
        }
    }

    Ok(clauses)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
}

fn parse_clause(chars: &mut Peekable<Chars<'_>>) -> Result<Clause, SexprError> {
    chars.next(); // consume '('
    skip_whitespace(chars);

    let tag = parse_symbol(chars);
    if tag.is_empty() {
        return Err(SexprError::EmptyClause);
    }

    let mut args = Vec::new();
    loop {
        skip_whitespace(chars);
        match chars.peek() {
            Some(')') => {
                chars.next();
                break;
            }
            Some('"') => args.push(Atom::Str(parse_string(chars)?)),
            Some(c) if c.is_ascii_digit() || *c == '-' => args.push(parse_number(chars)),
            Some(_) => {
                let symbol = parse_symbol(chars);
                if symbol.is_empty() {
                    return Err(SexprError::UnexpectedEof);
                }
                args.push(Atom::Symbol(symbol));
            }
            None => return Err(SexprError::UnexpectedEof),
        }
    }

    Ok(Clause { tag, args })
}

fn parse_symbol(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut symbol = String::new();
    while matches!(chars.peek(), Some(c) if !c.is_whitespace() && *c != '(' && *c != ')' && *c != '"') {
        symbol.push(chars.next().unwrap());
    }
    symbol
}

fn parse_string(chars: &mut Peekable<Chars<'_>>) -> Result<String, SexprError> {
    chars.next(); // consume opening quote
    let mut s = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(s),
            Some(c) => s.push(c),
            None => return Err(SexprError::UnterminatedString),
        }
    }
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Atom {
    let mut digits = String::new();
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.' || *c == '-') {
        digits.push(chars.next().unwrap());
    }
    digits.parse().map(Atom::Number).unwrap_or(Atom::Symbol(digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let clauses = parse_clauses(r#"(outcome "good") (confidence 0.8) (concepts "rust" "cli")"#).unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].tag, "outcome");
        assert_eq!(clauses[0].args, vec![Atom::Str("good".to_string())]);
        assert_eq!(clauses[1].args, vec![Atom::Number(0.8)]);
        assert_eq!(
            clauses[2].args,
            vec![Atom::Str("rust".to_string()), Atom::Str("cli".to_string())]
        );
    }

    #[test]
    fn cleans_code_fences() {
        let raw = "```\n(outcome \"good\") (confidence 0.9)\n```";
        let cleaned = clean(raw);
        assert!(!cleaned.contains("```"));
        let clauses = parse_clauses(&cleaned).unwrap();
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn auto_balances_missing_closing_paren() {
        let raw = r#"(outcome "good") (confidence 0.5"#;
        let cleaned = clean(raw);
        let clauses = parse_clauses(&cleaned).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].args, vec![Atom::Number(0.5)]);
    }

    #[test]
    fn drops_stray_closing_paren() {
        let raw = r#"(outcome "good")) (confidence 0.5)"#;
        let cleaned = clean(raw);
        let clauses = parse_clauses(&cleaned).unwrap();
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn rejects_malformed_top_level_garbage() {
        let err = parse_clauses("not a clause").unwrap_err();
        assert!(matches!(err, SexprError::ExpectedOpenParen(_)));
    }
}
