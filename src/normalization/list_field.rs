use itertools::Itertools;
use tracing::debug;

use crate::table::{render_number, Value};

/// Parse a raw list-encoded cell into an ordered token sequence.
///
/// Accepts whatever the source file put in the cell:
/// - null or blank text yields `None`
/// - an already-parsed list is returned as-is
/// - text is run through the strict bracketed-literal scanner first; a
///   parsed list becomes one token per element, a parsed scalar becomes a
///   single-element sequence
/// - text the scanner rejects falls back to comma splitting, which never
///   fails
/// - a numeric cell becomes a single-element sequence of its rendering
pub fn parse_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::List(items) => Some(items.clone()),
        Value::Number(n) => Some(vec![render_number(*n)]),
        Value::Text(raw) => {
            let text = raw.trim();
            if text.is_empty() {
                return None;
            }
            match parse_literal(text) {
                Ok(Literal::List(items)) => Some(items.iter().map(literal_text).collect()),
                Ok(scalar) => Some(vec![literal_text(&scalar)]),
                Err(()) => {
                    debug!(cell = text, "strict list parse failed, using comma split");
                    Some(comma_split(text))
                }
            }
        }
    }
}

/// Re-encode a token sequence as bracketed single-quoted text, the flat form
/// stored in CSV cells. Embedded quotes and backslashes are escaped so the
/// output round-trips through `parse_list`.
pub fn render_list(items: &[String]) -> String {
    let body = items
        .iter()
        .map(|item| format!("'{}'", item.replace('\\', "\\\\").replace('\'', "\\'")))
        .join(", ");
    format!("[{body}]")
}

/// A structured list-cell literal: strings, numbers, and nested lists only.
/// Nothing else is recognized, so a cell can never smuggle anything that
/// needs evaluation.
enum Literal {
    Str(String),
    Num(f64),
    List(Vec<Literal>),
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Str(s) => s.clone(),
        Literal::Num(n) => render_number(*n),
        Literal::List(items) => {
            let tokens: Vec<String> = items.iter().map(literal_text).collect();
            render_list(&tokens)
        }
    }
}

/// Strict parse of a complete literal; trailing input is an error.
fn parse_literal(text: &str) -> Result<Literal, ()> {
    let mut scanner = Scanner { rest: text };
    let literal = scanner.literal()?;
    scanner.skip_ws();
    if scanner.rest.is_empty() {
        Ok(literal)
    } else {
        Err(())
    }
}

fn comma_split(text: &str) -> Vec<String> {
    text.split(',')
        .map(|token| {
            token
                .trim()
                .trim_matches(|c| c == '\'' || c == '"')
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

struct Scanner<'a> {
    rest: &'a str,
}

impl Scanner<'_> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let mut chars = self.rest.chars();
        let c = chars.next()?;
        self.rest = chars.as_str();
        Some(c)
    }

    fn literal(&mut self) -> Result<Literal, ()> {
        self.skip_ws();
        match self.peek().ok_or(())? {
            '[' => self.list(),
            '\'' | '"' => self.string(),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            _ => Err(()),
        }
    }

    fn list(&mut self) -> Result<Literal, ()> {
        self.bump(); // '['
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                break;
            }
            items.push(self.literal()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump(); // trailing comma before ']' is fine
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                _ => return Err(()),
            }
        }
        Ok(Literal::List(items))
    }

    fn string(&mut self) -> Result<Literal, ()> {
        let quote = self.bump().ok_or(())?;
        let mut out = String::new();
        loop {
            match self.bump().ok_or(())? {
                '\\' => {
                    let escaped = self.bump().ok_or(())?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                c if c == quote => break,
                c => out.push(c),
            }
        }
        Ok(Literal::Str(out))
    }

    fn number(&mut self) -> Result<Literal, ()> {
        let token: String = self
            .rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
            .collect();
        self.rest = &self.rest[token.len()..];
        token.parse::<f64>().map(Literal::Num).map_err(|_| ())
    }
}
