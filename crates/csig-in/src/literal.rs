//! Literal parsing for serialized mappings that are not JSON.
//!
//! Some upstream collectors hand over the repr of a mapping rather than JSON:
//! single quoted strings, `True`/`False`/`None`, tuples. This parser accepts
//! that literal syntax and nothing else. It never evaluates names or calls.

use csig_core::CsigError;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use serde_json::{Map, Number, Value};

#[derive(Parser)]
#[grammar = "literal.pest"]
struct LiteralParser;

/// Deepest container nesting accepted before parsing is attempted
pub const MAX_LITERAL_NESTING: usize = 128;

/// Parse literal text into a JSON value.
///
/// Tuples and sets become arrays, `None` becomes `null`, and scalar dict keys
/// are stringified the way a JSON encoder would.
pub fn parse_literal(text: &str) -> Result<Value, CsigError> {
    if nesting_depth(text) > MAX_LITERAL_NESTING {
        return Err(CsigError::parse(format!(
            "literal nesting exceeds {} levels",
            MAX_LITERAL_NESTING
        )));
    }

    let mut pairs = LiteralParser::parse(Rule::literal, text)
        .map_err(|e| CsigError::parse(format!("not a literal: {}", e)))?;

    let root = pairs
        .next()
        .and_then(|literal| literal.into_inner().next())
        .ok_or_else(|| CsigError::parse("empty literal"))?;

    build(root)
}

fn build(pair: Pair<Rule>) -> Result<Value, CsigError> {
    match pair.as_rule() {
        Rule::brace => build_brace(pair),
        Rule::list => {
            let items = pair.into_inner().map(build).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        }
        Rule::paren => {
            let mut items = Vec::new();
            let mut trailing_comma = false;
            for part in pair.into_inner() {
                if part.as_rule() == Rule::comma {
                    trailing_comma = true;
                } else {
                    items.push(build(part)?);
                }
            }
            // `(x)` is just `x`; `(x,)` and `()` are tuples
            if items.len() == 1 && !trailing_comma {
                Ok(items.remove(0))
            } else {
                Ok(Value::Array(items))
            }
        }
        Rule::strings => {
            let mut out = String::new();
            for part in pair.into_inner() {
                out.push_str(&decode_string(part)?);
            }
            Ok(Value::String(out))
        }
        Rule::number => parse_number(pair.as_str()),
        Rule::boolean => Ok(Value::Bool(pair.as_str() == "True")),
        Rule::none => Ok(Value::Null),
        other => Err(CsigError::parse(format!("unexpected token {:?}", other))),
    }
}

/// `{}` is an empty dict. Otherwise every entry must be a `key: value` pair
/// (dict) or every entry a bare value (set).
fn build_brace(pair: Pair<Rule>) -> Result<Value, CsigError> {
    let mut map = Map::new();
    let mut items = Vec::new();
    for entry in pair.into_inner() {
        let mut parts = entry.into_inner();
        let Some(first) = parts.next() else {
            return Err(CsigError::parse("empty brace entry"));
        };
        match parts.next() {
            Some(value) if items.is_empty() => {
                map.insert(key_string(build(first)?)?, build(value)?);
            }
            None if map.is_empty() => items.push(build(first)?),
            _ => return Err(CsigError::parse("cannot mix dict entries and set items")),
        }
    }
    if items.is_empty() {
        Ok(Value::Object(map))
    } else {
        Ok(Value::Array(items))
    }
}

/// JSON object keys must be strings; scalars are stringified like a JSON encoder does.
fn key_string(key: Value) -> Result<String, CsigError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => {
            Err(CsigError::parse("dict keys must be scalars"))
        }
    }
}

fn decode_string(pair: Pair<Rule>) -> Result<String, CsigError> {
    let mut raw = false;
    let mut body = "";
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::prefix => raw = part.as_str().to_ascii_lowercase().contains('r'),
            Rule::sq_string | Rule::dq_string => {
                body = part.into_inner().next().map(|chars| chars.as_str()).unwrap_or("");
            }
            _ => {}
        }
    }
    if raw {
        Ok(body.to_string())
    } else {
        unescape(body)
    }
}

fn unescape(body: &str) -> Result<String, CsigError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'a' => out.push('\u{7}'),
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or_else(|| CsigError::parse("bad octal escape"))?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    len: usize,
) -> Result<char, CsigError> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len {
        return Err(CsigError::parse("truncated escape sequence"));
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| CsigError::parse(format!("bad escape sequence \\{}", digits)))
}

fn parse_number(text: &str) -> Result<Value, CsigError> {
    let cleaned = text.replace('_', "");
    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        let magnitude = i64::from_str_radix(hex, 16)
            .map_err(|_| CsigError::parse(format!("hex literal out of range: {}", text)))?;
        return Ok(Value::Number(Number::from(if negative { -magnitude } else { magnitude })));
    }

    let signed = if negative {
        format!("-{}", unsigned)
    } else {
        unsigned.to_string()
    };

    let is_float = unsigned.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = signed.parse::<i64>() {
            return Ok(Value::Number(Number::from(i)));
        }
        if let Ok(u) = signed.parse::<u64>() {
            return Ok(Value::Number(Number::from(u)));
        }
    }

    signed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| CsigError::parse(format!("number not representable in JSON: {}", text)))
}

/// Bracket depth outside of quoted strings
fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' | '[' | '(' => {
                depth += 1;
                max = max.max(depth);
            }
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}
