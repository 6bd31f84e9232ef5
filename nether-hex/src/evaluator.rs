//! Offset expression evaluation
//!
//! An offset expression is a numeric literal, optionally built from
//! configuration placeholders:
//!
//! - `${key}` is replaced with the configured value (empty if missing)
//! - `${key|default}` falls back to `default` when the key is missing
//!
//! Substitution runs once, left to right; substituted text is not scanned
//! again. The result is then parsed as `0x` hex, `0b` binary or decimal.

use crate::config::ConfigProvider;

/// Resolves offset expressions against a configuration provider.
pub struct Evaluator<'a> {
    config: &'a dyn ConfigProvider,
}

impl<'a> Evaluator<'a> {
    pub fn new(config: &'a dyn ConfigProvider) -> Self {
        Self { config }
    }

    /// Substitute every placeholder in `expr`
    pub fn evaluate(&self, expr: &str) -> String {
        let mut out = String::with_capacity(expr.len());
        let mut rest = expr;

        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            out.push_str(&rest[..start]);

            let body = &rest[start + 2..start + 2 + len];
            let (key, default) = match body.split_once('|') {
                Some((key, default)) => (key, Some(default)),
                None => (body, None),
            };
            match self.config.get(key.trim()) {
                Some(value) => out.push_str(&value),
                None => out.push_str(default.unwrap_or("")),
            }

            rest = &rest[start + 2 + len + 1..];
        }

        out.push_str(rest);
        out
    }

    /// Substitute placeholders and parse the result as a number.
    ///
    /// Returns `None` when the text is not a number; the caller decides how
    /// to report it.
    pub fn offset(&self, expr: &str) -> Option<i64> {
        parse_number(&self.evaluate(expr))
    }
}

/// Parse `0x`/`0b`/decimal text with an optional leading `-` and `_` separators.
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else {
        (10, digits)
    };

    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = i64::from_str_radix(&digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
