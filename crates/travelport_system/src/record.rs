//! Compact `TypeName{key=value,...}` text form used for nested values in the
//! ports file (areas and destinations), and the `%NAME%` escapes that keep
//! free text from colliding with the file's delimiters.

use crate::error::TravelError;
use std::collections::HashMap;
use std::str::FromStr;

/// Reserved characters and their escapes. `%` comes first so that escaped
/// text never contains a bare `%`.
const ESCAPES: [(char, &str); 6] = [
    ('%', "%PERCENT%"),
    (';', "%SEMICOLON%"),
    (',', "%COMMA%"),
    ('=', "%EQUALS%"),
    ('{', "%LBRACE%"),
    ('}', "%RBRACE%"),
];

/// Replaces every reserved character with its `%NAME%` escape.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match ESCAPES.iter().find(|(reserved, _)| *reserved == c) {
            Some((_, token)) => escaped.push_str(token),
            None => escaped.push(c),
        }
    }
    escaped
}

/// Reverses [`escape`] in a single left-to-right pass.
///
/// A `%` that does not start a known escape is kept as is.
pub fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find('%') {
        unescaped.push_str(&rest[..index]);
        rest = &rest[index..];
        match ESCAPES.iter().find(|(_, token)| rest.starts_with(token)) {
            Some((c, token)) => {
                unescaped.push(*c);
                rest = &rest[token.len()..];
            }
            None => {
                unescaped.push('%');
                rest = &rest[1..];
            }
        }
    }
    unescaped.push_str(rest);
    unescaped
}

/// Formats `type_name{k1=v1,k2=v2}` keeping the given field order; values
/// are escaped.
pub fn format_record(type_name: &str, fields: &[(&str, String)]) -> String {
    let body = fields
        .iter()
        .map(|(key, value)| format!("{key}={}", escape(value)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{type_name}{{{body}}}")
}

/// Parsed key/value body of a record.
#[derive(Debug)]
pub struct RecordFields<'a> {
    input: &'a str,
    fields: HashMap<&'a str, String>,
}

impl<'a> RecordFields<'a> {
    /// Parses `input`, which must be a record of type `type_name`.
    pub fn parse(input: &'a str, type_name: &str) -> Result<Self, TravelError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix(type_name)
            .and_then(|rest| rest.strip_prefix('{'))
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| TravelError::syntax(&format!("expected {type_name}{{...}}"), input))?;

        let mut fields = HashMap::new();
        for pair in body.split(',').filter(|p| !p.trim().is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| TravelError::syntax("expected key=value", pair))?;
            fields.insert(key.trim(), unescape(value.trim()));
        }

        Ok(Self { input, fields })
    }

    /// Unescaped value of `key`.
    pub fn get(&self, key: &str) -> Result<&str, TravelError> {
        self.fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| TravelError::syntax(&format!("missing field '{key}'"), self.input))
    }

    /// Value of `key` parsed as `T`.
    pub fn parse_field<T: FromStr>(&self, key: &str) -> Result<T, TravelError> {
        let raw = self.get(key)?;
        raw.parse()
            .map_err(|_| TravelError::syntax(&format!("bad value for '{key}'"), raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_keeps_field_order() {
        let text = format_record("Thing", &[("b", "2".to_string()), ("a", "1".to_string())]);
        assert_eq!(text, "Thing{b=2,a=1}");
    }

    #[test]
    fn test_parse_fields() {
        let record = RecordFields::parse("Thing{a=1, b=-2.5,world=nether}", "Thing").unwrap();
        assert_eq!(record.parse_field::<i32>("a").unwrap(), 1);
        assert_eq!(record.parse_field::<f64>("b").unwrap(), -2.5);
        assert_eq!(record.get("world").unwrap(), "nether");
    }

    #[test]
    fn test_reserved_characters_survive() {
        let world = "odd;world,{x=1}%SEMICOLON%";
        let text = format_record("Thing", &[("world", world.to_string()), ("a", "1".to_string())]);
        assert!(!text[..text.len() - 1].contains('}'));

        let record = RecordFields::parse(&text, "Thing").unwrap();
        assert_eq!(record.get("world").unwrap(), world);
        assert_eq!(record.parse_field::<i32>("a").unwrap(), 1);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(escape("a;b"), "a%SEMICOLON%b");
        assert_eq!(unescape("a%SEMICOLON%b"), "a;b");
        assert_eq!(unescape("100% sure"), "100% sure");
        assert_eq!(unescape(&escape("%PERCENT%%COMMA%")), "%PERCENT%%COMMA%");
    }

    #[test]
    fn test_parse_rejects_wrong_type_and_missing_fields() {
        assert!(matches!(
            RecordFields::parse("Other{a=1}", "Thing"),
            Err(TravelError::Syntax(_))
        ));
        assert!(RecordFields::parse("Thing{a=1", "Thing").is_err());
        assert!(RecordFields::parse("Thing{a}", "Thing").is_err());

        let record = RecordFields::parse("Thing{a=x}", "Thing").unwrap();
        assert!(record.get("b").is_err());
        let err = record.parse_field::<i32>("a").unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }
}
