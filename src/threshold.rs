//! Threshold value as it comes off a slider.
//! Numbers stay numbers and text stays text, so the label and the JSON body
//! both echo exactly what the caller passed in. No range checks.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Threshold {
    Number(serde_json::Number),
    Text(String),
}

impl Threshold {
    /// Parses raw slider input. Anything that reads as a JSON number (ignoring
    /// surrounding whitespace) becomes `Number`; everything else is kept as
    /// `Text`, byte for byte.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Number>(raw.trim()) {
            Ok(n) => Threshold::Number(n),
            Err(_) => Threshold::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Number(n) => write!(f, "{}", n),
            Threshold::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Threshold {
    fn from(v: i64) -> Self {
        Threshold::Number(v.into())
    }
}

impl From<&str> for Threshold {
    fn from(v: &str) -> Self {
        Threshold::Text(v.to_string())
    }
}

impl From<String> for Threshold {
    fn from(v: String) -> Self {
        Threshold::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_is_number() {
        assert_eq!(Threshold::parse("128"), Threshold::from(128i64));
        assert_eq!(Threshold::parse(" 200\n").to_string(), "200");
    }

    #[test]
    fn test_parse_non_numeric_keeps_text() {
        let t = Threshold::parse("high");
        assert_eq!(t, Threshold::Text("high".into()));
        assert_eq!(t.to_string(), "high");
    }

    #[test]
    fn test_parse_text_keeps_surrounding_whitespace() {
        let t = Threshold::parse("  high ");
        assert_eq!(t, Threshold::Text("  high ".into()));
        assert_eq!(t.to_string(), "  high ");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"  high \"");
    }

    #[test]
    fn test_serializes_verbatim() {
        assert_eq!(serde_json::to_string(&Threshold::from(200i64)).unwrap(), "200");
        assert_eq!(serde_json::to_string(&Threshold::from("200")).unwrap(), "\"200\"");
        assert_eq!(serde_json::to_string(&Threshold::parse("12.5")).unwrap(), "12.5");
    }
}
