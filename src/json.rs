//! JSON import.
//!
//! Maps a parsed JSON document onto the value model. Objects become
//! case-insensitive, full-compatibility dictionaries; numbers prefer an
//! integer reading, then an exact fixed-point one, then a double.

use failure::Error;

use crate::{
    dict::Dict,
    float::{Fixed128, Float},
    text::Text,
    Value,
};

impl Value {
    /// Parses a JSON document into a value tree.
    ///
    /// # Example
    ///
    /// ```
    /// use eds::Value;
    ///
    /// let v = Value::from_json(r#"{"answer": 42, "tags": ["a", "b"]}"#).unwrap();
    /// assert_eq!(v.to_dict().unwrap().get("answer"), Some(&Value::from(42)));
    /// ```
    pub fn from_json(text: &str) -> Result<Value, Error> {
        let parsed: serde_json::Value = serde_json::from_str(text)?;
        Ok(from_json_value(&parsed))
    }
}

fn from_json_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(std::f64::NAN);
                Value::Float(match Fixed128::from_f64(f) {
                    Some(d) => Float::Fixed(d),
                    None => Float::Double(f.to_bits()),
                })
            }
        }
        serde_json::Value::String(s) => Value::Str(Text::from_string(s)),
        serde_json::Value::Array(items) => {
            Value::Array(items.iter().map(from_json_value).collect())
        }
        serde_json::Value::Object(entries) => {
            let mut dict = Dict::new(true, false);
            for (k, v) in entries {
                dict.insert(k.as_str(), from_json_value(v));
            }
            Value::Dict(dict)
        }
    }
}
