use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept either a JSON string or a number for free-text fields that older
/// clients wrote as numbers (phone, age). Missing or null becomes empty.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "string_or_number")]
        age: String,
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let record: Record = serde_json::from_str(r#"{"age": 42}"#).unwrap();
        assert_eq!(record.age, "42");
        let record: Record = serde_json::from_str(r#"{"age": "7"}"#).unwrap();
        assert_eq!(record.age, "7");
        let record: Record = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(record.age, "");
    }
}
