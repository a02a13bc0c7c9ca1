//! Counts stored as decimal strings, also accepting plain numbers.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountInput {
        String(String),
        Number(u64),
    }

    match CountInput::deserialize(deserializer)? {
        CountInput::String(raw) => raw.trim().parse::<u64>().map_err(D::Error::custom),
        CountInput::Number(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Wrapper {
        #[serde(with = "super")]
        c: u64,
    }

    #[test]
    fn accepts_string_and_number() {
        let parsed: Wrapper = serde_json::from_str(r#"{"c":"35"}"#).unwrap();
        assert_eq!(parsed.c, 35);
        let parsed: Wrapper = serde_json::from_str(r#"{"c":35}"#).unwrap();
        assert_eq!(parsed.c, 35);
    }

    #[test]
    fn writes_string() {
        let json = serde_json::to_string(&Wrapper { c: 8000 }).unwrap();
        assert_eq!(json, r#"{"c":"8000"}"#);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"c":"lots"}"#).is_err());
    }
}
