use ethers::types::U256;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

fn parse_u256(raw: &str) -> Result<U256, String> {
    let raw = raw.trim();
    match raw.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(raw).map_err(|e| e.to_string()),
    }
}

/// Amounts travel as decimal strings; some fields arrive as plain numbers.
pub mod u256_dec {
    use super::*;

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => parse_u256(&s).map_err(serde::de::Error::custom),
            StringOrNumber::Number(n) => Ok(U256::from(n)),
        }
    }
}

pub mod u256_dec_opt {
    use super::*;

    pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            Some(StringOrNumber::String(s)) => parse_u256(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(StringOrNumber::Number(n)) => Ok(Some(U256::from(n))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize)]
    struct Amounts {
        #[serde(with = "u256_dec")]
        amount: U256,
        #[serde(default, with = "u256_dec_opt")]
        gas: Option<U256>,
    }

    #[test]
    fn accepts_strings_numbers_and_hex() {
        let a: Amounts = serde_json::from_str(r#"{"amount":"5000000000000000","gas":7}"#).unwrap();
        assert_eq!(a.amount, U256::exp10(15) * 5);
        assert_eq!(a.gas, Some(U256::from(7)));

        let a: Amounts = serde_json::from_str(r#"{"amount":"0x10"}"#).unwrap();
        assert_eq!(a.amount, U256::from(16));
        assert_eq!(a.gas, None);

        assert!(serde_json::from_str::<Amounts>(r#"{"amount":"1.5"}"#).is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Amounts {
            amount: U256::from(1234),
            gas: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"amount":"1234","gas":null}"#);
    }
}
