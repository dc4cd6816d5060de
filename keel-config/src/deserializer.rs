pub mod stringified_map {
    use serde::de::{Deserialize, Deserializer, Error};
    use serde_json::Value;
    use std::collections::HashMap;

    /// Accept scalar table values of any type and keep them as strings.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = HashMap::<String, Value>::deserialize(deserializer)?;
        map.into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(text) => text,
                    Value::Bool(flag) => flag.to_string(),
                    Value::Number(number) => number.to_string(),
                    Value::Null => String::new(),
                    other => {
                        return Err(D::Error::custom(format!(
                            "brokerage setting '{key}' must be a scalar, got {other}"
                        )))
                    }
                };
                Ok((key, text))
            })
            .collect()
    }
}
