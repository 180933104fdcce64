use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a JSON number, a numeric string, `null`, or an empty string.
pub(crate) fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    match v {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>().map(Some).map_err(|_| {
                    de::Error::custom(format!("could not parse f64 from string: {s}"))
                })
            }
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected number or string, got: {other}"
        ))),
    }
}
