use std::collections::BTreeMap;

use tracing::debug;

use super::key::Key;
use super::value::Value;

/// Recognized environment variables and the canonical keys they set.
pub const ENV_TO_KEY: [(&str, &str); 9] = [
    ("SK_APPLICATION", "application"),
    ("SK_AUTHENTICATION", "authentication"),
    ("SK_AGENT_INTERVAL", "agent.interval"),
    ("SK_AGENT_KEEPALIVE", "agent.keepalive"),
    ("SK_AGENT_SAMPLE_SIZE", "agent.sample"),
    ("SK_REPORT_HOST", "report.host"),
    ("SK_REPORT_PORT", "report.port"),
    ("SK_REPORT_SSL", "report.ssl"),
    ("SK_REPORT_DEFLATE", "report.deflate"),
];

/// Returns the canonical key for a recognized environment variable name.
pub fn key_for_env(name: &str) -> Option<&'static str> {
    ENV_TO_KEY
        .iter()
        .find(|(env, _)| *env == name)
        .map(|(_, key)| *key)
}

/// Returns the environment variable name for a canonical key.
pub fn env_for_key(key: &str) -> Option<&'static str> {
    ENV_TO_KEY
        .iter()
        .find(|(_, k)| *k == key)
        .map(|(env, _)| *env)
}

/// Translates environment variables into canonical keys with coerced values.
///
/// Names outside [`ENV_TO_KEY`] are dropped. Accepts any snapshot of name/value
/// pairs, e.g. `std::env::vars()` or a `HashMap<String, String>`.
pub fn remap<I, K, V>(vars: I) -> BTreeMap<Key, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let remapped: BTreeMap<Key, Value> = vars
        .into_iter()
        .filter_map(|(name, raw)| {
            key_for_env(name.as_ref()).map(|key| (Key::from(key), coerce_value(raw.as_ref())))
        })
        .collect();

    debug!(count = remapped.len(), "remapped environment overrides");
    remapped
}

/// Coerces a raw environment string into the most specific value it spells.
pub fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("nil") || s.eq_ignore_ascii_case("null") {
        return Value::Null;
    }

    // Digits that overflow i64 fall through to the raw string.
    if is_digits(s) {
        return s
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(s.to_string()));
    }

    if let Some((whole, frac)) = s.split_once('.') {
        if is_digits(whole) && is_digits(frac) {
            if let Ok(f) = s.parse::<f64>() {
                return Value::Float(f);
            }
        }
    }

    Value::String(s.to_string())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
