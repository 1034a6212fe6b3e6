//! Compiled-in default values.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::key::Key;
use super::value::Value;

static DEFAULTS: LazyLock<BTreeMap<Key, Value>> = LazyLock::new(|| {
    BTreeMap::from([
        (Key::from("agent.keepalive"), Value::Integer(60)),
        (Key::from("agent.interval"), Value::Integer(5)),
        (Key::from("agent.sample"), Value::Integer(200)),
        (Key::from("report.host"), Value::from("agent.skylight.io")),
        (Key::from("report.port"), Value::Integer(443)),
        (Key::from("report.ssl"), Value::Boolean(true)),
        (Key::from("report.deflate"), Value::Boolean(true)),
    ])
});

/// Returns the compiled-in default for `key`, if it has one.
pub fn default_for(key: &str) -> Option<&'static Value> {
    DEFAULTS.get(key)
}

/// All compiled-in defaults.
pub fn defaults() -> &'static BTreeMap<Key, Value> {
    &DEFAULTS
}
