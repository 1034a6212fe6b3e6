//! Projection of a resolved configuration onto environment variables.

use std::collections::BTreeMap;

use super::defaults::default_for;
use super::env::ENV_TO_KEY;
use super::store::Config;
use super::value::Value;

/// Returns the recognized environment variables needed to reproduce `config`.
///
/// Only keys whose resolved value differs from the compiled-in default are
/// emitted, so a configuration left at its defaults projects to an empty map.
/// Values use their canonical string form (`true`, `false`, `nil`, ...), which
/// [`remap`](super::env::remap) coerces back to the same value.
pub fn to_env(config: &Config) -> BTreeMap<String, String> {
    ENV_TO_KEY
        .iter()
        .filter_map(|(env, key)| {
            let effective = config.get(key);
            let default = default_for(key).unwrap_or(&Value::Null);
            (effective != *default).then(|| (env.to_string(), effective.to_string()))
        })
        .collect()
}
