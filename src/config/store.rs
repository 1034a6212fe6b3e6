//! The layered configuration store.

use std::collections::BTreeMap;
use std::ops::Index;

use regex::Regex;
use tracing::trace;

use super::builder::ConfigBuilder;
use super::defaults::default_for;
use super::export;
use super::key::Key;
use super::value::{flatten, Attribute, Attributes, Value};
use super::ConfigError;

/// Attribute name reserved for seeding the priority tier.
const PRIORITY: &str = "priority";

static NULL: Value = Value::Null;

/// Promotes keys written under the active environment name.
///
/// With environment `production`, a write to `production.agent.interval` is
/// also installed as `agent.interval` in the priority tier.
#[derive(Debug, Clone)]
struct EnvironmentScope {
    name: String,
    pattern: Regex,
}

impl EnvironmentScope {
    fn new(name: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&format!(r"^{}\.(.+)$", regex::escape(name))).map_err(
            |source| ConfigError::InvalidEnvironment {
                name: name.to_string(),
                source,
            },
        )?;
        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }

    /// Returns the unscoped suffix if `key` lives under this environment.
    fn promote<'k>(&self, key: &'k str) -> Option<&'k str> {
        self.pattern
            .captures(key)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Resolved configuration with three precedence tiers.
///
/// Lookups consult the priority tier, then explicitly set values, then the
/// compiled-in defaults. A key present in a tier is a hit even when its value
/// is [`Value::Null`].
///
/// `Config` is a plain owned value with no internal locking. Share it behind
/// a lock or keep it on one thread if it must be mutated concurrently.
///
/// ## Example
///
/// ```
/// use skylight_config::{Config, Value};
///
/// let mut config = Config::builder()
///     .with_environment("production")
///     .with_env([("SK_REPORT_PORT", "8443")])
///     .build()?;
///
/// config.set("production.agent.interval", 10);
///
/// assert_eq!(config.get("agent.interval"), Value::Integer(10));
/// assert_eq!(config.get("report.port"), Value::Integer(8443));
/// assert_eq!(config.get("report.ssl"), Value::Boolean(true));
/// # Ok::<(), skylight_config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    priority: BTreeMap<Key, Value>,
    values: BTreeMap<Key, Value>,
    scope: Option<EnvironmentScope>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Builds a store from document attributes and priority overrides.
    ///
    /// A `priority` table inside `attributes` is not stored as a value; its
    /// entries seed the priority tier. The remaining attributes are applied
    /// with [`set`](Self::set), so scope promotion already applies here.
    /// Entries in `priority` win over both.
    pub fn new(
        environment: Option<&str>,
        attributes: Attributes,
        priority: BTreeMap<Key, Value>,
    ) -> Result<Self, ConfigError> {
        let scope = environment.map(EnvironmentScope::new).transpose()?;
        Ok(Self::from_parts(scope, attributes, priority))
    }

    pub(crate) fn from_env_overrides(priority: BTreeMap<Key, Value>) -> Self {
        Self::from_parts(None, Attributes::new(), priority)
    }

    fn from_parts(
        scope: Option<EnvironmentScope>,
        mut attributes: Attributes,
        priority: BTreeMap<Key, Value>,
    ) -> Self {
        let mut config = Self {
            priority: BTreeMap::new(),
            values: BTreeMap::new(),
            scope,
        };

        let seed = match attributes.remove(PRIORITY) {
            Some(Attribute::Table(table)) => Some(table),
            Some(scalar) => {
                attributes.insert(PRIORITY.to_string(), scalar);
                None
            }
            None => None,
        };

        for (key, attribute) in attributes {
            config.set(key, attribute);
        }

        for (key, attribute) in seed.into_iter().flatten() {
            config.priority.extend(flatten(Key::from(key), attribute));
        }

        config.priority.extend(priority);
        config
    }

    /// The active environment name, if scope promotion is enabled.
    pub fn environment(&self) -> Option<&str> {
        self.scope.as_ref().map(|scope| scope.name.as_str())
    }

    /// Walks the tiers and returns the first hit, without any fallback.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.priority
            .get(key)
            .or_else(|| self.values.get(key))
            .or_else(|| default_for(key))
    }

    /// Returns the resolved value for `key`, or [`Value::Null`] if no tier has it.
    pub fn get(&self, key: &str) -> Value {
        self.lookup(key).cloned().unwrap_or_default()
    }

    /// Returns the resolved value for `key`, or `fallback` if no tier has it.
    ///
    /// The fallback is used whenever it is supplied, including `false` and `0`.
    pub fn get_or(&self, key: &str, fallback: impl Into<Value>) -> Value {
        match self.lookup(key) {
            Some(value) => value.clone(),
            None => fallback.into(),
        }
    }

    /// Returns the resolved value for `key`, computing a fallback on a miss.
    pub fn get_or_else<F>(&self, key: &str, fallback: F) -> Value
    where
        F: FnOnce(&Key) -> Value,
    {
        match self.lookup(key) {
            Some(value) => value.clone(),
            None => fallback(&Key::from(key)),
        }
    }

    /// Writes `value` at `key` in the explicit tier.
    ///
    /// Tables are flattened into dotted keys first. Each leaf under the active
    /// environment (`<env>.<rest>`) is also written to the priority tier as
    /// `<rest>`; the scoped key itself still lands in the explicit tier.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Attribute>) {
        for (key, value) in flatten(key.into(), value.into()) {
            self.insert(key, value);
        }
    }

    /// Like [`set`](Self::set), with `key` interpreted relative to `scope`.
    pub fn set_scoped(&mut self, key: &str, value: impl Into<Attribute>, scope: &str) {
        self.set(Key::scoped(scope, key), value);
    }

    fn insert(&mut self, key: Key, value: Value) {
        if let Some(suffix) = self.scope.as_ref().and_then(|s| s.promote(key.as_str())) {
            trace!(%key, promoted = suffix, "promoting environment-scoped key");
            self.priority.insert(Key::from(suffix), value.clone());
        }
        self.values.insert(key, value);
    }

    /// Projects the resolved configuration onto environment variables.
    ///
    /// See [`export::to_env`].
    pub fn to_env(&self) -> BTreeMap<String, String> {
        export::to_env(self)
    }
}

impl Index<&str> for Config {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.lookup(key).unwrap_or(&NULL)
    }
}
