pub mod config;

pub use config::{
    load, load_from_env, Attribute, Attributes, Config, ConfigBuilder, ConfigError, Key, Value,
};
