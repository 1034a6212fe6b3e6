//! Layered configuration resolution.

mod builder;
mod defaults;
pub mod env;
mod error;
pub mod export;
mod file;
mod key;
mod store;
mod value;

pub use builder::{load, load_from_env, ConfigBuilder};
pub use defaults::{default_for, defaults};
pub use error::{ConfigError, DocumentError};
pub use file::{DocumentFormat, FileSource};
pub use key::Key;
pub use store::Config;
pub use value::{flatten, Attribute, Attributes, Value};
