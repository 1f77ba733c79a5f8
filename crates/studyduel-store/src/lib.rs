//! studyduel-store — profile store adapters, question sources, and configuration.
//!
//! Implements the `ProfileStore` trait over memory, a local JSON file, and a
//! remote REST service, and loads question sets from TOML files.

pub mod config;
pub mod file;
pub mod http;
pub mod memory;
pub mod questions;

pub use config::{create_store, load_config, load_config_from, StoreConfig, StudyduelConfig};
pub use file::JsonFileStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use questions::QuestionSetSource;
pub use studyduel_core::error::StoreError;
