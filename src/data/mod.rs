//! Data module - dataset loading and schema configuration

mod loader;
mod schema;

pub use loader::{DataLoader, DataSource, LoaderError};
pub use schema::{
    Breakdown, DatasetConfig, DatasetSchema, RoundColumnPair, RoundColumns, SchemaError,
};
