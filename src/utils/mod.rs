//! Utility functions and types

pub mod data_loader;

pub use data_loader::{apply_schema, DataLoader, NULL_TOKENS};
