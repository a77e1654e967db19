//! Library entry for galaxy-lists exposing the list core for integration tests.

pub mod app;
pub mod args;
pub mod error;
pub mod logic;
pub mod settings;
pub mod sources;
pub mod state;
pub mod util;

pub use error::{GalaxyError, Result};
