//! Application controller for the deck generator.
//!
//! Owns the single application state record and drives the ingestion,
//! generation, edit and export steps through pluggable collaborators.

pub mod collaborators;
pub mod controller;
pub mod state;

pub use collaborators::{Exporter, Generator, Ingestor};
pub use controller::{Controller, GeminiController};
pub use state::{AppState, Dispatch, ExportedFile, Status};
