//! Application state record.

use deck_core::{Error, GenerationConfig, Presentation};
use std::fmt;

/// Workflow status of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    ParsingPdf,
    GeneratingContent,
    Success,
    GeneratingPpt,
    Error,
}

impl Status {
    /// Whether a collaborator call is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::ParsingPdf | Self::GeneratingContent | Self::GeneratingPpt
        )
    }

    /// Whether new input may be ingested or generated from.
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ParsingPdf => "parsing document",
            Self::GeneratingContent => "generating content",
            Self::Success => "ready",
            Self::GeneratingPpt => "exporting",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Everything the user interface renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub status: Status,
    /// Source text, from ingestion or pasted directly.
    pub input_text: String,
    pub presentation: Option<Presentation>,
    /// Last failure, cleared by the next successful step.
    pub error: Option<Error>,
    pub config: GenerationConfig,
}

/// Outcome of a controller operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T = Status> {
    /// The operation ran; carries the resulting status or value.
    Settled(T),
    /// The operation was not allowed in the current state, or its result
    /// arrived after a reset.
    Ignored,
}

impl<T> Dispatch<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn settled(self) -> Option<T> {
        match self {
            Self::Settled(value) => Some(value),
            Self::Ignored => None,
        }
    }
}

/// A finished `.pptx` file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
