//! Typed error hierarchy for the restoration engine.
//!
//! Mirrors the fatal error taxonomy of the original tool: each variant corresponds to exactly
//! one of the process-terminating conditions the engine can hit. Library code returns
//! `Result<T, DiacError>`; the binary layers `anyhow::Context` on top to attach what it was
//! doing when the error occurred.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiacError {
    #[error("input could not be read: {0}")]
    Input(#[source] std::io::Error),

    #[error("could not write to the output: {0}")]
    Output(#[source] std::io::Error),

    #[error(
        "model file could not be read ({path}). Make sure the model file is present alongside the executable"
    )]
    Model {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "offset index file could not be read ({path}). Make sure the offset index file is present alongside the executable"
    )]
    OffsetIndex {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "dictionary file could not be read ({path}). Make sure the dictionary file is present alongside the executable"
    )]
    Dictionary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid command-line option: {0}")]
    InvalidOption(String),

    #[error("some words have been lost due to multi threading; this should not have happened")]
    MultithreadingLoss,
}

pub type DiacResult<T> = Result<T, DiacError>;
