//! Rich diagnostic error types for the ink-oracle converter.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong with a document or a run.

use miette::Diagnostic;
use thiserror::Error;

use crate::batch::BatchError;
use crate::config::ConfigError;

/// Top-level error type for the converter.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ink(#[from] InkError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Ink errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum InkError {
    #[error("failed to read ink file: {path}")]
    #[diagnostic(
        code(oracle::ink::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed InkML markup: {message}")]
    #[diagnostic(
        code(oracle::ink::xml),
        help(
            "The document is not well-formed XML. It is treated as a document \
             with no strokes and produces an empty label graph."
        )
    )]
    Xml { message: String },

    #[error("trace element without an id attribute")]
    #[diagnostic(
        code(oracle::ink::missing_trace_id),
        help("Every <trace> must carry an `id` so ground truth can reference it.")
    )]
    MissingTraceId,

    #[error("trace {trace_id}: invalid coordinate \"{value}\"")]
    #[diagnostic(
        code(oracle::ink::invalid_coordinate),
        help("Coordinates must be finite decimal numbers separated by whitespace.")
    )]
    InvalidCoordinate { trace_id: String, value: String },

    #[error("trace {trace_id}: point has {found} channel(s), need at least x and y")]
    #[diagnostic(
        code(oracle::ink::short_point),
        help("Each comma-separated point must start with an x and a y value.")
    )]
    ShortPoint { trace_id: String, found: usize },

    #[error("trace {trace_id} contains no points")]
    #[diagnostic(
        code(oracle::ink::empty_trace),
        help("A stroke needs at least one point to take part in grouping.")
    )]
    EmptyTrace { trace_id: String },
}

pub type InkResult<T> = std::result::Result<T, InkError>;

// ---------------------------------------------------------------------------
// Annotation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AnnotationError {
    #[error("failed to read ground-truth file: {path}")]
    #[diagnostic(
        code(oracle::annotation::io),
        help("The paired .lg file could not be read. Check its permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("symbol trace group #{position} has no class annotation")]
    #[diagnostic(
        code(oracle::annotation::missing_class),
        help(
            "Each nested <traceGroup> needs an <annotation> child naming the symbol class. \
             The whole annotation block is ignored and every stroke becomes ABSENT."
        )
    )]
    MissingClass { position: usize },
}

pub type AnnotationResult<T> = std::result::Result<T, AnnotationError>;

// ---------------------------------------------------------------------------
// Topology errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TopologyError {
    #[error("symbol group {group_id} has no member strokes")]
    #[diagnostic(
        code(oracle::topology::empty_group),
        help("Every symbol group must cover at least one stroke. This is a grouping bug.")
    )]
    EmptyGroup { group_id: String },

    #[error("symbol group {group_id} references unknown stroke {stroke_id}")]
    #[diagnostic(
        code(oracle::topology::unknown_stroke),
        help("Groups must only reference strokes present in the document trace.")
    )]
    UnknownStroke { group_id: String, stroke_id: String },

    #[error("symbol group {group_id} has no coordinate points")]
    #[diagnostic(
        code(oracle::topology::no_points),
        help("Every stroke of a group must contain at least one point.")
    )]
    NoPoints { group_id: String },
}

pub type TopologyResult<T> = std::result::Result<T, TopologyError>;

// ---------------------------------------------------------------------------
// Output errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OutputError {
    #[error("failed to create output directory: {path}")]
    #[diagnostic(
        code(oracle::output::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write label graph: {path}")]
    #[diagnostic(
        code(oracle::output::write),
        help("Check available disk space and write permissions.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input path has no file stem: {path}")]
    #[diagnostic(
        code(oracle::output::no_stem),
        help("Output files are named after the input file; the input needs a file name.")
    )]
    NoStem { path: String },
}

pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Convenience result type for whole-document operations.
pub type OracleResult<T> = std::result::Result<T, OracleError>;
