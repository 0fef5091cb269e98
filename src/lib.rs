// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # ink-oracle
//!
//! Oracle converter for handwritten mathematics. Given the ink of a formula
//! and its ground truth, it builds the symbol/relationship graph a parser
//! would produce with perfect segmentation and classification, under a
//! chosen topology.
//!
//! ## Architecture
//!
//! - **Ink** (`inkml`, `ink`): XML tree and trace loading with coordinate scaling
//! - **Ground truth** (`annotation`): trace-group symbols and `.lg` relationships
//! - **Grouping** (`grouping`): stroke- or symbol-level partition of the trace
//! - **Reconciliation** (`reconcile`): labels and directions from ground truth
//! - **Topology** (`topology`): left-right chain or nearest-point MST
//! - **Oracle** (`oracle`): the four modes over a loaded document
//! - **Output** (`lg`), **batch runs** (`batch`), **settings** (`config`)
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//! use ink_oracle::oracle::{Document, OracleMode};
//!
//! let ink = Path::new("formula.inkml");
//! let doc = Document::load(ink, Path::new("formula.lg"), 10_000.0).unwrap();
//! let output = doc.run(OracleMode::MstSymbol).unwrap();
//! print!("{}", ink_oracle::lg::LabelGraph(&output));
//! ```

pub mod annotation;
pub mod batch;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod ink;
pub mod inkml;
pub mod lg;
pub mod oracle;
pub mod reconcile;
pub mod topology;
