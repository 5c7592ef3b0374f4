#![warn(missing_docs)]

//! Decoder for Common Layer Interface (CLI) slice files.
//!
//! A CLI file describes a part as a stack of 2D cross-sections. It starts
//! with a text header and continues with geometry in either a line-oriented
//! text encoding or a packed little-endian opcode stream. Both encodings
//! decode into the same [`Geometry`]: models keyed by ID, each with layers
//! keyed by Z, each holding polylines and hatches in millimeters.
//!
//! # Example
//!
//! ```no_run
//! use clif::decode;
//!
//! let file = decode("part.cli").unwrap();
//! println!("Units: {} mm", file.header().units);
//!
//! for model in file.models() {
//!     for layer in model.layers() {
//!         println!("model {} z={:.3} area={:.3}", model.id(), layer.z(), layer.area());
//!     }
//! }
//! ```

mod ascii;
pub mod binary;
mod cursor;
pub mod error;
pub mod file;
pub mod header;
pub mod model;
pub mod options;
pub mod primitives;
mod reader;
pub mod shape;
pub mod tokens;

pub use binary::Opcode;
pub use error::{DecodeError, Result};
pub use file::{File, FileSummary, LayerSummary, ModelSummary};
pub use header::Header;
pub use model::{Geometry, Layer, LayerCommand, Model};
pub use options::{DecodeOptions, UnknownRecordPolicy};
pub use primitives::{Dimension, DimensionError, FileType, Label, PointHatch, UserData};
pub use reader::{decode, decode_from_buffer, Decoder};
pub use shape::{Direction, Hatch, Measure, PolyLine};
