//! PLC Common Library
//!
//! Shared building blocks for every crate in the PLC simulator workspace.
//!
//! # Module Structure
//!
//! - [`image`] - Process image: the four typed register banks and their locking
//! - [`io`] - I/O role map used by the fixed rung set
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Sizing, timing and process-model constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use plc_common::prelude::*;
//!
//! let image = ProcessImage::new(BankSizes::uniform(64));
//! image.write_word(Bank::IntegerOutputs, 4, 800).unwrap();
//! assert_eq!(image.read_word(Bank::IntegerOutputs, 4), Ok(800));
//! ```

pub mod config;
pub mod consts;
pub mod image;
pub mod io;
pub mod prelude;
