//! Shared utilities for the Tern translator.
mod errors;
mod id;
mod math;
mod out_file;

pub use errors::{Error, TernResult};
pub use id::{GSym, GetName, Id};
pub use math::bits_needed_for;
pub use out_file::OutputFile;
