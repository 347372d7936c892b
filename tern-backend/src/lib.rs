//! Backends for the Tern translator.
mod traits;
mod uclid;

pub use traits::Backend;
pub use uclid::{emit_circuit, UclidBackend};
