//! Defines the interface implemented by every backend.
use tern_ir as ir;
use tern_utils::{OutputFile, TernResult};

/// A backend for the translator. A backend validates that the circuit is in
/// the shape it accepts and then renders it to an output sink.
pub trait Backend {
    /// The name of this backend.
    fn name(&self) -> &'static str;

    /// Validate the circuit for this backend.
    fn validate(ctx: &ir::Context) -> TernResult<()>;

    /// Render the circuit and write it to `file`.
    fn emit(ctx: &ir::Context, file: &mut OutputFile) -> TernResult<()>;

    /// Convenience wrapper for the validate-then-emit flow.
    fn run(&self, ctx: &ir::Context, mut file: OutputFile) -> TernResult<()> {
        Self::validate(ctx)?;
        Self::emit(ctx, &mut file)
    }
}
