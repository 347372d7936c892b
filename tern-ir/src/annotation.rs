//! Side-channel annotations that travel with a circuit.
use tern_utils::Id;

/// An annotation attached to a circuit. Verification directives name their
/// targets by reference; the translator resolves them to labeled statements
/// in the emitted model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Bound for model-checker unrolling. At most one per circuit.
    Bmc { steps: u64 },
    /// Treat the named 1-bit signal as an assumption.
    Assume { target: Id },
    /// Treat the named 1-bit signal as an invariant to check.
    Property { target: Id },
    /// Ask the translator to render the circuit.
    EmitCircuit,
    /// The rendered text, appended by the translator in response to
    /// [`Annotation::EmitCircuit`].
    EmittedCircuit { text: String },
}
