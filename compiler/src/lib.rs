// sigc — signal-graph rewriting core of the sigc audio-DSP compiler
//
// Library root: the hash-consed signal arena, the memoized transform
// engine, the identity and type-promotion rule sets, and the supporting
// tooling (pretty printer, DOT output, nature oracle).

pub mod dot;
pub mod graph;
pub mod identity;
pub mod pp;
pub mod promotion;
pub mod sig;
pub mod transform;
pub mod types;
