//! SQL text helpers shared by the renderer and the executors.

pub mod markers;

pub use markers::{bind_markers, references, to_positional, BindMarker, PositionalSql};
