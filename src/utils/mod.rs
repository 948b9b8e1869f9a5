/*!
 * Small helpers shared across the binder and the descriptor builder.
 */

pub mod naming;

pub use naming::{capitalize, qualify};
