//! # bingo-card — Cards and line evaluation
//!
//! ## Architecture
//!
//! ```text
//! outcome pool ──> CardGenerator ──> Card (5×5, row-major)
//!                                      │
//!               confirmed outcomes ──> evaluate() ──> Evaluation
//! ```
//!
//! Both the generator and the evaluator are free of I/O. The generator takes
//! an optional seed so tests get the same card every run.

pub mod card;
pub mod evaluator;
pub mod generator;

pub use card::*;
pub use evaluator::*;
pub use generator::*;
