//! bingo-store: Persistence and subscription contract
//!
//! The game never holds global state. Players, events, the validated set and
//! pending requests all live in a [`DocumentStore`]; [`MemoryStore`] is the
//! in-process implementation.

pub mod collection;
pub mod error;
pub mod memory;
pub mod store;

pub use collection::*;
pub use error::*;
pub use memory::*;
pub use store::*;
