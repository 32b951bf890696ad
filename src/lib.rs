//! Note-taking core library
//!
//! This library provides the persistence and derived-view layer for a
//! single-user notes application: validated storage of notes, tag listing,
//! filtering and search, and the optimistic client state that a UI binds to.

mod config;
mod coordinator;
mod errors;
mod filter;
mod helper;
mod note;
mod repository;
mod store;
mod tags;
mod types;

// Re-export key components
pub use config::*;
pub use coordinator::*;
pub use errors::*;
pub use filter::*;
pub use helper::*;
pub use note::*;
pub use repository::*;
pub use store::*;
pub use tags::*;
pub use types::*;
