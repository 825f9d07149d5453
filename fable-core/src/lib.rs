//! Fable Core Library
//!
//! Domain engine for the Fable publishing platform: the entities, the
//! ownership rules governing who may create, mutate or delete them, and the
//! integrity guarantees that hold when entities with dependents are removed.

pub mod cascade;
pub mod credentials;
pub mod entities;
pub mod error;
pub mod policy;
pub mod session;
pub mod store;

pub use cascade::CascadeReport;
pub use entities::{Book, Chapter, Comment, User};
pub use error::{FableError, Result};
pub use session::SessionGate;
pub use store::Store;
