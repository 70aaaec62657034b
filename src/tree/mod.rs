//! In-memory tree model.
//!
//! This module handles everything about trees that does not touch the
//! coordination service:
//! - The [`Node`] type shared by desired and live trees
//! - Path helpers for the `/`-separated namespace
//! - Loading and writing serialized trees
//! - Structural validation and fingerprinting

mod hash;
mod node;
mod parser;
pub mod path;
mod validator;

pub use hash::TreeHasher;
pub use node::Node;
pub use parser::{TreeFormat, TreeParser};
pub use validator::TreeValidator;
