//! A line-oriented console for a small rental-listing domain.
//!
//! Users, places, reviews and friends are created, inspected, updated and
//! destroyed through commands typed at a prompt; every live object is kept in a
//! [`FileStorage`] that is flushed to a JSON file after each change and loaded
//! back on startup.
//!
//! The main entry point is [`Interpreter`], which rewrites `Class.method(args)`
//! lines, splits them into words and dispatches them to a set of pluggable
//! command factories. The public modules [`command`], [`models`] and [`storage`]
//! expose the traits and types behind it.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod interpreter;
pub mod lexer;
pub mod models;
pub mod parser;
pub mod storage;

/// Just a convenient re-export of the console.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use models::{ClassName, Entity};
pub use storage::FileStorage;
