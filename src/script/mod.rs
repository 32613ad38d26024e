//! Instruction trees and the script-parsing seam.
//!
//! - **node**: the `Node` tree slots execute against
//! - **parser**: the `ScriptParser` trait and the plain reference parser

pub mod node;
pub mod parser;

pub use node::Node;
pub use parser::{PlainParser, ScriptParser};
