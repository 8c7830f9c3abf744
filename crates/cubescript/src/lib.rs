//! Parser, printer and interpreter for twisty-puzzle move scripts.
//!
//! Scripts describe twist sequences, permutation statements and macros
//! for cube-like puzzles with 2 to 7 layers. Their surface syntax is not
//! fixed: a [`Notation`](cubescript_notation::Notation) selects, per
//! grammatical construct, one of several operator placement styles plus
//! custom token spellings and text macros. One parser serves every legal
//! configuration and builds one consistent [`Node`] tree, which can be
//! applied to a [`Cube`](cubescript_cube::Cube), expanded to primitive
//! twists, rendered back to text, and measured in the common turn
//! metrics.
//!
//! ```
//! use cubescript::{MoveMetrics, ScriptParser};
//! use cubescript_notation::Notation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let notation = Notation::default_notation(3)?;
//! let parser = ScriptParser::new(&notation);
//! let script = parser.parse("(R U R' U')3")?;
//!
//! let mut metrics = MoveMetrics::new();
//! metrics.accept(&script);
//! assert_eq!(metrics.move_count(), 12);
//! assert_eq!(script.serialize(&notation)?, "(R U R' U')3");
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod error;
mod macros;
pub mod metrics;
pub mod parse;
pub mod print;
pub mod state;
pub mod token;

pub use crate::ast::{Leaf, Node, NodeKind, PartFamily, PermItem, PermutationCycle};
pub use crate::error::{ErrorKind, ParseError, PrintError};
pub use crate::metrics::MoveMetrics;
pub use crate::parse::ScriptParser;
pub use crate::state::to_permutation_string;

#[cfg(test)]
mod tests;
