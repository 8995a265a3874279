//! Canonical model representation: trees and forests.

mod forest;
mod tree;

pub use forest::{Forest, ForestValidationError};
pub use tree::{MutableTree, NodeId, Tree, TreeValidationError};
