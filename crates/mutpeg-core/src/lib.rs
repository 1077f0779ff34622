//! Program Expression Graph core: node model, hash-consing store, printers
//! and the structural equivalence checker.
//!
//! Everything a translator produces lives in one [`NodeStore`]. Nodes are
//! referenced by [`NodeId`] and never mutated after interning; loop
//! continuations are bound later through the store's blank table.

pub mod constructors;
pub mod equivalence;
pub mod error;
pub mod id;
pub mod node;
pub mod ops;
pub mod printer;
pub mod store;

// Re-export commonly used types
pub use equivalence::{check_equivalence, Equivalences, Witness};
pub use error::CoreError;
pub use id::NodeId;
pub use node::{Children, HeapRef, PegNode};
pub use ops::{PegOp, DIVIDE_BY_ZERO_EXCEPTION, NULL_POINTER_EXCEPTION};
pub use printer::PegPrinter;
pub use store::NodeStore;
