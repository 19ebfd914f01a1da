pub mod key;
pub mod table_index;
pub mod tree;

pub use key::{IndexKey, InlineKey, KeyLayout, ReferenceKey};
pub use table_index::{IndexIter, IndexScheme, KeyRepresentation, TableIndex};
pub use tree::{CompactingTree, SlotId, TreeIter};
