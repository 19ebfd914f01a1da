pub mod row;
pub mod tuple;

pub use row::{RowId, RowRef};
pub use tuple::Tuple;
