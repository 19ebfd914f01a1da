mod column;
mod data_type;
mod schema;

pub use column::{Column, ColumnRef};
pub use data_type::DataType;
pub use schema::*;
