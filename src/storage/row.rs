use crate::storage::tuple::Tuple;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// Identity of a live row allocation. Stable for as long as the row is held
/// anywhere, which makes it usable both as an exact-match discriminator among
/// entries sharing a key and as a log-friendly handle.
pub type RowId = usize;

/// Shared handle to a row owned by the surrounding engine. Indexes store
/// clones of this handle but never free the row storage themselves; two
/// handles are the same row only if they point at the same allocation,
/// regardless of column values.
#[derive(Debug, Clone)]
pub struct RowRef(Arc<Tuple>);

impl RowRef {
    pub fn new(tuple: Tuple) -> Self {
        Self(Arc::new(tuple))
    }

    pub fn id(&self) -> RowId {
        Arc::as_ptr(&self.0) as RowId
    }

    pub fn same_row(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Tuple> for RowRef {
    fn from(tuple: Tuple) -> Self {
        Self::new(tuple)
    }
}

impl Deref for RowRef {
    type Target = Tuple;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for RowRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:#x}", self.0, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::RowRef;
    use crate::catalog::{Column, DataType, Schema};
    use crate::storage::tuple::Tuple;
    use std::sync::Arc;

    #[test]
    fn row_identity_is_per_allocation() {
        let schema = Arc::new(Schema::new(vec![Column::new("a", DataType::Int64, false)]));
        let row1 = RowRef::new(Tuple::new(schema.clone(), vec![7i64.into()]));
        let row2 = RowRef::new(Tuple::new(schema.clone(), vec![7i64.into()]));
        let alias = row1.clone();

        assert!(row1.same_row(&alias));
        assert_eq!(row1.id(), alias.id());
        assert!(!row1.same_row(&row2));
        assert_eq!(*row1, *row2);
    }
}
