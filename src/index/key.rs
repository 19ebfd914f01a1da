use crate::catalog::SchemaRef;
use crate::error::{LarchError, LarchResult};
use crate::storage::row::RowRef;
use std::cmp::Ordering;

/// Which columns of the table schema make up the key, in significance order.
/// Resolved once at index construction; every extraction and comparison runs
/// against the same layout afterwards.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    pub key_schema: SchemaRef,
    pub column_indices: Vec<usize>,
}

impl KeyLayout {
    pub fn try_new(table_schema: &SchemaRef, column_indices: Vec<usize>) -> LarchResult<Self> {
        if column_indices.is_empty() {
            return Err(LarchError::Schema(
                "index requires at least one key column".to_string(),
            ));
        }
        let key_schema = std::sync::Arc::new(table_schema.project(&column_indices)?);
        Ok(Self {
            key_schema,
            column_indices,
        })
    }

    pub fn width(&self) -> usize {
        self.column_indices.len()
    }
}

/// One key representation usable by the tree engine. Rows handed to `extract`
/// and held inside `ReferenceKey` must conform to the table schema the layout
/// was resolved against; the facade validates the layout once so the per-row
/// operations stay infallible.
pub trait IndexKey: Clone + std::fmt::Debug {
    /// Reject layouts this representation cannot carry. Runs at index
    /// construction, never during an insertion.
    fn check_layout(layout: &KeyLayout) -> LarchResult<()>;

    /// Derive the key for a row. No side effects; safe to call on a row that
    /// is about to be deleted.
    fn extract(row: &RowRef, layout: &KeyLayout) -> Self;

    fn compare(&self, other: &Self, layout: &KeyLayout) -> Ordering;
}

/// Key that indirects through the owning row: nothing is copied at insert
/// time and every comparison reads the indexed columns through the row
/// handle. Works for any column type the tuple layer can order.
#[derive(Debug, Clone)]
pub struct ReferenceKey {
    row: RowRef,
}

impl IndexKey for ReferenceKey {
    fn check_layout(_layout: &KeyLayout) -> LarchResult<()> {
        Ok(())
    }

    fn extract(row: &RowRef, _layout: &KeyLayout) -> Self {
        Self { row: row.clone() }
    }

    fn compare(&self, other: &Self, layout: &KeyLayout) -> Ordering {
        for &idx in layout.column_indices.iter() {
            let order = self.row.data[idx]
                .partial_cmp(&other.row.data[idx])
                .unwrap_or(Ordering::Equal);
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    }
}

/// Key with up to `N` integer column values copied inline at extraction time:
/// comparisons never touch the owning row. Unused trailing slots stay zero on
/// every key of the same layout, so whole-array comparison is safe.
#[derive(Debug, Clone, Copy)]
pub struct InlineKey<const N: usize> {
    words: [i64; N],
}

impl<const N: usize> IndexKey for InlineKey<N> {
    fn check_layout(layout: &KeyLayout) -> LarchResult<()> {
        if layout.width() > N {
            return Err(LarchError::Schema(format!(
                "key spans {} columns but inline capacity is {}",
                layout.width(),
                N
            )));
        }
        for col in layout.key_schema.columns.iter() {
            if !col.data_type.fits_inline_word() {
                return Err(LarchError::NotSupport(format!(
                    "column \"{}\" of type {} cannot be carried inline",
                    col.name, col.data_type
                )));
            }
            if col.nullable {
                return Err(LarchError::NotSupport(format!(
                    "nullable column \"{}\" cannot be carried inline",
                    col.name
                )));
            }
        }
        Ok(())
    }

    fn extract(row: &RowRef, layout: &KeyLayout) -> Self {
        let mut words = [0i64; N];
        for (slot, &idx) in layout.column_indices.iter().enumerate() {
            words[slot] = row.data[idx]
                .as_i64()
                .expect("inline-keyed column holds a non-integer or NULL value");
        }
        Self { words }
    }

    fn compare(&self, other: &Self, _layout: &KeyLayout) -> Ordering {
        self.words.cmp(&other.words)
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexKey, InlineKey, KeyLayout, ReferenceKey};
    use crate::catalog::{Column, DataType, Schema, SchemaRef};
    use crate::storage::row::RowRef;
    use crate::storage::tuple::Tuple;
    use std::cmp::Ordering;
    use std::sync::Arc;

    fn test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Column::new("a", DataType::Int64, false),
            Column::new("b", DataType::Int32, false),
            Column::new("c", DataType::Varchar(None), true),
        ]))
    }

    fn row(schema: &SchemaRef, a: i64, b: i32, c: &str) -> RowRef {
        RowRef::new(Tuple::new(
            schema.clone(),
            vec![a.into(), b.into(), c.to_string().into()],
        ))
    }

    #[test]
    fn inline_key_orders_most_significant_column_first() {
        let schema = test_schema();
        let layout = KeyLayout::try_new(&schema, vec![0, 1]).unwrap();

        let low = InlineKey::<2>::extract(&row(&schema, 1, 100, "x"), &layout);
        let mid = InlineKey::<2>::extract(&row(&schema, 2, 1, "x"), &layout);
        let high = InlineKey::<2>::extract(&row(&schema, 2, 2, "x"), &layout);

        assert_eq!(low.compare(&mid, &layout), Ordering::Less);
        assert_eq!(mid.compare(&high, &layout), Ordering::Less);
        assert_eq!(mid.compare(&mid, &layout), Ordering::Equal);
    }

    #[test]
    fn reference_key_reads_through_the_row() {
        let schema = test_schema();
        let layout = KeyLayout::try_new(&schema, vec![1]).unwrap();

        let k1 = ReferenceKey::extract(&row(&schema, 0, 5, "x"), &layout);
        let k2 = ReferenceKey::extract(&row(&schema, 9, 5, "y"), &layout);
        let k3 = ReferenceKey::extract(&row(&schema, 0, 6, "x"), &layout);

        // only column "b" participates
        assert_eq!(k1.compare(&k2, &layout), Ordering::Equal);
        assert_eq!(k1.compare(&k3, &layout), Ordering::Less);
    }

    #[test]
    fn inline_layout_rejections() {
        let schema = test_schema();

        // too many columns for the inline width
        let wide = KeyLayout::try_new(&schema, vec![0, 1]).unwrap();
        assert!(InlineKey::<1>::check_layout(&wide).is_err());
        assert!(InlineKey::<2>::check_layout(&wide).is_ok());

        // varchar cannot be carried inline, but a reference key can order it
        let varchar = KeyLayout::try_new(&schema, vec![2]).unwrap();
        assert!(InlineKey::<1>::check_layout(&varchar).is_err());
        assert!(ReferenceKey::check_layout(&varchar).is_ok());

        // nullable columns are rejected even when integral
        let schema2: SchemaRef = Arc::new(Schema::new(vec![Column::new(
            "n",
            DataType::Int64,
            true,
        )]));
        let nullable = KeyLayout::try_new(&schema2, vec![0]).unwrap();
        assert!(InlineKey::<1>::check_layout(&nullable).is_err());
    }

    #[test]
    fn layout_requires_columns_in_range() {
        let schema = test_schema();
        assert!(KeyLayout::try_new(&schema, vec![]).is_err());
        assert!(KeyLayout::try_new(&schema, vec![3]).is_err());
    }
}
