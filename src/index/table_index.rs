use crate::catalog::SchemaRef;
use crate::config::ArenaConfig;
use crate::error::{LarchError, LarchResult};
use crate::index::key::{IndexKey, InlineKey, KeyLayout, ReferenceKey};
use crate::index::tree::{CompactingTree, TreeIter};
use crate::storage::row::RowRef;
use log::debug;

/// How keys are materialized inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRepresentation {
    /// Keys indirect through the owning row at comparison time. Works for
    /// any orderable column types; no value is copied.
    Reference,
    /// Keys carry up to `width` integer column values inline; comparisons
    /// never touch the row. Restricted to non-nullable integral columns that
    /// fit a signed 64-bit word.
    Inline { width: usize },
}

/// Construction-time description of an index: which table columns form the
/// key, whether equal keys are allowed, and how keys are represented.
#[derive(Debug, Clone)]
pub struct IndexScheme {
    pub name: String,
    pub table_schema: SchemaRef,
    pub column_indices: Vec<usize>,
    pub unique: bool,
    pub representation: KeyRepresentation,
}

#[derive(Debug)]
enum Engine {
    Reference(CompactingTree<ReferenceKey>),
    Inline1(CompactingTree<InlineKey<1>>),
    Inline2(CompactingTree<InlineKey<2>>),
    Inline3(CompactingTree<InlineKey<3>>),
    Inline4(CompactingTree<InlineKey<4>>),
}

macro_rules! with_engine {
    ($self:expr, $tree:ident => $body:expr) => {
        match &$self.engine {
            Engine::Reference($tree) => $body,
            Engine::Inline1($tree) => $body,
            Engine::Inline2($tree) => $body,
            Engine::Inline3($tree) => $body,
            Engine::Inline4($tree) => $body,
        }
    };
}

macro_rules! with_engine_mut {
    ($self:expr, $tree:ident => $body:expr) => {
        match &mut $self.engine {
            Engine::Reference($tree) => $body,
            Engine::Inline1($tree) => $body,
            Engine::Inline2($tree) => $body,
            Engine::Inline3($tree) => $body,
            Engine::Inline4($tree) => $body,
        }
    };
}

/// Ordered tree index over rows of one table. The representation chosen in
/// the scheme is resolved to a concrete engine once, here, so the per-
/// comparison dispatch cost is paid at construction instead of on the hot
/// path.
///
/// All mutating operations take `&mut self`; a partitioned engine owns each
/// index instance from exactly one worker at a time.
#[derive(Debug)]
pub struct TableIndex {
    scheme: IndexScheme,
    engine: Engine,
}

impl TableIndex {
    pub fn try_new(scheme: IndexScheme) -> LarchResult<Self> {
        Self::try_new_with_config(scheme, ArenaConfig::default())
    }

    pub fn try_new_with_config(scheme: IndexScheme, config: ArenaConfig) -> LarchResult<Self> {
        let layout = KeyLayout::try_new(&scheme.table_schema, scheme.column_indices.clone())?;
        let engine = match scheme.representation {
            KeyRepresentation::Reference => {
                ReferenceKey::check_layout(&layout)?;
                Engine::Reference(CompactingTree::new(layout, scheme.unique, &config))
            }
            KeyRepresentation::Inline { width } => match width {
                1 => {
                    InlineKey::<1>::check_layout(&layout)?;
                    Engine::Inline1(CompactingTree::new(layout, scheme.unique, &config))
                }
                2 => {
                    InlineKey::<2>::check_layout(&layout)?;
                    Engine::Inline2(CompactingTree::new(layout, scheme.unique, &config))
                }
                3 => {
                    InlineKey::<3>::check_layout(&layout)?;
                    Engine::Inline3(CompactingTree::new(layout, scheme.unique, &config))
                }
                4 => {
                    InlineKey::<4>::check_layout(&layout)?;
                    Engine::Inline4(CompactingTree::new(layout, scheme.unique, &config))
                }
                _ => {
                    return Err(LarchError::NotSupport(format!(
                        "inline key width {width} (supported widths are 1..=4)"
                    )))
                }
            },
        };
        debug!(
            "created index \"{}\" over columns {:?}, unique={}, representation={:?}",
            scheme.name, scheme.column_indices, scheme.unique, scheme.representation
        );
        Ok(Self { scheme, engine })
    }

    pub fn name(&self) -> &str {
        &self.scheme.name
    }

    pub fn scheme(&self) -> &IndexScheme {
        &self.scheme
    }

    pub fn key_schema(&self) -> &SchemaRef {
        with_engine!(self, tree => &tree.layout().key_schema)
    }

    /// Live entry count. The backing arena holds exactly this many nodes.
    pub fn len(&self) -> usize {
        with_engine!(self, tree => tree.len())
    }

    pub fn is_empty(&self) -> bool {
        with_engine!(self, tree => tree.is_empty())
    }

    /// Index the row. Returns false when the index is unique and an entry
    /// with an equal key already exists; nothing is mutated in that case.
    pub fn add_entry(&mut self, row: &RowRef) -> bool {
        with_engine_mut!(self, tree => tree.insert(row))
    }

    /// Remove the entry for exactly this row, leaving entries that merely
    /// share its key in place. Returns false when no such entry exists.
    pub fn delete_entry(&mut self, row: &RowRef) -> bool {
        with_engine_mut!(self, tree => tree.erase(row))
    }

    /// Whether an entry for exactly this row is indexed.
    pub fn exists(&self, row: &RowRef) -> bool {
        with_engine!(self, tree => tree.exists(row))
    }

    /// Whether any entry carries a key equal to this row's key.
    pub fn contains_key(&self, row: &RowRef) -> bool {
        with_engine!(self, tree => tree.contains_key(row))
    }

    /// Re-point the entry for `old_row` at `new_row` without moving it.
    /// Precondition (not verified here): the indexed columns are equal
    /// between the two row images. Returns false when no entry references
    /// `old_row`.
    pub fn replace_entry_no_key_change(&mut self, new_row: &RowRef, old_row: &RowRef) -> bool {
        with_engine_mut!(self, tree => tree.replace_no_key_change(old_row, new_row))
    }

    /// All entries in key order; equal keys appear consecutively, oldest
    /// entry first.
    pub fn iter(&self) -> IndexIter<'_> {
        IndexIter(match &self.engine {
            Engine::Reference(tree) => IterInner::Reference(tree.iter()),
            Engine::Inline1(tree) => IterInner::Inline1(tree.iter()),
            Engine::Inline2(tree) => IterInner::Inline2(tree.iter()),
            Engine::Inline3(tree) => IterInner::Inline3(tree.iter()),
            Engine::Inline4(tree) => IterInner::Inline4(tree.iter()),
        })
    }

    /// Entries in key order starting at the first key >= the probe row's key.
    pub fn scan_from(&self, row: &RowRef) -> IndexIter<'_> {
        IndexIter(match &self.engine {
            Engine::Reference(tree) => IterInner::Reference(tree.iter_from(row)),
            Engine::Inline1(tree) => IterInner::Inline1(tree.iter_from(row)),
            Engine::Inline2(tree) => IterInner::Inline2(tree.iter_from(row)),
            Engine::Inline3(tree) => IterInner::Inline3(tree.iter_from(row)),
            Engine::Inline4(tree) => IterInner::Inline4(tree.iter_from(row)),
        })
    }
}

enum IterInner<'a> {
    Reference(TreeIter<'a, ReferenceKey>),
    Inline1(TreeIter<'a, InlineKey<1>>),
    Inline2(TreeIter<'a, InlineKey<2>>),
    Inline3(TreeIter<'a, InlineKey<3>>),
    Inline4(TreeIter<'a, InlineKey<4>>),
}

pub struct IndexIter<'a>(IterInner<'a>);

impl<'a> Iterator for IndexIter<'a> {
    type Item = &'a RowRef;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.0 {
            IterInner::Reference(it) => it.next(),
            IterInner::Inline1(it) => it.next(),
            IterInner::Inline2(it) => it.next(),
            IterInner::Inline3(it) => it.next(),
            IterInner::Inline4(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexScheme, KeyRepresentation, TableIndex};
    use crate::catalog::{Column, DataType, Schema, SchemaRef};
    use crate::storage::row::RowRef;
    use crate::storage::tuple::Tuple;
    use std::sync::Arc;

    fn table_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Column::new("id", DataType::Int64, false),
            Column::new("tag", DataType::Int64, false),
            Column::new("payload", DataType::Varchar(None), true),
        ]))
    }

    fn scheme(representation: KeyRepresentation, columns: Vec<usize>, unique: bool) -> IndexScheme {
        IndexScheme {
            name: "idx_test".to_string(),
            table_schema: table_schema(),
            column_indices: columns,
            unique,
            representation,
        }
    }

    fn row(id: i64, tag: i64) -> RowRef {
        RowRef::new(Tuple::new(
            table_schema(),
            vec![id.into(), tag.into(), Some("p".to_string()).into()],
        ))
    }

    #[test]
    fn representation_incompatibility_is_a_construction_error() {
        // varchar key column: fine by reference, rejected inline
        assert!(TableIndex::try_new(scheme(KeyRepresentation::Reference, vec![2], false)).is_ok());
        assert!(
            TableIndex::try_new(scheme(KeyRepresentation::Inline { width: 1 }, vec![2], false))
                .is_err()
        );

        // two key columns do not fit an inline width of one
        assert!(
            TableIndex::try_new(scheme(KeyRepresentation::Inline { width: 1 }, vec![0, 1], false))
                .is_err()
        );
        assert!(
            TableIndex::try_new(scheme(KeyRepresentation::Inline { width: 2 }, vec![0, 1], false))
                .is_ok()
        );

        assert!(
            TableIndex::try_new(scheme(KeyRepresentation::Inline { width: 9 }, vec![0], false))
                .is_err()
        );
    }

    #[test]
    fn representations_behave_identically() {
        let mut by_reference =
            TableIndex::try_new(scheme(KeyRepresentation::Reference, vec![0, 1], false)).unwrap();
        let mut by_value =
            TableIndex::try_new(scheme(KeyRepresentation::Inline { width: 2 }, vec![0, 1], false))
                .unwrap();

        let rows: Vec<RowRef> = (0..64).map(|i| row(i % 8, i / 8)).collect();
        for r in rows.iter() {
            assert!(by_reference.add_entry(r));
            assert!(by_value.add_entry(r));
        }
        for r in rows.iter().step_by(3) {
            assert!(by_reference.delete_entry(r));
            assert!(by_value.delete_entry(r));
        }

        assert_eq!(by_reference.len(), by_value.len());
        for r in rows.iter() {
            assert_eq!(by_reference.exists(r), by_value.exists(r));
        }
        let lhs: Vec<usize> = by_reference.iter().map(|r| r.id()).collect();
        let rhs: Vec<usize> = by_value.iter().map(|r| r.id()).collect();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn unique_index_reports_duplicates() {
        let mut index =
            TableIndex::try_new(scheme(KeyRepresentation::Inline { width: 1 }, vec![0], true))
                .unwrap();
        let first = row(7, 0);
        assert!(index.add_entry(&first));
        assert!(!index.add_entry(&row(7, 1)));
        assert_eq!(index.len(), 1);
        assert!(index.exists(&first));
    }
}
