//! Wide table keyed by problem size with one column per active series.
//!
//! Invariants:
//! - the problem-size key is column 0; value columns are looked up by id,
//!   never by position;
//! - exactly one row per problem size, rows ascending;
//! - every row holds at least one value. Rows left with only missing cells
//!   after a removal are pruned, which makes add-then-remove of the same
//!   series an exact identity.

use std::collections::BTreeMap;

use pd_core::{ProblemSize, Real};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::AggregateMap;
use crate::metric::{ColumnId, SeriesKey};

pub const DEFAULT_KEY_LABEL: &str = "SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub id: ColumnId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    key_label: String,
    columns: Vec<Column>,
    rows: BTreeMap<ProblemSize, Vec<Option<Real>>>,
}

impl Default for PivotTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PivotTable {
    pub fn new() -> Self {
        Self::with_key_label(DEFAULT_KEY_LABEL)
    }

    pub fn with_key_label(key_label: impl Into<String>) -> Self {
        Self {
            key_label: key_label.into(),
            columns: Vec::new(),
            rows: BTreeMap::new(),
        }
    }

    pub fn key_label(&self) -> &str {
        &self.key_label
    }

    /// Number of columns including the key column.
    pub fn column_count(&self) -> usize {
        self.columns.len() + 1
    }

    pub fn series_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value columns, excluding the key.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = ProblemSize> + '_ {
        self.rows.keys().copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (ProblemSize, &[Option<Real>])> + '_ {
        self.rows.iter().map(|(k, cells)| (*k, cells.as_slice()))
    }

    pub fn contains_column(&self, id: &ColumnId) -> bool {
        self.position(id).is_some()
    }

    /// `None` when the column is absent or the cell is missing.
    pub fn value(&self, size: ProblemSize, id: &ColumnId) -> Option<Real> {
        let idx = self.position(id)?;
        self.rows.get(&size).and_then(|cells| cells[idx])
    }

    /// Present values of one column, ascending by size.
    pub fn column_values(&self, id: &ColumnId) -> Option<AggregateMap> {
        let idx = self.position(id)?;
        Some(
            self.rows
                .iter()
                .filter_map(|(k, cells)| cells[idx].map(|v| (*k, v)))
                .collect(),
        )
    }

    pub fn add_series(&mut self, key: &SeriesKey, values: &AggregateMap) {
        self.add_column(key.column_id(), key.label(), values);
    }

    /// Full outer join of `values` onto the table on the problem size.
    ///
    /// Re-adding an existing id replaces that column's values in place.
    pub fn add_column(&mut self, id: ColumnId, label: String, values: &AggregateMap) {
        let idx = match self.position(&id) {
            Some(idx) => {
                self.columns[idx].label = label;
                for (size, cells) in self.rows.iter_mut() {
                    cells[idx] = values.get(size).copied();
                }
                idx
            }
            None => {
                self.columns.push(Column { id, label });
                for (size, cells) in self.rows.iter_mut() {
                    cells.push(values.get(size).copied());
                }
                self.columns.len() - 1
            }
        };

        let width = self.columns.len();
        for (&size, &value) in values {
            self.rows.entry(size).or_insert_with(|| {
                let mut cells = vec![None; width];
                cells[idx] = Some(value);
                cells
            });
        }
        self.prune_empty_rows();
    }

    /// Drops the series' column. Returns `false` if it was never added.
    pub fn remove_series(&mut self, key: &SeriesKey) -> bool {
        self.remove_column(&key.column_id())
    }

    pub fn remove_column(&mut self, id: &ColumnId) -> bool {
        let Some(idx) = self.position(id) else {
            debug!(column = %id, "remove of absent column ignored");
            return false;
        };
        self.columns.remove(idx);
        for cells in self.rows.values_mut() {
            cells.remove(idx);
        }
        self.prune_empty_rows();
        true
    }

    pub fn with_series(mut self, key: &SeriesKey, values: &AggregateMap) -> Self {
        self.add_series(key, values);
        self
    }

    pub fn without_series(mut self, key: &SeriesKey) -> Self {
        self.remove_series(key);
        self
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
    }

    fn position(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    fn prune_empty_rows(&mut self) {
        self.rows.retain(|_, cells| cells.iter().any(Option::is_some));
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::metric::MetricKind;
    use pd_core::ThreadCount;
    use proptest::prelude::*;

    fn map_strategy() -> impl Strategy<Value = AggregateMap> {
        prop::collection::btree_map(0_u16..50, 0.0_f64..10.0, 0..12).prop_map(|m| {
            m.into_iter()
                .map(|(k, v)| (ProblemSize::new(f64::from(k)).unwrap(), v))
                .collect()
        })
    }

    fn key_strategy() -> impl Strategy<Value = SeriesKey> {
        (0_u32..8, prop::bool::ANY).prop_map(|(p, e2e)| {
            let metric = if e2e {
                MetricKind::EndToEnd
            } else {
                MetricKind::Algorithm
            };
            SeriesKey::new(ThreadCount(p), metric)
        })
    }

    proptest! {
        #[test]
        fn add_then_remove_is_identity(
            existing in prop::collection::vec((key_strategy(), map_strategy()), 0..6),
            key in key_strategy(),
            values in map_strategy(),
        ) {
            let mut table = PivotTable::new();
            for (k, m) in &existing {
                table.add_series(k, m);
            }
            prop_assume!(!table.contains_column(&key.column_id()));

            let before = table.clone();
            table.add_series(&key, &values);
            prop_assert!(table.remove_series(&key));
            prop_assert_eq!(table, before);
        }

        #[test]
        fn rows_are_the_union_of_live_series(
            series in prop::collection::vec((key_strategy(), map_strategy()), 0..6),
        ) {
            let mut table = PivotTable::new();
            let mut live: BTreeMap<ColumnId, AggregateMap> = BTreeMap::new();
            for (k, m) in &series {
                table.add_series(k, m);
                live.insert(k.column_id(), m.clone());
            }

            let expected: Vec<ProblemSize> = live
                .values()
                .flat_map(|m| m.keys().copied())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            let actual: Vec<ProblemSize> = table.keys().collect();
            prop_assert_eq!(actual, expected);

            for (id, m) in &live {
                let values = table.column_values(id);
                prop_assert_eq!(values.as_ref(), Some(m));
            }
        }
    }
}
