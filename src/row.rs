//! Assembled rows and the cells they contain.

use std::collections::btree_map::{BTreeMap, Entry};

/// A single versioned value of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell {
    family: String,
    qualifier: Vec<u8>,
    timestamp_micros: i64,
    value: Vec<u8>,
    labels: Vec<String>,
}

impl Cell {
    /// Create a cell from its parts.
    #[inline]
    pub fn new(
        family: impl Into<String>,
        qualifier: impl Into<Vec<u8>>,
        timestamp_micros: i64,
        value: impl Into<Vec<u8>>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp_micros,
            value: value.into(),
            labels,
        }
    }

    /// The column family the cell belongs to.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The column qualifier.
    #[inline]
    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    /// The cell version, in microseconds since the Unix epoch.
    #[inline]
    pub const fn timestamp_micros(&self) -> i64 {
        self.timestamp_micros
    }

    /// The cell contents.
    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Labels applied by a label transformer filter, if any.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Take ownership of the cell contents.
    #[inline]
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

/// A fully assembled row.
///
/// Rows are only ever observed once every chunk making them up has been received and the row has
/// been committed by the server. Cells of each family are kept in the order they arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    key: Vec<u8>,
    families: BTreeMap<String, Vec<Cell>>,
}

impl Row {
    /// The row key.
    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Cells grouped by family name.
    #[inline]
    pub const fn families(&self) -> &BTreeMap<String, Vec<Cell>> {
        &self.families
    }

    /// The cells of a single family, in arrival order. Empty if the family has no cells.
    #[inline]
    pub fn cells(&self, family: &str) -> &[Cell] {
        self.families
            .get(family)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every cell of the row, family by family.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.families.values().flatten()
    }

    /// The total number of cells in the row.
    pub fn cell_count(&self) -> usize {
        self.families.values().map(Vec::len).sum()
    }

    /// Split the row into its key and families.
    #[inline]
    pub fn into_parts(self) -> (Vec<u8>, BTreeMap<String, Vec<Cell>>) {
        (self.key, self.families)
    }
}

/// Accumulates the cells of a row that has not been committed yet.
///
/// The builder is thrown away when the server resets the row and only turns into a [`Row`] on
/// commit, so a partially received row can never escape.
#[derive(Debug)]
pub(crate) struct RowBuilder {
    /// Key of the row being assembled.
    key: Vec<u8>,
    /// Completed cells so far.
    families: BTreeMap<String, Vec<Cell>>,
}

impl RowBuilder {
    /// Begin a row with the given key.
    pub(crate) const fn new(key: Vec<u8>) -> Self {
        Self {
            key,
            families: BTreeMap::new(),
        }
    }

    /// The key of the row being assembled.
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    /// Append a completed cell to its family.
    pub(crate) fn push(&mut self, cell: Cell) {
        match self.families.entry(cell.family.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(cell),
            Entry::Vacant(entry) => {
                let _cells = entry.insert(vec![cell]);
            }
        }
    }

    /// Finish the row.
    pub(crate) fn build(self) -> Row {
        Row {
            key: self.key,
            families: self.families,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cells_keep_arrival_order_within_family() {
        let mut builder = RowBuilder::new(b"row".to_vec());
        builder.push(Cell::new("f", "b", 2, "second", vec![]));
        builder.push(Cell::new("g", "a", 1, "other", vec![]));
        builder.push(Cell::new("f", "a", 1, "third", vec![]));
        let row = builder.build();

        assert_eq!(row.key(), b"row");
        assert_eq!(row.cell_count(), 3);
        let values: Vec<_> = row.cells("f").iter().map(Cell::value).collect();
        assert_eq!(values, [&b"second"[..], &b"third"[..]]);
        assert_eq!(row.cells("g").len(), 1);
        assert!(row.cells("missing").is_empty());
    }

    #[test]
    fn iter_cells_visits_every_family() {
        let mut builder = RowBuilder::new(b"k".to_vec());
        builder.push(Cell::new("b", "q", 0, "1", vec![]));
        builder.push(Cell::new("a", "q", 0, "2", vec!["label".to_owned()]));
        let row = builder.build();

        let families: Vec<_> = row.iter_cells().map(Cell::family).collect();
        assert_eq!(families, ["a", "b"]);
        assert_eq!(row.cells("a")[0].labels(), ["label"]);
    }
}
