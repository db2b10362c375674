//! Rows and single-row mutations.

use std::collections::BTreeMap;

use smallvec::SmallVec;

/// Columns of one family in one row, sorted by column name.
pub type FamilyMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// A row as returned by the store.
///
/// A row that does not exist is returned as an empty row, so "absent" and
/// "present but without cells" are indistinguishable, as in the stores this
/// contract models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    key: Vec<u8>,
    families: BTreeMap<String, FamilyMap>,
}

impl Row {
    /// Creates an empty row.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            families: BTreeMap::new(),
        }
    }

    /// Returns the row key.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns true if the row holds no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.values().all(BTreeMap::is_empty)
    }

    /// Returns the cells of one family, if the row has any.
    #[must_use]
    pub fn family(&self, family: &str) -> Option<&FamilyMap> {
        self.families.get(family).filter(|cells| !cells.is_empty())
    }

    /// Returns a single cell value.
    #[must_use]
    pub fn get(&self, family: &str, column: &[u8]) -> Option<&[u8]> {
        self.families
            .get(family)
            .and_then(|cells| cells.get(column))
            .map(Vec::as_slice)
    }

    /// Returns true if the cell exists.
    #[must_use]
    pub fn contains(&self, family: &str, column: &[u8]) -> bool {
        self.get(family, column).is_some()
    }

    /// Iterates the cells of one family in column order.
    pub fn columns<'a>(&'a self, family: &str) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.families
            .get(family)
            .into_iter()
            .flat_map(|cells| cells.iter().map(|(c, v)| (c.as_slice(), v.as_slice())))
    }

    /// Iterates the names of families holding at least one cell.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families
            .iter()
            .filter(|(_, cells)| !cells.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Sets a cell.
    pub fn insert(&mut self, family: &str, column: Vec<u8>, value: Vec<u8>) {
        self.families
            .entry(family.to_string())
            .or_default()
            .insert(column, value);
    }

    /// Removes a cell, returning its value.
    pub fn remove_column(&mut self, family: &str, column: &[u8]) -> Option<Vec<u8>> {
        self.families.get_mut(family)?.remove(column)
    }

    /// Removes every cell of a family.
    pub fn remove_family(&mut self, family: &str) {
        self.families.remove(family);
    }
}

/// One cell of a [`Put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column family.
    pub family: String,
    /// Column name.
    pub column: Vec<u8>,
    /// Cell value.
    pub value: Vec<u8>,
}

/// A write of one or more cells to a single row, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Put {
    row: Vec<u8>,
    cells: SmallVec<[Cell; 4]>,
}

impl Put {
    /// Starts a put against `row`.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            cells: SmallVec::new(),
        }
    }

    /// Adds a cell, builder style.
    pub fn add(mut self, family: &str, column: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.push(family, column, value);
        self
    }

    /// Adds a cell.
    pub fn push(&mut self, family: &str, column: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.cells.push(Cell {
            family: family.to_string(),
            column: column.into(),
            value: value.into(),
        });
    }

    /// Returns the target row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns the cells to write.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns true if the put carries no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// What a [`Delete`] removes from its row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A single column.
    Column {
        /// Column family.
        family: String,
        /// Column name.
        column: Vec<u8>,
    },
    /// Every column of a family.
    Family(String),
}

/// A removal of cells from a single row, applied atomically.
///
/// A delete with no targets removes the whole row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    row: Vec<u8>,
    targets: SmallVec<[DeleteTarget; 4]>,
}

impl Delete {
    /// Starts a delete against `row`.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            targets: SmallVec::new(),
        }
    }

    /// Targets one column, builder style.
    pub fn column(mut self, family: &str, column: impl Into<Vec<u8>>) -> Self {
        self.push_column(family, column);
        self
    }

    /// Targets one column.
    pub fn push_column(&mut self, family: &str, column: impl Into<Vec<u8>>) {
        self.targets.push(DeleteTarget::Column {
            family: family.to_string(),
            column: column.into(),
        });
    }

    /// Targets a whole family, builder style.
    pub fn family(mut self, family: &str) -> Self {
        self.targets.push(DeleteTarget::Family(family.to_string()));
        self
    }

    /// Returns the target row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns the targets; empty means the whole row.
    #[must_use]
    pub fn targets(&self) -> &[DeleteTarget] {
        &self.targets
    }

    /// Returns true if the delete removes the whole row.
    #[must_use]
    pub fn is_whole_row(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let mut row = Row::new(b"r1".to_vec());
        assert!(row.is_empty());

        row.insert("props", b"name".to_vec(), b"alice".to_vec());
        row.insert("props", b"age".to_vec(), vec![30]);
        row.insert("edges", b"e1".to_vec(), b"v2".to_vec());

        assert!(!row.is_empty());
        assert_eq!(row.get("props", b"name"), Some(&b"alice"[..]));
        assert!(row.contains("edges", b"e1"));
        assert!(!row.contains("edges", b"e2"));

        let columns: Vec<_> = row.columns("props").map(|(c, _)| c.to_vec()).collect();
        assert_eq!(columns, vec![b"age".to_vec(), b"name".to_vec()]);
        assert_eq!(row.columns("missing").count(), 0);
    }

    #[test]
    fn test_row_removal_empties_families() {
        let mut row = Row::new(b"r1".to_vec());
        row.insert("edges", b"e1".to_vec(), Vec::new());

        assert_eq!(row.remove_column("edges", b"e1"), Some(Vec::new()));
        assert!(row.family("edges").is_none());
        assert_eq!(row.families().count(), 0);
        assert!(row.is_empty());
    }

    #[test]
    fn test_marker_cell_keeps_row_alive() {
        let mut row = Row::new(b"v".to_vec());
        row.insert("props", Vec::new(), Vec::new());
        assert!(!row.is_empty());
    }

    #[test]
    fn test_mutation_builders() {
        let put = Put::new(b"r".to_vec()).add("f", b"a".to_vec(), b"1".to_vec()).add("f", b"b".to_vec(), b"2".to_vec());
        assert_eq!(put.row(), b"r");
        assert_eq!(put.cells().len(), 2);

        let whole = Delete::new(b"r".to_vec());
        assert!(whole.is_whole_row());

        let partial = Delete::new(b"r".to_vec()).column("f", b"a".to_vec()).family("g");
        assert!(!partial.is_whole_row());
        assert_eq!(partial.targets()[1], DeleteTarget::Family("g".to_string()));
    }
}
