use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One raw result table in `split` orientation.
///
/// `index` holds the row index of the element table each data row belongs
/// to, so lookups go through the index and never through data position.
/// `null` cells are not available and read back as `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub index: Vec<usize>,
    pub data: Vec<Vec<Option<f64>>>,
}

impl RawTable {
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            index: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Append the result row of element row `index`; `NaN` is stored as null.
    pub fn push(&mut self, index: usize, values: &[f64]) {
        self.index.push(index);
        self.data.push(
            values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) })
                .collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn has_row(&self, row: usize) -> bool {
        self.index.contains(&row)
    }

    /// Read access with a column lookup table built once.
    pub fn view(&self) -> RawTableView<'_> {
        RawTableView::new(self)
    }
}

/// Column-indexed view over a [`RawTable`].
pub struct RawTableView<'a> {
    table: &'a RawTable,
    col_map: HashMap<&'a str, usize>,
    row_map: HashMap<usize, usize>,
}

impl<'a> RawTableView<'a> {
    fn new(table: &'a RawTable) -> Self {
        let col_map = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let row_map = table
            .index
            .iter()
            .enumerate()
            .map(|(position, row)| (*row, position))
            .collect();
        Self {
            table,
            col_map,
            row_map,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.col_map.contains_key(column)
    }

    pub fn has_row(&self, row: usize) -> bool {
        self.row_map.contains_key(&row)
    }

    /// Cell of element row `row`; `None` when the row or column is absent,
    /// `Some(NaN)` when the cell is null.
    pub fn get(&self, row: usize, column: &str) -> Option<f64> {
        let position = *self.row_map.get(&row)?;
        let col = *self.col_map.get(column)?;
        let cell = self.table.data.get(position)?.get(col)?;
        Some(cell.unwrap_or(f64::NAN))
    }
}

/// All raw result tables of one alternate run, keyed by result table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    pub tables: BTreeMap<String, RawTable>,
}

impl RawResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: RawTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn table(&self, name: &str) -> Option<&RawTable> {
        self.tables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_go_through_the_index() {
        let mut table = RawTable::with_columns(&["vm_pu", "va_degree"]);
        table.push(3, &[1.02, -1.5]);
        table.push(0, &[1.0, f64::NAN]);

        let view = table.view();
        assert_eq!(view.get(3, "vm_pu"), Some(1.02));
        assert_eq!(view.get(0, "vm_pu"), Some(1.0));
        assert!(view.get(0, "va_degree").unwrap().is_nan());
        assert_eq!(view.get(1, "vm_pu"), None);
        assert_eq!(view.get(3, "p_mw"), None);
        assert!(view.has_row(3));
        assert!(!table.has_column("p_mw"));
    }

    #[test]
    fn null_cells_survive_json() {
        let mut table = RawTable::with_columns(&["p_mw"]);
        table.push(0, &[f64::NAN]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"columns":["p_mw"],"index":[0],"data":[[null]]}"#);
        let back: RawTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
