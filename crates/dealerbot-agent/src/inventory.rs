//! Vehicle inventory — CSV table, load-once cache, and substring search.
//!
//! The table is read from disk on first use and kept in memory until
//! [`InventoryStore::invalidate`] is called. A missing file is not an
//! error: an empty table with the standard columns is used instead and
//! a warning is surfaced.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns every inventory file must provide.
pub const REQUIRED_COLUMNS: [&str; 6] = ["id", "make", "model", "year", "price", "color"];

/// Returned for any query while the table has no rows.
pub const EMPTY_INVENTORY_MESSAGE: &str = "The vehicle inventory is currently empty.";

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("inventory file {path} is missing the '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

// ─────────────────────────────────────────────
// InventoryTable
// ─────────────────────────────────────────────

/// An in-memory inventory table. Every cell is kept as text.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Set when the table stands in for a file that does not exist.
    missing_source: Option<PathBuf>,
}

impl InventoryTable {
    /// An empty table with the standard columns.
    pub fn empty() -> Self {
        Self {
            columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            missing_source: None,
        }
    }

    /// Build a table from already-parsed columns and rows.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            columns,
            rows,
            missing_source: None,
        }
    }

    /// Parse a table from CSV text. `origin` is only used in error messages.
    pub fn from_csv_reader<R: std::io::Read>(reader: R, origin: &Path) -> Result<Self, InventoryError> {
        let csv_err = |source| InventoryError::Csv {
            path: origin.to_path_buf(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(InventoryError::MissingColumn {
                    path: origin.to_path_buf(),
                    column: required,
                });
            }
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self::from_rows(columns, rows))
    }

    /// Load from a CSV file; a missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.exists() {
            warn!(path = %path.display(), "inventory file not found, using empty inventory");
            return Ok(Self {
                missing_source: Some(path.to_path_buf()),
                ..Self::empty()
            });
        }

        let file = std::fs::File::open(path).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_csv_reader(file, path)?;
        info!(path = %path.display(), rows = table.len(), "loaded inventory");
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// User-facing warning when the table replaced a missing file.
    pub fn warning(&self) -> Option<String> {
        self.missing_source.as_ref().map(|p| {
            format!(
                "Inventory file '{}' not found. Using empty inventory.",
                p.display()
            )
        })
    }

    /// Rows where any cell contains `query`, case-insensitively.
    pub fn matching_rows(&self, query: &str) -> Vec<&[String]> {
        let needle = query.to_lowercase();
        self.rows
            .iter()
            .filter(|row| row.iter().any(|cell| cell.to_lowercase().contains(&needle)))
            .map(|row| row.as_slice())
            .collect()
    }

    /// Render the header plus `rows` as a left-aligned text table.
    pub fn render(&self, rows: &[&[String]]) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(format_line(self.columns.iter(), &widths));
        for row in rows {
            lines.push(format_line(row.iter(), &widths));
        }
        lines.join("\n")
    }

    /// Search the table and describe the result for the model.
    pub fn search(&self, query: &str) -> String {
        if self.is_empty() {
            return EMPTY_INVENTORY_MESSAGE.to_string();
        }

        let matches = self.matching_rows(query);
        if matches.is_empty() {
            return format!(
                "No vehicles found matching your query: '{query}'. Try a broader search."
            );
        }
        format!(
            "Found the following vehicles matching '{query}':\n{}",
            self.render(&matches)
        )
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}", w = *w))
        .collect();
    padded.join("  ").trim_end().to_string()
}

// ─────────────────────────────────────────────
// InventoryStore — load once, cache, invalidate
// ─────────────────────────────────────────────

/// Memoized access to the inventory file.
///
/// Safe to share across concurrent turns; reads after the first load
/// only take a read lock.
pub struct InventoryStore {
    path: PathBuf,
    cache: RwLock<Option<Arc<InventoryTable>>>,
}

impl InventoryStore {
    /// Create a store for `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Create a store pre-populated with a table (never touches disk until invalidated).
    pub fn with_table(path: impl Into<PathBuf>, table: InventoryTable) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(Some(Arc::new(table))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached table, loading it on first use.
    ///
    /// Load errors are not cached; the next call tries again.
    pub fn load(&self) -> Result<Arc<InventoryTable>, InventoryError> {
        if let Some(table) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(table.clone());
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = cache.as_ref() {
            return Ok(table.clone());
        }
        let table = Arc::new(InventoryTable::load(&self.path)?);
        *cache = Some(table.clone());
        Ok(table)
    }

    /// Drop the cached table; the next access re-reads the file.
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!(path = %self.path.display(), "inventory cache invalidated");
    }

    /// Search the inventory. Never fails: load errors become an explanatory string.
    pub fn search(&self, query: &str) -> String {
        match self.load() {
            Ok(table) => table.search(query),
            Err(e) => {
                warn!(error = %e, "inventory search failed");
                format!("An error occurred while searching the inventory: {e}")
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CAMRY_CSV: &str = "id,make,model,year,price,color\n1,Toyota,Camry,2022,25000,black\n";

    fn write_csv(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("vehicles.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn sample_table() -> InventoryTable {
        InventoryTable::from_csv_reader(
            "id,make,model,year,price,color\n\
             1,Toyota,Camry,2022,25000,black\n\
             2,Honda,Accord,2021,23500,white\n\
             3,Tesla,Model 3,2023,41000,red\n"
                .as_bytes(),
            Path::new("inline.csv"),
        )
        .unwrap()
    }

    #[test]
    fn test_single_row_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryStore::new(write_csv(&dir, CAMRY_CSV));

        let miss = store.search("black sedan");
        assert_eq!(
            miss,
            "No vehicles found matching your query: 'black sedan'. Try a broader search."
        );

        let hit = store.search("Toyota");
        assert!(hit.starts_with("Found the following vehicles matching 'Toyota':"));
        assert!(hit.contains("Camry"));
        assert!(hit.contains("25000"));
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let table = sample_table();
        assert_eq!(table.matching_rows("accord").len(), 1);
        assert_eq!(table.matching_rows("WHITE").len(), 1);
        assert_eq!(table.matching_rows("202").len(), 3);
        assert_eq!(table.matching_rows("41000")[0][1], "Tesla");
    }

    #[test]
    fn test_search_is_idempotent() {
        let store = InventoryStore::with_table("inline.csv", sample_table());
        assert_eq!(store.search("Toyota"), store.search("Toyota"));
    }

    #[test]
    fn test_empty_inventory_message() {
        let store = InventoryStore::with_table("x.csv", InventoryTable::empty());
        assert_eq!(store.search("Toyota"), EMPTY_INVENTORY_MESSAGE);
        assert_eq!(store.search(""), EMPTY_INVENTORY_MESSAGE);
    }

    #[test]
    fn test_missing_file_is_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let store = InventoryStore::new(&path);

        let table = store.load().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), REQUIRED_COLUMNS);
        let warning = table.warning().unwrap();
        assert!(warning.contains("absent.csv"));
        assert!(warning.contains("Using empty inventory"));
        assert_eq!(store.search("anything"), EMPTY_INVENTORY_MESSAGE);
    }

    #[test]
    fn test_loaded_file_has_no_warning() {
        let dir = tempfile::tempdir().unwrap();
        let table = InventoryTable::load(&write_csv(&dir, CAMRY_CSV)).unwrap();
        assert!(table.warning().is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_column_becomes_search_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryStore::new(write_csv(&dir, "id,make,model\n1,Ford,Focus\n"));

        assert!(matches!(
            store.load(),
            Err(InventoryError::MissingColumn { column: "year", .. })
        ));
        let msg = store.search("Ford");
        assert!(msg.starts_with("An error occurred while searching the inventory:"));
        assert!(msg.contains("'year'"));
    }

    #[test]
    fn test_ragged_rows_become_search_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryStore::new(write_csv(
            &dir,
            "id,make,model,year,price,color\n1,Ford,Focus\n",
        ));
        assert!(store
            .search("Ford")
            .starts_with("An error occurred while searching the inventory:"));
    }

    #[test]
    fn test_cache_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, CAMRY_CSV);
        let store = InventoryStore::new(&path);

        assert_eq!(store.load().unwrap().len(), 1);

        std::fs::write(
            &path,
            "id,make,model,year,price,color\n1,Toyota,Camry,2022,25000,black\n2,Ford,Focus,2020,15000,blue\n",
        )
        .unwrap();

        // Still served from cache
        assert_eq!(store.load().unwrap().len(), 1);
        assert!(store.search("Ford").starts_with("No vehicles found"));

        store.invalidate();
        assert_eq!(store.load().unwrap().len(), 2);
        assert!(store.search("Ford").contains("Focus"));
    }

    #[test]
    fn test_extra_columns_are_searchable() {
        let table = InventoryTable::from_csv_reader(
            "id,make,model,year,price,color,body\n1,Honda,Civic,2020,18000,silver,sedan\n"
                .as_bytes(),
            Path::new("inline.csv"),
        )
        .unwrap();
        assert_eq!(table.matching_rows("sedan").len(), 1);
    }

    #[test]
    fn test_render_aligns_columns() {
        let table = sample_table();
        let rows = table.matching_rows("Model 3");
        let rendered = table.render(&rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id  make   model"));
        assert!(lines[1].starts_with("3   Tesla  Model 3"));
    }
}
