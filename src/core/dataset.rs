use crate::domain::model::{CsvRow, RetailDataset};
use crate::utils::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const INVENTORY_ROW_LIMIT: usize = 500;
pub const SALES_ROW_LIMIT: usize = 1000;

/// Rows of each dataset shown to the researcher.
pub const INVENTORY_SAMPLE_SIZE: usize = 30;
pub const SALES_SAMPLE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub inventory: PathBuf,
    pub sales: PathBuf,
}

impl DatasetPaths {
    pub fn new(inventory: impl Into<PathBuf>, sales: impl Into<PathBuf>) -> Self {
        Self {
            inventory: inventory.into(),
            sales: sales.into(),
        }
    }

    pub fn load(&self) -> Result<RetailDataset> {
        load_dataset(&self.inventory, &self.sales)
    }
}

/// 讀取 CSV（含標題列），最多 `limit` 筆
pub fn read_rows(path: &Path, limit: usize) -> Result<Vec<CsvRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for record in reader.deserialize::<CsvRow>().take(limit) {
        rows.push(record?);
    }

    tracing::debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_dataset(inventory_path: &Path, sales_path: &Path) -> Result<RetailDataset> {
    let inventory = read_rows(inventory_path, INVENTORY_ROW_LIMIT)?;
    let sales = read_rows(sales_path, SALES_ROW_LIMIT)?;

    tracing::info!(
        "📂 Loaded {} inventory rows and {} sales rows",
        inventory.len(),
        sales.len()
    );

    Ok(RetailDataset::new(inventory, sales))
}

/// Sample of both datasets plus totals, embedded in the research prompt.
#[derive(Debug, Serialize)]
pub struct DatasetSummary<'a> {
    pub inventory_sample: &'a [CsvRow],
    pub sales_sample: &'a [CsvRow],
    pub total_inventory_records: usize,
    pub total_sales_records: usize,
}

impl<'a> DatasetSummary<'a> {
    pub fn from_dataset(dataset: &'a RetailDataset) -> Self {
        let inventory_end = dataset.inventory.len().min(INVENTORY_SAMPLE_SIZE);
        let sales_end = dataset.sales.len().min(SALES_SAMPLE_SIZE);

        Self {
            inventory_sample: &dataset.inventory[..inventory_end],
            sales_sample: &dataset.sales[..sales_end],
            total_inventory_records: dataset.inventory.len(),
            total_sales_records: dataset.sales.len(),
        }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(header: &str, rows: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", header).unwrap();
        for i in 0..rows {
            writeln!(file, "Product {},Supplier {},{}", i, i % 7, i * 3).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_row_limits_are_applied() {
        let inventory = csv_file("Product,OrderList,Branch Stock Level", 620);
        let sales = csv_file("Product,Branch Name,Qty Sold", 1200);

        let dataset = load_dataset(inventory.path(), sales.path()).unwrap();

        assert_eq!(dataset.inventory_count, INVENTORY_ROW_LIMIT);
        assert_eq!(dataset.sales_count, SALES_ROW_LIMIT);
        assert_eq!(dataset.len(), INVENTORY_ROW_LIMIT + SALES_ROW_LIMIT);
        assert_eq!(dataset.inventory[0]["Product"], "Product 0");
        assert_eq!(dataset.inventory[0]["OrderList"], "Supplier 0");
        assert_eq!(dataset.sales[2]["Qty Sold"], "6");
    }

    #[test]
    fn test_columns_keep_header_order() {
        let inventory = csv_file("Product,OrderList,Branch Stock Level", 1);
        let sales = csv_file("Qty Sold,Product,Branch Name", 1);
        let dataset = load_dataset(inventory.path(), sales.path()).unwrap();

        let columns: Vec<&str> = dataset.sales[0].keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["Qty Sold", "Product", "Branch Name"]);

        let json = serde_json::to_string(&dataset.inventory[0]).unwrap();
        assert_eq!(
            json,
            r#"{"Product":"Product 0","OrderList":"Supplier 0","Branch Stock Level":"0"}"#
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let sales = csv_file("Product,Branch Name,Qty Sold", 3);
        let paths = DatasetPaths::new("/definitely/not/here.csv", sales.path());
        assert!(paths.load().is_err());
    }

    #[test]
    fn test_summary_samples_and_totals() {
        let inventory = csv_file("Product,OrderList,Branch Stock Level", 45);
        let sales = csv_file("Product,Branch Name,Qty Sold", 12);
        let dataset = load_dataset(inventory.path(), sales.path()).unwrap();

        let summary = DatasetSummary::from_dataset(&dataset);
        assert_eq!(summary.inventory_sample.len(), INVENTORY_SAMPLE_SIZE);
        assert_eq!(summary.sales_sample.len(), 12);
        assert_eq!(summary.total_inventory_records, 45);

        let json = summary.to_pretty_json().unwrap();
        assert!(json.contains("\"total_sales_records\": 12"));
    }
}
