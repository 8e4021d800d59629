//! Import sheets written to a scratch directory.
//!
//! Every scenario gets its own [`ImportFiles`], so uploads never see files
//! left behind by an earlier run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csv::WriterBuilder as CsvWriterBuilder;
use ew::pages::import_orders::{IMPORT_COLUMNS, MAX_FILE_SIZE_MB};
use rust_xlsxwriter::{Workbook, XlsxError};
use tempfile::TempDir;

const MIB: usize = 1024 * 1024;

/// Bytes in the advertised upload limit.
pub fn max_upload_bytes() -> usize {
	(MAX_FILE_SIZE_MB * MIB as f64) as usize
}

/// A CSV sheet: a header line plus rows addressed by column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
	columns: Vec<String>,
	rows: Vec<Vec<String>>,
}

impl Default for Sheet {
	fn default() -> Self {
		Self::new()
	}
}

impl Sheet {
	/// Empty sheet with the columns the import documents, in order.
	pub fn new() -> Self {
		Self {
			columns: IMPORT_COLUMNS.iter().map(|(name, _)| name.to_string()).collect(),
			rows: Vec::new(),
		}
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn rows(&self) -> &[Vec<String>] {
		&self.rows
	}

	/// Appends a column, blank for rows already present.
	pub fn with_column(mut self, name: &str) -> Self {
		if !self.columns.iter().any(|c| c == name) {
			self.columns.push(name.to_string());
			for row in &mut self.rows {
				row.push(String::new());
			}
		}
		self
	}

	/// Drops a column and its values.
	pub fn without_column(mut self, name: &str) -> Self {
		if let Some(index) = self.columns.iter().position(|c| c == name) {
			self.columns.remove(index);
			for row in &mut self.rows {
				row.remove(index);
			}
		}
		self
	}

	/// Renames a header without touching the values.
	pub fn rename_column(mut self, from: &str, to: &str) -> Self {
		if let Some(column) = self.columns.iter_mut().find(|c| *c == from) {
			*column = to.to_string();
		}
		self
	}

	/// Appends a row. Unknown names are ignored and unset columns stay blank.
	pub fn row(mut self, values: &[(&str, &str)]) -> Self {
		let row = self
			.columns
			.iter()
			.map(|column| {
				values
					.iter()
					.find(|(name, _)| *name == column.as_str())
					.map(|(_, value)| value.to_string())
					.unwrap_or_default()
			})
			.collect();
		self.rows.push(row);
		self
	}

	/// Appends a row with every required column filled, then `overrides`.
	pub fn order(self, order_name: &str, overrides: &[(&str, &str)]) -> Self {
		let mut values = vec![
			("order_name", order_name),
			("amount", "100.00"),
			("platform", "CashApp"),
			("username", "ew-suite"),
			("telegram_handle", "@ew_suite"),
			("receiving_agent_id", "1"),
			("discount_tier_id", "1"),
		];
		for (name, value) in overrides {
			match values.iter_mut().find(|(n, _)| n == name) {
				Some(slot) => slot.1 = *value,
				None => values.push((*name, *value)),
			}
		}
		self.row(&values)
	}

	/// Header plus rows, quoted where a field needs it.
	pub fn to_csv(&self) -> io::Result<String> {
		let mut bytes = Vec::new();
		let mut writer = CsvWriterBuilder::new().has_headers(false).from_writer(&mut bytes);
		writer.write_record(&self.columns)?;
		for row in &self.rows {
			writer.write_record(row)?;
		}
		writer.into_inner().map_err(|err| err.into_error())?;
		String::from_utf8(bytes).map_err(io::Error::other)
	}

	/// Single-worksheet workbook with the header in the first row.
	///
	/// Numeric values are written as numbers, the way a spreadsheet would
	/// store them.
	pub fn to_xlsx(&self) -> Result<Vec<u8>, XlsxError> {
		let mut workbook = Workbook::new();
		let worksheet = workbook.add_worksheet();
		for (col, name) in (0..).zip(&self.columns) {
			worksheet.write_string(0, col, name)?;
		}
		for (row, values) in (1..).zip(&self.rows) {
			for (col, value) in (0..).zip(values) {
				if value.is_empty() {
					continue;
				}
				match value.parse::<f64>() {
					Ok(number) if number.is_finite() => worksheet.write_number(row, col, number)?,
					_ => worksheet.write_string(row, col, value)?,
				};
			}
		}
		workbook.save_to_buffer()
	}
}

/// Scratch directory holding the files a scenario uploads.
pub struct ImportFiles {
	dir: TempDir,
}

impl ImportFiles {
	pub fn new() -> io::Result<Self> {
		Ok(Self {
			dir: tempfile::Builder::new().prefix("ew-import-").tempdir()?,
		})
	}

	pub fn dir(&self) -> &Path {
		self.dir.path()
	}

	pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> io::Result<PathBuf> {
		let path = self.dir.path().join(name);
		fs::write(&path, contents)?;
		Ok(path)
	}

	pub fn sheet(&self, name: &str, sheet: &Sheet) -> io::Result<PathBuf> {
		self.write(name, sheet.to_csv()?)
	}

	/// One complete order.
	pub fn valid_csv(&self) -> io::Result<PathBuf> {
		self.sheet("orders.csv", &Sheet::new().order("EW Suite Order", &[]))
	}

	/// One complete order as an `.xlsx` workbook.
	pub fn excel(&self) -> io::Result<PathBuf> {
		let sheet = Sheet::new().order("EW Suite Workbook", &[]);
		self.write("orders.xlsx", sheet.to_xlsx().map_err(io::Error::other)?)
	}

	/// Complete order with the optional columns filled in.
	pub fn optional_fields_csv(&self) -> io::Result<PathBuf> {
		let sheet = Sheet::new().order("EW Suite Optional", &[("minimum_send_amount", "25.00")]);
		self.sheet("orders-optional.csv", &sheet)
	}

	/// One order spread over extra `platform_n`/`username_n` columns.
	pub fn multi_platform_csv(&self) -> io::Result<PathBuf> {
		let sheet = Sheet::new()
			.with_column("platform_2")
			.with_column("username_2")
			.with_column("platform_3")
			.with_column("username_3")
			.order(
				"EW Suite Multi Platform",
				&[
					("platform_2", "Venmo"),
					("username_2", "ew-suite-venmo"),
					("platform_3", "Zelle"),
					("username_3", "suite@example.com"),
				],
			);
		self.sheet("orders-multi-platform.csv", &sheet)
	}

	/// Several rows sharing one `order_name`.
	pub fn grouped_csv(&self) -> io::Result<PathBuf> {
		let sheet = Sheet::new()
			.order("EW Suite Grouped", &[("platform", "CashApp"), ("username", "ew-suite-cash")])
			.order("EW Suite Grouped", &[("platform", "Venmo"), ("username", "ew-suite-venmo")])
			.order("EW Suite Grouped", &[("platform", "Zelle"), ("username", "suite@example.com")]);
		self.sheet("orders-grouped.csv", &sheet)
	}

	/// One order padded with blank lines to at least `bytes`.
	///
	/// Blank rows keep a large upload from creating orders in bulk.
	pub fn padded_csv(&self, name: &str, bytes: usize) -> io::Result<PathBuf> {
		let mut out = Sheet::new().order("EW Suite Padded", &[]).to_csv()?;
		if out.len() < bytes {
			out.push_str(&"\n".repeat(bytes - out.len()));
		}
		self.write(name, out)
	}

	/// Comfortably under the upload limit.
	pub fn within_limit(&self) -> io::Result<PathBuf> {
		self.padded_csv("orders-1mb.csv", MIB)
	}

	/// Just over the upload limit.
	pub fn oversized(&self) -> io::Result<PathBuf> {
		self.padded_csv("orders-oversized.csv", max_upload_bytes() + 64 * 1024)
	}

	pub fn unsupported(&self) -> io::Result<PathBuf> {
		self.write("orders.txt", "this is not an order sheet\n")
	}
}
