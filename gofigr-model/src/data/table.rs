use super::{decode_text, encode_text, DataObject, DataType, MetaDefault, MetadataField, RawData};
use crate::error::{ModelError, ModelResult};

const FORMAT: MetadataField = MetadataField::new("format", MetaDefault::Str("pandas/csv"));
const ENCODING: MetadataField = MetadataField::new("encoding", MetaDefault::Str("utf-8"));

const CSV_FORMATS: &[&str] = &["pandas/csv", "csv"];

/// A table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", String::as_str))
                .collect(),
        )
    }
}

/// A data frame, stored as CSV bytes.
///
/// [`table`](Self::table) parses the payload on every call; edits to the
/// returned [`Table`] take effect only through [`set_table`](Self::set_table).
#[derive(Debug, Clone)]
pub struct TableData {
    raw: RawData,
}

impl TableData {
    pub fn new(table: &Table) -> ModelResult<Self> {
        let mut data = Self {
            raw: RawData::new(DataType::DataFrame),
        };
        data.set_table(Some(table))?;
        Ok(data)
    }

    pub(crate) fn from_raw(raw: RawData) -> Self {
        Self { raw }
    }

    pub fn into_raw(self) -> RawData {
        self.raw
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn format(&self) -> String {
        self.meta_str(FORMAT.key)
            .unwrap_or_else(|| "pandas/csv".to_string())
    }

    pub fn encoding(&self) -> String {
        self.meta_str(ENCODING.key)
            .unwrap_or_else(|| "utf-8".to_string())
    }

    fn check_format(&self) -> ModelResult<()> {
        let format = self.format();
        if CSV_FORMATS.contains(&format.as_str()) {
            Ok(())
        } else {
            Err(ModelError::UnsupportedFormat(format))
        }
    }

    /// Parses the payload, or `None` without one.
    pub fn table(&self) -> ModelResult<Option<Table>> {
        let Some(bytes) = self.payload() else {
            return Ok(None);
        };
        self.check_format()?;
        let text = decode_text(bytes, &self.encoding())?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Some(Table { columns, rows }))
    }

    /// Replaces the payload with `table` written as CSV.
    pub fn set_table(&mut self, table: Option<&Table>) -> ModelResult<()> {
        let Some(table) = table else {
            self.set_payload(None);
            return Ok(());
        };
        self.check_format()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ModelError::Table(e.into_error().into()))?;
        let text = decode_text(&bytes, "utf-8")?;
        let encoded = encode_text(&text, &self.encoding())?;
        self.set_payload(Some(encoded));
        Ok(())
    }
}

impl PartialEq for TableData {
    /// Equal when the wire forms match, with metadata defaults applied.
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl DataObject for TableData {
    const METADATA: &'static [MetadataField] = &[FORMAT, ENCODING];

    fn raw(&self) -> &RawData {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut RawData {
        &mut self.raw
    }
}
