//! Binary data objects embedded in revisions.
//!
//! Data objects have no lifecycle of their own: they are parsed from and
//! serialized into their parent revision's `data` list. The wire form is
//!
//! ```json
//! {"api_id": null, "name": "figure.png", "hash": null, "type": "image",
//!  "metadata": {"is_watermarked": false, "format": "png"},
//!  "data": "AQID", "is_clean_room": false}
//! ```
//!
//! `type` selects the specialization. Each specialization declares a few
//! metadata keys with defaults; reading an unset key returns the default and
//! leaves the metadata map untouched, while serializing fills the defaults in.

mod code;
mod image;
mod table;
mod text;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use gofigr_types::ApiId;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{ModelError, ModelResult};

pub use code::{CodeData, CodeLanguage};
pub use image::ImageData;
pub use table::{Table, TableData};
pub use text::TextData;

/// Wire tag of a data object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Image,
    Code,
    Text,
    DataFrame,
    /// A tag this client does not know about.
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Image => "image",
            DataType::Code => "code",
            DataType::Text => "text",
            DataType::DataFrame => "dataframe",
            DataType::Other(tag) => tag,
        }
    }
}

impl From<&str> for DataType {
    fn from(tag: &str) -> Self {
        match tag {
            "image" => DataType::Image,
            "code" => DataType::Code,
            "text" => DataType::Text,
            "dataframe" => DataType::DataFrame,
            other => DataType::Other(other.to_string()),
        }
    }
}

/// Default of a declared metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaDefault {
    Null,
    Bool(bool),
    Str(&'static str),
}

impl MetaDefault {
    pub fn to_value(self) -> Value {
        match self {
            MetaDefault::Null => Value::Null,
            MetaDefault::Bool(b) => Value::Bool(b),
            MetaDefault::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// A metadata key with a declared default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataField {
    pub key: &'static str,
    pub default: MetaDefault,
}

impl MetadataField {
    pub const fn new(key: &'static str, default: MetaDefault) -> Self {
        Self { key, default }
    }
}

/// Fields shared by every data object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawData {
    pub api_id: Option<ApiId>,
    pub name: Option<String>,
    pub hash: Option<String>,
    pub data_type: Option<DataType>,
    pub metadata: Map<String, Value>,
    /// Raw payload. Canonical: every typed view is computed from it.
    pub data: Option<Vec<u8>>,
    pub is_clean_room: bool,
}

#[derive(Deserialize)]
struct WireData {
    api_id: Option<ApiId>,
    name: Option<String>,
    hash: Option<String>,
    #[serde(rename = "type")]
    data_type: Option<String>,
    metadata: Option<Map<String, Value>>,
    data: Option<String>,
    is_clean_room: Option<bool>,
}

impl RawData {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type: Some(data_type),
            ..Self::default()
        }
    }

    /// Reads a metadata key, falling back to `default` when unset.
    pub fn meta(&self, key: &str, default: MetaDefault) -> Value {
        self.metadata
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_value())
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Removes a metadata key so it reads as its default again.
    pub fn clear_meta(&mut self, key: &str) {
        self.metadata.remove(key);
    }

    pub fn from_json(value: &Value) -> ModelResult<Self> {
        let wire: WireData = serde_json::from_value(value.clone())?;
        let data = match wire.data {
            Some(encoded) => Some(BASE64.decode(encoded.as_bytes()).map_err(|e| {
                ModelError::Encoding {
                    encoding: "base64".into(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Self {
            api_id: wire.api_id,
            name: wire.name,
            hash: wire.hash,
            data_type: wire.data_type.as_deref().map(DataType::from),
            metadata: wire.metadata.unwrap_or_default(),
            data,
            is_clean_room: wire.is_clean_room.unwrap_or(false),
        })
    }

    /// Serializes with `declared` metadata defaults filled in for unset keys.
    pub fn to_json(&self, declared: &[MetadataField]) -> Value {
        let mut metadata = self.metadata.clone();
        for field in declared {
            metadata
                .entry(field.key)
                .or_insert_with(|| field.default.to_value());
        }
        json!({
            "api_id": self.api_id.map(|id| id.to_string()),
            "name": self.name,
            "hash": self.hash,
            "type": self.data_type.as_ref().map(DataType::as_str),
            "metadata": metadata,
            "data": self.data.as_ref().map(|bytes| BASE64.encode(bytes)),
            "is_clean_room": self.is_clean_room,
        })
    }
}

/// Accessors common to every typed data object.
pub trait DataObject {
    /// Metadata keys this kind declares, with their defaults.
    const METADATA: &'static [MetadataField];

    fn raw(&self) -> &RawData;

    fn raw_mut(&mut self) -> &mut RawData;

    fn name(&self) -> Option<&str> {
        self.raw().name.as_deref()
    }

    fn set_name(&mut self, name: impl Into<String>) {
        self.raw_mut().name = Some(name.into());
    }

    fn is_clean_room(&self) -> bool {
        self.raw().is_clean_room
    }

    fn set_clean_room(&mut self, value: bool) {
        self.raw_mut().is_clean_room = value;
    }

    fn payload(&self) -> Option<&[u8]> {
        self.raw().data.as_deref()
    }

    fn set_payload(&mut self, data: Option<Vec<u8>>) {
        self.raw_mut().data = data;
    }

    /// A declared metadata value, or its default.
    fn meta(&self, key: &str) -> Value {
        let default = Self::METADATA
            .iter()
            .find(|f| f.key == key)
            .map_or(MetaDefault::Null, |f| f.default);
        self.raw().meta(key, default)
    }

    fn meta_str(&self, key: &str) -> Option<String> {
        self.meta(key).as_str().map(str::to_string)
    }

    fn to_json(&self) -> Value {
        self.raw().to_json(Self::METADATA)
    }
}

/// Decodes a payload in the named text encoding.
pub(crate) fn decode_text(bytes: &[u8], encoding: &str) -> ModelResult<String> {
    check_encoding(encoding)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| ModelError::Encoding {
        encoding: encoding.to_string(),
        reason: e.to_string(),
    })
}

/// Encodes text in the named encoding.
pub(crate) fn encode_text(text: &str, encoding: &str) -> ModelResult<Vec<u8>> {
    check_encoding(encoding)?;
    Ok(text.as_bytes().to_vec())
}

fn check_encoding(encoding: &str) -> ModelResult<()> {
    match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "utf_8" => Ok(()),
        _ => Err(ModelError::Encoding {
            encoding: encoding.to_string(),
            reason: "only UTF-8 is supported".into(),
        }),
    }
}

/// A data object of any kind, selected by its wire `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Image(ImageData),
    Code(CodeData),
    Text(TextData),
    Table(TableData),
    /// Unknown or missing `type`; kept verbatim.
    Generic(RawData),
}

impl Data {
    /// Parses a data object, dispatching on `type`. Unknown types parse to
    /// [`Data::Generic`] instead of failing.
    pub fn from_json(value: &Value) -> ModelResult<Self> {
        let raw = RawData::from_json(value)?;
        Ok(match raw.data_type {
            Some(DataType::Image) => Data::Image(ImageData::from_raw(raw)),
            Some(DataType::Code) => Data::Code(CodeData::from_raw(raw)),
            Some(DataType::Text) => Data::Text(TextData::from_raw(raw)),
            Some(DataType::DataFrame) => Data::Table(TableData::from_raw(raw)),
            Some(DataType::Other(_)) | None => Data::Generic(raw),
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Data::Image(d) => d.to_json(),
            Data::Code(d) => d.to_json(),
            Data::Text(d) => d.to_json(),
            Data::Table(d) => d.to_json(),
            Data::Generic(raw) => raw.to_json(&[]),
        }
    }

    pub fn raw(&self) -> &RawData {
        match self {
            Data::Image(d) => d.raw(),
            Data::Code(d) => d.raw(),
            Data::Text(d) => d.raw(),
            Data::Table(d) => d.raw(),
            Data::Generic(raw) => raw,
        }
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.raw().data_type.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.raw().name.as_deref()
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            Data::Image(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&CodeData> {
        match self {
            Data::Code(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match self {
            Data::Text(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableData> {
        match self {
            Data::Table(d) => Some(d),
            _ => None,
        }
    }
}

impl From<ImageData> for Data {
    fn from(value: ImageData) -> Self {
        Data::Image(value)
    }
}

impl From<CodeData> for Data {
    fn from(value: CodeData) -> Self {
        Data::Code(value)
    }
}

impl From<TextData> for Data {
    fn from(value: TextData) -> Self {
        Data::Text(value)
    }
}

impl From<TableData> for Data {
    fn from(value: TableData) -> Self {
        Data::Table(value)
    }
}
