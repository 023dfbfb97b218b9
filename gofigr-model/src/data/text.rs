use super::{decode_text, encode_text, DataObject, DataType, MetaDefault, MetadataField, RawData};
use crate::error::ModelResult;

const FORMAT: MetadataField = MetadataField::new("format", MetaDefault::Null);
const ENCODING: MetadataField = MetadataField::new("encoding", MetaDefault::Str("utf-8"));

/// Free text, stored as encoded bytes.
#[derive(Debug, Clone)]
pub struct TextData {
    raw: RawData,
}

impl TextData {
    pub fn new(contents: &str) -> Self {
        let mut raw = RawData::new(DataType::Text);
        raw.data = Some(contents.as_bytes().to_vec());
        Self { raw }
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

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.raw.set_meta(FORMAT.key, format.into());
        self
    }

    /// Free-form hint about the text (e.g. `json`); null by default.
    pub fn format(&self) -> Option<String> {
        self.meta_str(FORMAT.key)
    }

    pub fn encoding(&self) -> String {
        self.meta_str(ENCODING.key)
            .unwrap_or_else(|| "utf-8".to_string())
    }

    /// Decoded text, or `None` without a payload.
    pub fn contents(&self) -> ModelResult<Option<String>> {
        self.payload()
            .map(|bytes| decode_text(bytes, &self.encoding()))
            .transpose()
    }

    pub fn set_contents(&mut self, contents: Option<&str>) -> ModelResult<()> {
        let encoded = contents
            .map(|text| encode_text(text, &self.encoding()))
            .transpose()?;
        self.set_payload(encoded);
        Ok(())
    }
}

impl PartialEq for TextData {
    /// Equal when the wire forms match, with metadata defaults applied.
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl DataObject for TextData {
    const METADATA: &'static [MetadataField] = &[FORMAT, ENCODING];

    fn raw(&self) -> &RawData {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut RawData {
        &mut self.raw
    }
}
