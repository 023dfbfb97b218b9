use super::{decode_text, encode_text, DataObject, DataType, MetaDefault, MetadataField, RawData};
use crate::error::ModelResult;

const LANGUAGE: MetadataField = MetadataField::new("language", MetaDefault::Null);
const FORMAT: MetadataField = MetadataField::new("format", MetaDefault::Str("text"));
const ENCODING: MetadataField = MetadataField::new("encoding", MetaDefault::Str("utf-8"));

/// Programming language of embedded code, as the service spells it.
pub struct CodeLanguage;

impl CodeLanguage {
    pub const PYTHON: &'static str = "Python";
    pub const R: &'static str = "R";
}

/// Source code captured alongside a figure.
#[derive(Debug, Clone)]
pub struct CodeData {
    raw: RawData,
}

impl CodeData {
    pub fn new(language: &str, contents: &str) -> Self {
        let mut raw = RawData::new(DataType::Code);
        raw.set_meta(LANGUAGE.key, language);
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

    pub fn language(&self) -> Option<String> {
        self.meta_str(LANGUAGE.key)
    }

    pub fn set_language(&mut self, language: &str) {
        self.raw.set_meta(LANGUAGE.key, language);
    }

    pub fn format(&self) -> Option<String> {
        self.meta_str(FORMAT.key)
    }

    pub fn encoding(&self) -> String {
        self.meta_str(ENCODING.key)
            .unwrap_or_else(|| "utf-8".to_string())
    }

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

impl PartialEq for CodeData {
    /// Equal when the wire forms match, with metadata defaults applied.
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl DataObject for CodeData {
    const METADATA: &'static [MetadataField] = &[LANGUAGE, FORMAT, ENCODING];

    fn raw(&self) -> &RawData {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut RawData {
        &mut self.raw
    }
}
