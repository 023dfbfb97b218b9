use super::{DataObject, DataType, MetaDefault, MetadataField, RawData};

const IS_WATERMARKED: MetadataField = MetadataField::new("is_watermarked", MetaDefault::Bool(false));
const FORMAT: MetadataField = MetadataField::new("format", MetaDefault::Null);

/// Encoded image bytes (PNG, SVG, ...). `format` names the encoding.
#[derive(Debug, Clone)]
pub struct ImageData {
    raw: RawData,
}

impl ImageData {
    pub fn new(data: Vec<u8>) -> Self {
        let mut raw = RawData::new(DataType::Image);
        raw.data = Some(data);
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
        self.set_format(format);
        self
    }

    pub fn is_watermarked(&self) -> bool {
        self.meta(IS_WATERMARKED.key).as_bool().unwrap_or(false)
    }

    pub fn set_watermarked(&mut self, value: bool) {
        self.raw.set_meta(IS_WATERMARKED.key, value);
    }

    pub fn format(&self) -> Option<String> {
        self.meta_str(FORMAT.key)
    }

    pub fn set_format(&mut self, format: impl Into<String>) {
        self.raw.set_meta(FORMAT.key, format.into());
    }

    /// MIME type implied by `format`, if it is a known image format.
    pub fn mime_type(&self) -> Option<&'static str> {
        let format = self.format()?;
        match format.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "svg" => Some("image/svg+xml"),
            "eps" => Some("application/postscript"),
            "pdf" => Some("application/pdf"),
            "html" => Some("text/html"),
            _ => None,
        }
    }
}

impl PartialEq for ImageData {
    /// Equal when the wire forms match, with metadata defaults applied.
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl DataObject for ImageData {
    const METADATA: &'static [MetadataField] = &[IS_WATERMARKED, FORMAT];

    fn raw(&self) -> &RawData {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut RawData {
        &mut self.raw
    }
}
