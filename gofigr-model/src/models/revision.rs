use super::audit_fields;
use super::figure::Figure;
use crate::data::{CodeData, Data, DataType, ImageData, TableData, TextData};
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::field::{FieldDescriptor, LinkSpec, NestedKind, NestedSpec};
use crate::schema::EntitySchema;
use crate::sharing::Shareable;
use crate::value::FieldValue;

pub(super) fn schema() -> EntitySchema {
    EntitySchema::new(Revision::TYPE_NAME, "revision/")
        .shareable()
        .field(FieldDescriptor::plain("revision_index"))
        .field(FieldDescriptor::plain("metadata"))
        .field(FieldDescriptor::linked("figure", LinkSpec::one(Figure::TYPE_NAME)))
        .field(FieldDescriptor::nested(
            "data",
            NestedSpec::many(NestedKind::Data),
        ))
        .fields(audit_fields())
}

entity_wrapper!(
    /// One version of a figure, with its images, code, text and tables.
    Revision,
    "revision"
);

impl Shareable for Revision {
    fn entity(&self) -> &Entity {
        &self.0
    }
}

impl Revision {
    pub fn revision_index(&self) -> ModelResult<Option<i64>> {
        Ok(self.get("revision_index")?.as_i64())
    }

    pub fn figure(&self) -> ModelResult<Option<Figure>> {
        self.get_entity("figure")?
            .map(Figure::from_entity)
            .transpose()
    }

    /// Every data object, in stored order.
    pub fn data(&self) -> ModelResult<Vec<Data>> {
        match self.get("data")? {
            FieldValue::DataList(list) => Ok(list),
            value if value.is_null() => Ok(Vec::new()),
            value => Err(ModelError::TypeMismatch {
                field: "data".into(),
                expected: "a list of data objects",
                actual: value.kind_name(),
            }),
        }
    }

    pub fn set_data(&self, data: Vec<Data>) -> ModelResult<()> {
        self.set("data", data)
    }

    /// Data objects share one flat list; this swaps out the members of one
    /// type and keeps the rest in place.
    fn replace_data_type(&self, data_type: DataType, replacement: Vec<Data>) -> ModelResult<()> {
        let mut data: Vec<Data> = self
            .data()?
            .into_iter()
            .filter(|d| d.data_type() != Some(&data_type))
            .collect();
        data.extend(replacement);
        self.set_data(data)
    }

    pub fn image_data(&self) -> ModelResult<Vec<ImageData>> {
        Ok(self
            .data()?
            .into_iter()
            .filter_map(|d| match d {
                Data::Image(image) => Some(image),
                _ => None,
            })
            .collect())
    }

    pub fn set_image_data(&self, images: Vec<ImageData>) -> ModelResult<()> {
        let data = images.into_iter().map(Data::from).collect();
        self.replace_data_type(DataType::Image, data)
    }

    pub fn code_data(&self) -> ModelResult<Vec<CodeData>> {
        Ok(self
            .data()?
            .into_iter()
            .filter_map(|d| match d {
                Data::Code(code) => Some(code),
                _ => None,
            })
            .collect())
    }

    pub fn set_code_data(&self, code: Vec<CodeData>) -> ModelResult<()> {
        let data = code.into_iter().map(Data::from).collect();
        self.replace_data_type(DataType::Code, data)
    }

    pub fn text_data(&self) -> ModelResult<Vec<TextData>> {
        Ok(self
            .data()?
            .into_iter()
            .filter_map(|d| match d {
                Data::Text(text) => Some(text),
                _ => None,
            })
            .collect())
    }

    pub fn set_text_data(&self, text: Vec<TextData>) -> ModelResult<()> {
        let data = text.into_iter().map(Data::from).collect();
        self.replace_data_type(DataType::Text, data)
    }

    pub fn table_data(&self) -> ModelResult<Vec<TableData>> {
        Ok(self
            .data()?
            .into_iter()
            .filter_map(|d| match d {
                Data::Table(table) => Some(table),
                _ => None,
            })
            .collect())
    }

    pub fn set_table_data(&self, tables: Vec<TableData>) -> ModelResult<()> {
        let data = tables.into_iter().map(Data::from).collect();
        self.replace_data_type(DataType::DataFrame, data)
    }
}
