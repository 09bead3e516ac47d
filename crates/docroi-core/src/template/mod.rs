//! Field templates and the registry that maps document keys to them.

mod builtin;
mod registry;

pub use registry::{TemplateRegistry, TemplateRegistryBuilder};

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TemplateError;
use crate::models::document::NormalizedBox;

/// Named regions of interest for one document layout.
///
/// Field names are unique; iteration order is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Template {
    fields: BTreeMap<String, NormalizedBox>,
}

impl Template {
    /// Create an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, failing if the name is already taken.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        region: NormalizedBox,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(TemplateError::DuplicateField(name));
        }
        self.fields.insert(name, region);
        Ok(self)
    }

    /// Build from `(name, [x1, y1, x2, y2])` pairs.
    pub fn from_coords<'a>(
        fields: impl IntoIterator<Item = (&'a str, [f64; 4])>,
    ) -> Result<Self, TemplateError> {
        fields
            .into_iter()
            .try_fold(Self::new(), |template, (name, coords)| {
                template.with_field(name, NormalizedBox::try_from(coords)?)
            })
    }

    /// Region for a field.
    pub fn region(&self, name: &str) -> Option<&NormalizedBox> {
        self.fields.get(name)
    }

    /// Iterate `(field name, region)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedBox)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Built through `with_field` so a repeated key in a file is an error
// rather than a silent overwrite.
impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TemplateVisitor;

        impl<'de> Visitor<'de> for TemplateVisitor {
            type Value = Template;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to [x1, y1, x2, y2] boxes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Template, A::Error> {
                let mut template = Template::new();
                while let Some((name, region)) = map.next_entry::<String, NormalizedBox>()? {
                    template = template.with_field(name, region).map_err(de::Error::custom)?;
                }
                Ok(template)
            }
        }

        deserializer.deserialize_map(TemplateVisitor)
    }
}
