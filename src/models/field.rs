use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::double_option;
use crate::core::strong_types::{BlockId, FieldId};

/// Free-form rule set attached to a field (`min_length`, `max`, `pattern`, ...)
pub type ValidationRules = serde_json::Map<String, serde_json::Value>;

/// Field types an administrator can assign to a block field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Select,
    Checkbox,
    Radio,
    Textarea,
    Date,
    Upload,
    Boolean,
    Richtext,
    Relation,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Select,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::Textarea,
        FieldType::Date,
        FieldType::Upload,
        FieldType::Boolean,
        FieldType::Richtext,
        FieldType::Relation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Textarea => "textarea",
            FieldType::Date => "date",
            FieldType::Upload => "upload",
            FieldType::Boolean => "boolean",
            FieldType::Richtext => "richtext",
            FieldType::Relation => "relation",
        }
    }

    /// Types where `has_many` is meaningful
    pub fn supports_many(&self) -> bool {
        matches!(
            self,
            FieldType::Checkbox | FieldType::Relation | FieldType::Select | FieldType::Upload
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_lowercase();
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "'{}' is not a supported field type (expected one of: {})",
                    raw,
                    allowed.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// One typed slot inside a block. `name` is the key in the page document,
/// `label` is display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub block_id: BlockId,
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub order: i64,
    pub options: Vec<FieldOption>,
    pub validation: ValidationRules,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub has_many: bool,
    pub relation_model: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub description: Option<String>,
    pub layout: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

pub const DEFAULT_LAYOUT: i64 = 12;

/// Creation payload. `type` stays a raw string here so an unknown type is
/// reported as a validation error on the `type` attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct NewField {
    pub block_id: BlockId,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub validation: ValidationRules,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub has_many: bool,
    #[serde(default)]
    pub relation_model: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub layout: Option<i64>,
}

impl NewField {
    /// Minimal payload; everything else takes its default
    pub fn new(block_id: BlockId, name: &str, field_type: &str) -> Self {
        Self {
            block_id,
            name: name.to_string(),
            label: None,
            field_type: field_type.to_string(),
            order: None,
            options: Vec::new(),
            validation: ValidationRules::new(),
            default_value: None,
            is_required: false,
            has_many: false,
            relation_model: None,
            placeholder: None,
            help_text: None,
            description: None,
            layout: None,
        }
    }

    pub fn with_default(mut self, default_value: &str) -> Self {
        self.default_value = Some(default_value.to_string());
        self
    }

    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(label, value)| FieldOption {
                label: label.to_string(),
                value: value.to_string(),
            })
            .collect();
        self
    }
}

/// Partial update: absent attributes keep their stored value, explicit
/// `null` clears a nullable attribute.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    pub order: Option<i64>,
    pub options: Option<Vec<FieldOption>>,
    pub validation: Option<ValidationRules>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_value: Option<Option<String>>,
    pub is_required: Option<bool>,
    pub has_many: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub relation_model: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub placeholder: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub help_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub layout: Option<i64>,
}

impl FieldPatch {
    /// Merge onto an existing field. The type is applied separately once it
    /// has been parsed.
    pub fn apply_to(&self, field: &Field, field_type: FieldType) -> Field {
        let mut merged = field.clone();
        merged.field_type = field_type;
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(label) = &self.label {
            merged.label = label.clone();
        }
        if let Some(order) = self.order {
            merged.order = order;
        }
        if let Some(options) = &self.options {
            merged.options = options.clone();
        }
        if let Some(validation) = &self.validation {
            merged.validation = validation.clone();
        }
        if let Some(default_value) = &self.default_value {
            merged.default_value = default_value.clone();
        }
        if let Some(is_required) = self.is_required {
            merged.is_required = is_required;
        }
        if let Some(has_many) = self.has_many {
            merged.has_many = has_many;
        }
        if let Some(relation_model) = &self.relation_model {
            merged.relation_model = relation_model.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            merged.placeholder = placeholder.clone();
        }
        if let Some(help_text) = &self.help_text {
            merged.help_text = help_text.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(layout) = self.layout {
            merged.layout = layout;
        }
        merged
    }
}
