// Schema-driven validation
//
// Two boundaries: definitions (pages, blocks, fields) are checked strictly when
// they are written; document values are checked against a field's schema by
// `validate_value`, which callers may treat as advisory.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::core::strong_types::RecordId;
use crate::error::FieldErrors;
use crate::infrastructure::database::FieldRecord;
use crate::models::{Field, FieldOption, FieldType, FieldValue, ValidationRules};

pub const MAX_STRING_LENGTH: usize = 255;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").expect("valid slug regex"));
static FIELD_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid field name regex"));

/// Borrowed view of the parts of a field schema that drive value validation
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema<'a> {
    pub name: &'a str,
    pub field_type: FieldType,
    pub options: &'a [FieldOption],
    pub validation: &'a ValidationRules,
    pub default_value: Option<&'a str>,
    pub is_required: bool,
    pub has_many: bool,
}

impl<'a> FieldSchema<'a> {
    fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    fn required(&self) -> bool {
        self.is_required || self.validation.get("required").and_then(Value::as_bool) == Some(true)
    }

    fn options_hint(&self) -> String {
        let values: Vec<&str> = self.options.iter().map(|o| o.value.as_str()).collect();
        values.join(", ")
    }
}

impl<'a> From<&'a Field> for FieldSchema<'a> {
    fn from(field: &'a Field) -> Self {
        Self {
            name: &field.name,
            field_type: field.field_type,
            options: &field.options,
            validation: &field.validation,
            default_value: field.default_value.as_deref(),
            is_required: field.is_required,
            has_many: field.has_many,
        }
    }
}

impl<'a> From<&'a FieldRecord> for FieldSchema<'a> {
    fn from(field: &'a FieldRecord) -> Self {
        Self {
            name: &field.name,
            field_type: field.field_type,
            options: &field.options,
            validation: &field.validation,
            default_value: field.default_value.as_deref(),
            is_required: field.is_required,
            has_many: field.has_many,
        }
    }
}

fn check_required_string(errors: &mut FieldErrors, attribute: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(attribute, "is required");
    } else if value.chars().count() > MAX_STRING_LENGTH {
        errors.add(
            attribute,
            format!("must be at most {} characters", MAX_STRING_LENGTH),
        );
    }
}

fn check_optional_string(errors: &mut FieldErrors, attribute: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.chars().count() > MAX_STRING_LENGTH {
            errors.add(
                attribute,
                format!("must be at most {} characters", MAX_STRING_LENGTH),
            );
        }
    }
}

fn check_slug(errors: &mut FieldErrors, slug: &str) {
    check_required_string(errors, "slug", slug);
    if !slug.trim().is_empty() && !SLUG_PATTERN.is_match(slug) {
        errors.add(
            "slug",
            "may only contain lowercase letters, digits, dashes and underscores",
        );
    }
}

pub fn validate_page_definition(title: &str, slug: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_required_string(&mut errors, "title", title);
    check_slug(&mut errors, slug);
    errors.into_result()
}

pub fn validate_block_definition(
    title: &str,
    slug: &str,
    icon: Option<&str>,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_required_string(&mut errors, "title", title);
    check_slug(&mut errors, slug);
    check_optional_string(&mut errors, "icon", icon);
    errors.into_result()
}

/// Unknown types are rejected here, at the schema boundary, never when a
/// document is written.
pub fn parse_field_type(raw: &str) -> Result<FieldType, FieldErrors> {
    raw.parse::<FieldType>()
        .map_err(|message| FieldErrors::single("type", message))
}

pub fn validate_field_definition(field: &FieldRecord) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check_required_string(&mut errors, "name", &field.name);
    if !field.name.trim().is_empty() && !FIELD_NAME_PATTERN.is_match(&field.name) {
        errors.add(
            "name",
            "may only contain letters, digits, dashes and underscores and must not start with a digit or dash",
        );
    }
    check_required_string(&mut errors, "label", &field.label);
    check_optional_string(&mut errors, "placeholder", field.placeholder.as_deref());
    check_optional_string(&mut errors, "help_text", field.help_text.as_deref());

    if !(1..=12).contains(&field.layout) {
        errors.add("layout", "must be between 1 and 12");
    }
    if field.order < 0 {
        errors.add("order", "must not be negative");
    }

    check_options(&mut errors, field);

    if field.has_many && !field.field_type.supports_many() {
        errors.add(
            "has_many",
            format!("is not supported for {} fields", field.field_type),
        );
    }

    if field.field_type == FieldType::Relation {
        match field.relation_model.as_deref().map(str::trim) {
            None | Some("") => errors.add("relation_model", "is required for relation fields"),
            Some(model) => check_optional_string(&mut errors, "relation_model", Some(model)),
        }
    }

    check_rules(&mut errors, &field.validation);

    // A default must itself be an admissible value
    if errors.is_empty() && field.default_value.is_some() {
        let schema = FieldSchema {
            is_required: false,
            ..FieldSchema::from(field)
        };
        let default = coerce_default(schema);
        if let Err(value_errors) = validate_value(schema, Some(&default)) {
            for message in value_errors.get(&field.name).unwrap_or_default() {
                errors.add("default_value", message.clone());
            }
        }
    }

    errors.into_result()
}

fn check_options(errors: &mut FieldErrors, field: &FieldRecord) {
    if matches!(field.field_type, FieldType::Select | FieldType::Radio) && field.options.is_empty()
    {
        errors.add(
            "options",
            format!("at least one option is required for {} fields", field.field_type),
        );
    }
    for (index, option) in field.options.iter().enumerate() {
        if option.value.trim().is_empty() {
            errors.add(format!("options.{}.value", index), "is required");
        }
        if option.label.trim().is_empty() {
            errors.add(format!("options.{}.label", index), "is required");
        }
        if field.options[..index].iter().any(|o| o.value == option.value) {
            errors.add(
                format!("options.{}.value", index),
                format!("duplicates the option value '{}'", option.value),
            );
        }
    }
}

fn check_rules(errors: &mut FieldErrors, rules: &ValidationRules) {
    for key in ["min_length", "max_length", "min_items", "max_items"] {
        if let Some(value) = rules.get(key) {
            if value.as_u64().is_none() {
                errors.add(
                    format!("validation.{}", key),
                    "must be a non-negative integer",
                );
            }
        }
    }
    for key in ["min", "max"] {
        if let Some(value) = rules.get(key) {
            if !value.is_number() {
                errors.add(format!("validation.{}", key), "must be a number");
            }
        }
    }
    if let (Some(min), Some(max)) = (
        rules.get("min").and_then(Value::as_f64),
        rules.get("max").and_then(Value::as_f64),
    ) {
        if min > max {
            errors.add("validation.min", "must not be greater than max");
        }
    }
    if let Some(pattern) = rules.get("pattern") {
        match pattern.as_str() {
            Some(pattern) => {
                if let Err(e) = Regex::new(pattern) {
                    errors.add("validation.pattern", format!("is not a valid pattern: {}", e));
                }
            }
            None => errors.add("validation.pattern", "must be a string"),
        }
    }
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Text(s) => s.trim().is_empty(),
        FieldValue::TextList(items) => items.is_empty(),
        FieldValue::RelationList(ids) => ids.is_empty(),
        FieldValue::Json(Value::Null) => true,
        FieldValue::Json(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// Validate and coerce a candidate document value against a field schema.
///
/// Absent or blank values pass as `Null` unless the field is required.
/// Errors are keyed by the field name.
pub fn validate_value<'a>(
    field: impl Into<FieldSchema<'a>>,
    value: Option<&FieldValue>,
) -> Result<FieldValue, FieldErrors> {
    let schema = field.into();
    let fail = |message: String| Err(FieldErrors::single(schema.name, message));

    let value = match value.filter(|v| !is_blank(v)) {
        Some(value) => value,
        None if schema.required() => return fail("is required".to_string()),
        None => return Ok(FieldValue::Null),
    };

    let coerced = if schema.has_many {
        if !value.is_list() {
            return fail("must be a list of values".to_string());
        }
        coerce_many(schema, value)
    } else {
        if value.is_list() {
            return fail("must be a single value, not a list".to_string());
        }
        coerce_one(schema, value)
    };

    match coerced {
        Ok(coerced) => {
            let mut errors = FieldErrors::new();
            apply_rules(schema, &coerced, &mut errors);
            errors.into_result().map(|_| coerced)
        }
        Err(message) => fail(message),
    }
}

fn list_items(value: &FieldValue) -> Vec<Value> {
    match value.to_json() {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn coerce_many(schema: FieldSchema<'_>, value: &FieldValue) -> Result<FieldValue, String> {
    let items = list_items(value);
    match schema.field_type {
        FieldType::Relation => items
            .iter()
            .map(relation_id)
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::RelationList),
        FieldType::Checkbox | FieldType::Select => items
            .iter()
            .map(|item| choice(schema, &FieldValue::from_json(item.clone())))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::TextList),
        _ => items
            .into_iter()
            .map(|item| coerce_one(schema, &FieldValue::from_json(item)).map(|v| v.to_json()))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| FieldValue::Json(Value::Array(items))),
    }
}

fn coerce_one(schema: FieldSchema<'_>, value: &FieldValue) -> Result<FieldValue, String> {
    match schema.field_type {
        FieldType::Text | FieldType::Textarea => match value {
            FieldValue::Text(s) => Ok(FieldValue::Text(s.clone())),
            FieldValue::Number(n) => Ok(FieldValue::Text(n.to_string())),
            _ => Err("must be a string".to_string()),
        },
        FieldType::Richtext => match value {
            FieldValue::Text(s) => Ok(FieldValue::Text(s.clone())),
            FieldValue::Json(v @ (Value::Object(_) | Value::Array(_))) => {
                Ok(FieldValue::Json(v.clone()))
            }
            _ => Err("must be rich text".to_string()),
        },
        FieldType::Number => number(value)
            .map(FieldValue::Number)
            .ok_or_else(|| "must be a number".to_string()),
        FieldType::Boolean => boolean(value)
            .map(FieldValue::Bool)
            .ok_or_else(|| "must be true or false".to_string()),
        FieldType::Checkbox if schema.options.is_empty() => boolean(value)
            .map(FieldValue::Bool)
            .ok_or_else(|| "must be true or false".to_string()),
        FieldType::Checkbox | FieldType::Select | FieldType::Radio => {
            choice(schema, value).map(FieldValue::Text)
        }
        FieldType::Date => match value {
            FieldValue::Text(s) if is_date(s) => Ok(FieldValue::Text(s.clone())),
            _ => Err("must be a date (YYYY-MM-DD)".to_string()),
        },
        FieldType::Upload => match value {
            FieldValue::Media(_) | FieldValue::Text(_) => Ok(value.clone()),
            FieldValue::Number(n) if n.as_i64().is_some() => Ok(value.clone()),
            FieldValue::Json(Value::Object(object)) if object.get("url").is_some_and(Value::is_string) => {
                Ok(value.clone())
            }
            _ => Err("must be a media id, url or reference".to_string()),
        },
        FieldType::Relation => relation_id(&value.to_json()).map(FieldValue::Relation),
    }
}

fn number(value: &FieldValue) -> Option<Number> {
    match value {
        FieldValue::Number(n) => Some(n.clone()),
        FieldValue::Text(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Number::from(int));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

fn boolean(value: &FieldValue) -> Option<bool> {
    match value {
        FieldValue::Bool(b) => Some(*b),
        FieldValue::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        FieldValue::Text(s) => parse_bool(s),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn choice(schema: FieldSchema<'_>, value: &FieldValue) -> Result<String, String> {
    let picked = match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        _ => return Err("must be one of the field's options".to_string()),
    };
    if schema.options.is_empty() || schema.has_option(&picked) {
        Ok(picked)
    } else {
        Err(format!(
            "'{}' is not one of the allowed options ({})",
            picked,
            schema.options_hint()
        ))
    }
}

fn relation_id(value: &Value) -> Result<RecordId, String> {
    let candidate = match value {
        Value::Object(object) => object.get("id").unwrap_or(&Value::Null),
        other => other,
    };
    RecordId::from_json(candidate).ok_or_else(|| "must be an id or a list of ids".to_string())
}

fn is_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(raw.trim()).is_ok()
}

fn apply_rules(schema: FieldSchema<'_>, value: &FieldValue, errors: &mut FieldErrors) {
    let rules = schema.validation;
    let rule_u64 = |key: &str| rules.get(key).and_then(Value::as_u64);
    let rule_f64 = |key: &str| rules.get(key).and_then(Value::as_f64);

    match value {
        FieldValue::Text(text) => {
            let length = text.chars().count() as u64;
            let min = rule_u64("min_length").or_else(|| rule_u64("min"));
            let max = rule_u64("max_length").or_else(|| rule_u64("max"));
            if let Some(min) = min {
                if length < min {
                    errors.add(schema.name, format!("must be at least {} characters", min));
                }
            }
            if let Some(max) = max {
                if length > max {
                    errors.add(schema.name, format!("must be at most {} characters", max));
                }
            }
            if let Some(pattern) = rules.get("pattern").and_then(Value::as_str) {
                match Regex::new(pattern) {
                    Ok(re) if re.is_match(text) => {}
                    Ok(_) => errors.add(schema.name, "does not match the required format"),
                    Err(_) => errors.add(schema.name, "has an invalid validation pattern"),
                }
            }
        }
        FieldValue::Number(n) => {
            if let Some(n) = n.as_f64() {
                if let Some(min) = rule_f64("min") {
                    if n < min {
                        errors.add(schema.name, format!("must be at least {}", min));
                    }
                }
                if let Some(max) = rule_f64("max") {
                    if n > max {
                        errors.add(schema.name, format!("must be at most {}", max));
                    }
                }
            }
        }
        list if list.is_list() => {
            let count = list_items(list).len() as u64;
            if let Some(min) = rule_u64("min_items") {
                if count < min {
                    errors.add(schema.name, format!("must contain at least {} items", min));
                }
            }
            if let Some(max) = rule_u64("max_items") {
                if count > max {
                    errors.add(schema.name, format!("must contain at most {} items", max));
                }
            }
        }
        _ => {}
    }
}

/// The field's `default_value` string coerced to the field's type.
///
/// Multi-valued defaults may be written as a JSON array or as a comma
/// separated list. Strings that do not fit the type are kept as text.
pub fn coerce_default<'a>(field: impl Into<FieldSchema<'a>>) -> FieldValue {
    let schema = field.into();
    let Some(raw) = schema.default_value else {
        return FieldValue::Null;
    };

    if schema.has_many {
        let items: Vec<Value> = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            _ => raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        };
        return match schema.field_type {
            FieldType::Relation => FieldValue::RelationList(
                items.iter().filter_map(RecordId::from_json).collect(),
            ),
            _ => FieldValue::from_json(Value::Array(items)),
        };
    }

    match schema.field_type {
        FieldType::Number => match parse_number(raw) {
            Some(n) => FieldValue::Number(n),
            None if raw.trim().is_empty() => FieldValue::Null,
            None => FieldValue::Text(raw.to_string()),
        },
        FieldType::Boolean => match parse_bool(raw) {
            Some(b) => FieldValue::Bool(b),
            None if raw.trim().is_empty() => FieldValue::Null,
            None => FieldValue::Text(raw.to_string()),
        },
        FieldType::Checkbox if schema.options.is_empty() => match parse_bool(raw) {
            Some(b) => FieldValue::Bool(b),
            None => FieldValue::Text(raw.to_string()),
        },
        FieldType::Relation => match RecordId::from_json(&Value::String(raw.to_string())) {
            Some(id) => FieldValue::Relation(id),
            None => FieldValue::Null,
        },
        _ => FieldValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strong_types::BlockId;
    use serde_json::json;

    fn record(name: &str, field_type: FieldType) -> FieldRecord {
        FieldRecord {
            block_id: BlockId(1),
            name: name.to_string(),
            label: name.to_string(),
            field_type,
            order: 0,
            options: Vec::new(),
            validation: ValidationRules::new(),
            default_value: None,
            is_required: false,
            has_many: false,
            relation_model: None,
            placeholder: None,
            help_text: None,
            description: None,
            layout: 12,
        }
    }

    fn with_options(mut field: FieldRecord, values: &[&str]) -> FieldRecord {
        field.options = values
            .iter()
            .map(|v| FieldOption {
                label: v.to_uppercase(),
                value: v.to_string(),
            })
            .collect();
        field
    }

    fn rules(value: Value) -> ValidationRules {
        match value {
            Value::Object(map) => map,
            _ => panic!("rules must be an object"),
        }
    }

    #[test]
    fn test_unknown_type_fails_at_definition_time() {
        let errors = parse_field_type("colorpicker").unwrap_err();
        assert!(errors.contains("type"));
        assert_eq!(parse_field_type("select").unwrap(), FieldType::Select);
    }

    #[test]
    fn test_required_check() {
        let mut field = record("title", FieldType::Text);
        assert_eq!(validate_value(&field, None).unwrap(), FieldValue::Null);

        field.is_required = true;
        let errors = validate_value(&field, Some(&FieldValue::from("  "))).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["is required".to_string()]);

        let mut by_rule = record("title", FieldType::Text);
        by_rule.validation = rules(json!({"required": true}));
        assert!(validate_value(&by_rule, Some(&FieldValue::Null)).is_err());
    }

    #[test]
    fn test_choice_fields_check_options() {
        let field = with_options(record("size", FieldType::Select), &["s", "m"]);
        assert_eq!(
            validate_value(&field, Some(&FieldValue::from("m"))).unwrap(),
            FieldValue::Text("m".into())
        );
        let errors = validate_value(&field, Some(&FieldValue::from("xl"))).unwrap_err();
        assert!(errors.get("size").unwrap()[0].contains("not one of the allowed options"));

        let radio = with_options(record("align", FieldType::Radio), &["left", "right"]);
        assert!(validate_value(&radio, Some(&FieldValue::from("center"))).is_err());
    }

    #[test]
    fn test_has_many_requires_a_list() {
        let mut field = with_options(record("tags", FieldType::Checkbox), &["a", "b", "c"]);
        field.has_many = true;

        let list = FieldValue::from(json!(["a", "c"]));
        assert_eq!(
            validate_value(&field, Some(&list)).unwrap(),
            FieldValue::TextList(vec!["a".into(), "c".into()])
        );
        assert!(validate_value(&field, Some(&FieldValue::from("a"))).is_err());
        assert!(validate_value(&field, Some(&FieldValue::from(json!(["a", "z"])))).is_err());

        let single = with_options(record("tag", FieldType::Select), &["a"]);
        let errors = validate_value(&single, Some(&list)).unwrap_err();
        assert!(errors.get("tag").unwrap()[0].contains("single value"));
    }

    #[test]
    fn test_relation_values_must_be_ids() {
        let mut field = record("product", FieldType::Relation);
        field.relation_model = Some("product".into());

        assert_eq!(
            validate_value(&field, Some(&FieldValue::from(json!(4)))).unwrap(),
            FieldValue::Relation(RecordId::Int(4))
        );
        assert_eq!(
            validate_value(&field, Some(&FieldValue::from("12"))).unwrap(),
            FieldValue::Relation(RecordId::Int(12))
        );
        assert!(validate_value(&field, Some(&FieldValue::from(json!(true)))).is_err());
        assert!(validate_value(&field, Some(&FieldValue::from(json!(2.5)))).is_err());

        field.has_many = true;
        assert_eq!(
            validate_value(&field, Some(&FieldValue::from(json!([1, "2", {"id": 3}])))).unwrap(),
            FieldValue::RelationList(vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3)])
        );
        assert!(validate_value(&field, Some(&FieldValue::from(json!([1, null])))).is_err());
    }

    #[test]
    fn test_scalar_coercions() {
        let number = record("price", FieldType::Number);
        assert_eq!(
            validate_value(&number, Some(&FieldValue::from("42"))).unwrap(),
            FieldValue::Number(42.into())
        );
        assert!(validate_value(&number, Some(&FieldValue::from("abc"))).is_err());

        let flag = record("visible", FieldType::Boolean);
        assert_eq!(
            validate_value(&flag, Some(&FieldValue::from("on"))).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            validate_value(&flag, Some(&FieldValue::from(json!(0)))).unwrap(),
            FieldValue::Bool(false)
        );

        let date = record("starts", FieldType::Date);
        assert!(validate_value(&date, Some(&FieldValue::from("2024-02-29"))).is_ok());
        assert!(validate_value(&date, Some(&FieldValue::from("2023-02-29"))).is_err());
    }

    #[test]
    fn test_rule_set_is_applied() {
        let mut title = record("title", FieldType::Text);
        title.validation = rules(json!({"max_length": 5, "pattern": "^[a-z]+$"}));
        assert!(validate_value(&title, Some(&FieldValue::from("hello"))).is_ok());
        let errors = validate_value(&title, Some(&FieldValue::from("Hello World"))).unwrap_err();
        assert_eq!(errors.get("title").unwrap().len(), 2);

        let mut count = record("count", FieldType::Number);
        count.validation = rules(json!({"min": 1, "max": 10}));
        assert!(validate_value(&count, Some(&FieldValue::from(json!(11)))).is_err());
        assert!(validate_value(&count, Some(&FieldValue::from(json!(10)))).is_ok());
    }

    #[test]
    fn test_field_definition_checks() {
        assert!(validate_field_definition(&record("heading", FieldType::Text)).is_ok());

        let mut bad = record("1st name", FieldType::Relation);
        bad.layout = 13;
        bad.has_many = false;
        let errors = validate_field_definition(&bad).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("layout"));
        assert!(errors.contains("relation_model"));

        let select = record("size", FieldType::Select);
        assert!(validate_field_definition(&select).unwrap_err().contains("options"));

        let mut many_text = record("lines", FieldType::Text);
        many_text.has_many = true;
        assert!(validate_field_definition(&many_text).unwrap_err().contains("has_many"));

        let mut bad_pattern = record("code", FieldType::Text);
        bad_pattern.validation = rules(json!({"pattern": "("}));
        assert!(validate_field_definition(&bad_pattern)
            .unwrap_err()
            .contains("validation.pattern"));
    }

    #[test]
    fn test_default_must_fit_the_schema() {
        let mut select = with_options(record("size", FieldType::Select), &["s", "m"]);
        select.default_value = Some("xl".into());
        assert!(validate_field_definition(&select)
            .unwrap_err()
            .contains("default_value"));

        select.default_value = Some("m".into());
        assert!(validate_field_definition(&select).is_ok());

        let mut number = record("count", FieldType::Number);
        number.default_value = Some("ten".into());
        assert!(validate_field_definition(&number)
            .unwrap_err()
            .contains("default_value"));
    }

    #[test]
    fn test_default_coercion() {
        let mut number = record("count", FieldType::Number);
        number.default_value = Some("3".into());
        assert_eq!(coerce_default(&number), FieldValue::Number(3.into()));

        let mut text = record("title", FieldType::Text);
        text.default_value = Some("Untitled".into());
        assert_eq!(coerce_default(&text), FieldValue::Text("Untitled".into()));

        let mut tags = with_options(record("tags", FieldType::Checkbox), &["a", "b"]);
        tags.has_many = true;
        tags.default_value = Some("a, b".into());
        assert_eq!(
            coerce_default(&tags),
            FieldValue::TextList(vec!["a".into(), "b".into()])
        );

        let mut related = record("products", FieldType::Relation);
        related.has_many = true;
        related.default_value = Some("[1, 2]".into());
        assert_eq!(
            coerce_default(&related),
            FieldValue::RelationList(vec![RecordId::Int(1), RecordId::Int(2)])
        );

        assert_eq!(coerce_default(&record("none", FieldType::Text)), FieldValue::Null);
    }

    #[test]
    fn test_block_and_page_definitions() {
        assert!(validate_block_definition("Hero", "hero", None).is_ok());
        let errors = validate_block_definition("", "Hero Banner", None).unwrap_err();
        assert!(errors.contains("title"));
        assert!(errors.contains("slug"));
        assert!(validate_page_definition("Home", "home-page").is_ok());
        assert!(validate_page_definition("Home", "home page").is_err());
    }
}
