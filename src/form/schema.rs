use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Field kinds the form renderer understands. Anything newer in the
/// config file degrades to `Other` instead of failing the whole load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Date,
    Number,
    Textarea,
    Select,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: FieldType,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub full_width: bool,
}

impl FieldDescriptor {
    /// Select fields carry their options as a comma list in the
    /// placeholder.
    pub fn select_options(&self) -> Vec<&str> {
        self.placeholder
            .split(',')
            .map(str::trim)
            .filter(|option| !option.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormSchema {
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub com: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CommentSchema {
    comments: Vec<Comment>,
}

pub fn load_form_schema(path: &Path) -> Result<FormSchema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read form config at {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("form config at {} is not valid", path.display()))
}

pub fn load_comments(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read comments at {}", path.display()))?;
    let schema: CommentSchema = serde_json::from_str(&text)
        .with_context(|| format!("comments file at {} is not valid", path.display()))?;
    Ok(schema.comments.into_iter().map(|c| c.com).collect())
}

/// Single-field form used when the real config cannot be loaded.
pub fn default_form_schema() -> FormSchema {
    FormSchema {
        fields: vec![FieldDescriptor {
            id: "name-provided".into(),
            label: "Name Provided:".into(),
            kind: FieldType::Text,
            placeholder: "Enter your name".into(),
            required: false,
            full_width: false,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_parse_with_camel_case_keys() {
        let schema: FormSchema = serde_json::from_str(
            r#"{
                "fields": [
                    {"id": "surname", "label": "Surnames:", "type": "text", "placeholder": "e.g. FERNANDEZ GARCIA", "required": true},
                    {"id": "bio", "label": "Biography:", "type": "textarea", "fullWidth": true}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].id, "surname");
        assert_eq!(schema.fields[0].kind, FieldType::Text);
        assert!(schema.fields[0].required);
        assert!(!schema.fields[0].full_width);
        assert_eq!(schema.fields[1].kind, FieldType::Textarea);
        assert!(schema.fields[1].full_width);
        assert_eq!(
            schema.field_ids().collect::<Vec<_>>(),
            vec!["surname", "bio"]
        );
    }

    #[test]
    fn unknown_field_type_degrades_to_other() {
        let field: FieldDescriptor = serde_json::from_str(
            r#"{"id": "x", "label": "X:", "type": "holo-input"}"#,
        )
        .unwrap();
        assert_eq!(field.kind, FieldType::Other);
    }

    #[test]
    fn missing_field_type_defaults_to_text() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"id": "x", "label": "X:"}"#).unwrap();
        assert_eq!(field.kind, FieldType::Text);
        assert_eq!(field.placeholder, "");
        assert!(!field.required);
    }

    #[test]
    fn select_options_come_from_the_placeholder() {
        let field: FieldDescriptor = serde_json::from_str(
            r#"{"id": "purpose", "label": "Purpose:", "type": "select", "placeholder": "Business, Tourism , Transit"}"#,
        )
        .unwrap();
        assert_eq!(field.select_options(), vec!["Business", "Tourism", "Transit"]);
    }

    #[test]
    fn empty_placeholder_yields_no_options() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"id": "x", "label": "X:", "type": "select"}"#).unwrap();
        assert!(field.select_options().is_empty());
    }

    #[test]
    fn comments_unwrap_to_plain_strings() {
        let comments: CommentSchema = serde_json::from_str(
            r#"{"comments": [{"com": "Hurry up."}, {"com": "Why the delay?"}]}"#,
        )
        .unwrap();
        let texts: Vec<String> = comments.comments.into_iter().map(|c| c.com).collect();
        assert_eq!(texts, vec!["Hurry up.", "Why the delay?"]);
    }

    #[test]
    fn fallback_schema_is_the_name_field() {
        let schema = default_form_schema();
        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].id, "name-provided");
        assert_eq!(schema.fields[0].label, "Name Provided:");
        assert_eq!(schema.fields[0].placeholder, "Enter your name");
    }
}
