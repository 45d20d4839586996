//! Extraction schemas - required-field lists and prompt templates
//!
//! A schema describes one kind of document the pipeline knows how to read:
//! the prompt preamble sent with every extraction call, the fixed list of
//! required fields used for confidence scoring, and the all-null default
//! record synthesized when a backend's output cannot be parsed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a required field should be defaulted when no value was extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free-text field, defaults to null
    Text,
    /// Boolean field, defaults to false
    Boolean,
    /// Closed-vocabulary field, defaults to "unknown"
    Enum,
}

/// One entry in a schema's required-field list.
///
/// The path may be dotted (`"parties.buyer"`), navigated field-by-field
/// into nested objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredField {
    /// Dotted path into the extracted record
    pub path: String,

    /// Default synthesis rule for the field
    pub kind: FieldKind,
}

impl RequiredField {
    /// Shorthand constructor
    pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// A document schema: prompt template plus required-field list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Stable identifier callers select schemas by
    pub id: String,

    /// Human-readable schema title
    pub title: String,

    /// Instruction block prepended to every extraction prompt
    pub prompt_preamble: String,

    /// Fields counted toward the completeness-based confidence score
    pub required_fields: Vec<RequiredField>,
}

impl ExtractionSchema {
    /// Build the complete extraction prompt for one document or chunk.
    ///
    /// The preamble encodes the per-chunk contract: extract whatever fields
    /// appear in this text, return null for absent fields, output JSON only.
    pub fn build_prompt(&self, text: &str) -> String {
        let mut prompt = String::with_capacity(self.prompt_preamble.len() + text.len() + 128);
        prompt.push_str(&self.prompt_preamble);
        prompt.push_str("\n\nText to analyze:\n---\n");
        prompt.push_str(text);
        prompt.push_str("\n---\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }

    /// Synthesize the schema-shaped record with every field defaulted.
    ///
    /// Used when backend output cannot be coerced to JSON: text fields
    /// become null, booleans false, enums "unknown". Dotted paths produce
    /// nested objects.
    pub fn default_record(&self) -> Value {
        let mut record = Value::Object(serde_json::Map::new());
        for field in &self.required_fields {
            let default = match field.kind {
                FieldKind::Text => Value::Null,
                FieldKind::Boolean => Value::Bool(false),
                FieldKind::Enum => Value::String("unknown".to_string()),
            };
            insert_at_path(&mut record, &field.path, default);
        }
        record
    }
}

/// Insert `value` at a dotted path, creating intermediate objects as needed
fn insert_at_path(record: &mut Value, path: &str, value: Value) {
    let mut cursor = record;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Value::Object(map) = cursor else { return };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        cursor = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !cursor.is_object() {
            *cursor = Value::Object(serde_json::Map::new());
        }
    }
}

/// Registry of the schemas this deployment can extract
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<ExtractionSchema>,
}

impl SchemaRegistry {
    /// Registry preloaded with the built-in schemas
    pub fn builtin() -> Self {
        Self {
            schemas: vec![purchase_agreement_schema()],
        }
    }

    /// Register an additional schema
    pub fn register(&mut self, schema: ExtractionSchema) {
        self.schemas.push(schema);
    }

    /// Look up a schema by id
    pub fn get(&self, id: &str) -> Option<&ExtractionSchema> {
        self.schemas.iter().find(|s| s.id == id)
    }

    /// Ids of all registered schemas
    pub fn ids(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.id.as_str()).collect()
    }
}

const PURCHASE_AGREEMENT_INSTRUCTIONS: &str = r#"You are reading one portion of a real-estate purchase agreement. Extract the fields below from THIS TEXT ONLY.

Rules:
- Return a single JSON object matching the field layout shown
- For any field not present in this text, return null - do not guess
- Dates in YYYY-MM-DD format; monetary amounts as plain numbers without symbols
- Boolean contingency fields are true only when the text states the contingency applies
- Quote names and addresses exactly as written in the source

Field layout:
{
  "parties": {"buyer": string|null, "seller": string|null},
  "property": {"address": string|null, "legal_description": string|null},
  "purchase_price": number|null,
  "earnest_money": number|null,
  "closing_date": string|null,
  "possession_date": string|null,
  "financing_type": "cash"|"conventional"|"fha"|"va"|"unknown",
  "contingencies": {"financing": boolean, "inspection": boolean, "appraisal": boolean},
  "title_company": string|null,
  "special_provisions": string|null
}"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Return ONLY the JSON object, no markdown code blocks, no explanations.";

/// Built-in schema for residential purchase agreements
fn purchase_agreement_schema() -> ExtractionSchema {
    use FieldKind::*;
    ExtractionSchema {
        id: "purchase_agreement".to_string(),
        title: "Real Estate Purchase Agreement".to_string(),
        prompt_preamble: PURCHASE_AGREEMENT_INSTRUCTIONS.to_string(),
        required_fields: vec![
            RequiredField::new("parties.buyer", Text),
            RequiredField::new("parties.seller", Text),
            RequiredField::new("property.address", Text),
            RequiredField::new("purchase_price", Text),
            RequiredField::new("earnest_money", Text),
            RequiredField::new("closing_date", Text),
            RequiredField::new("financing_type", Enum),
            RequiredField::new("contingencies.financing", Boolean),
            RequiredField::new("contingencies.inspection", Boolean),
            RequiredField::new("contingencies.appraisal", Boolean),
        ],
    }
}
