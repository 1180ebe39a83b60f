//! # Default Prompts
//!
//! Default prompt templates for schema generation and row extraction. These can be
//! overridden from `config.yml` or `prompt.yml` in the server.

// --- Schema Generation ---
pub const SCHEMA_GENERATION_SYSTEM_PROMPT: &str = r#"You receive a question from a user asking for data from documents. Restructure the data the user wants extracted into a single JSON object: generate the keys and insert example values. Keep it as simple as the user asks for; do not make it complicated. Do not make nested objects. In the next step this object is used iteratively for different entities, so it must only ever represent one entity, e.g. a candidate, a contract or a policy."#;

// --- Row Extraction ---

/// Placeholders: `{schema}` and `{documents}`.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You receive a question from a user asking for data from a document. Extract the exact data the user asks for from the document. Return your answer in the form of this example JSON object: {schema}. Do not reuse the values of the example object; provide precise values for the given keys. Document to extract from: {documents}"#;

pub const NOT_FOUND_INSTRUCTION: &str = r#"It is essential to return the data in the specified JSON format. If no value can be determined for a key, enter 'Not found' as its value."#;

/// Fills `{schema}` and `{documents}` into an extraction template.
///
/// Placeholders are only recognised in the template itself, never inside the
/// substituted schema or document text.
pub fn render_extraction_prompt(template: &str, schema: &str, documents: &str) -> String {
    let placeholders = [("{schema}", schema), ("{documents}", documents)];
    let mut rendered = String::with_capacity(template.len() + schema.len() + documents.len());
    let mut rest = template;
    loop {
        let next = placeholders
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
            .min_by_key(|(pos, _, _)| *pos);
        match next {
            Some((pos, key, value)) => {
                rendered.push_str(&rest[..pos]);
                rendered.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                rendered.push_str(rest);
                return rendered;
            }
        }
    }
}
