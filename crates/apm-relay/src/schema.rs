//! JSON Schema for the settings file.
//!
//! schemars emits draft-2020-12. YAML editor tooling still mostly speaks
//! draft-07, so the printed schema is rewritten:
//! - `$defs` becomes `definitions`, with every `$ref` updated
//! - `$schema` points at draft-07

use apm_relay_core::Settings;
use serde_json::{Map, Value};

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Draft-07 schema for [`Settings`].
pub fn settings_schema() -> Value {
    let schema = schemars::schema_for!(Settings);
    to_draft07(Value::from(schema))
}

fn to_draft07(mut schema: Value) -> Value {
    if let Some(root) = schema.as_object_mut() {
        if let Some(defs) = root.remove("$defs") {
            root.insert("definitions".to_string(), defs);
        }
        root.insert("$schema".to_string(), Value::String(DRAFT_07.to_string()));
        rewrite_refs(root);
    }
    schema
}

fn rewrite_refs(object: &mut Map<String, Value>) {
    for (key, value) in object.iter_mut() {
        match value {
            Value::String(target) if key == "$ref" => {
                if let Some(name) = target.strip_prefix("#/$defs/") {
                    *target = format!("#/definitions/{}", name);
                }
            }
            Value::Object(nested) => rewrite_refs(nested),
            Value::Array(items) => items
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .for_each(rewrite_refs),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refs_are_rewritten() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$defs": { "Key": { "type": "string" } },
            "properties": {
                "submit": { "$ref": "#/$defs/Key" },
                "keys": { "anyOf": [ { "$ref": "#/$defs/Key" }, { "type": "null" } ] }
            }
        });

        let result = to_draft07(schema);
        assert!(result.get("$defs").is_none());
        assert_eq!(result["$schema"], DRAFT_07);
        assert_eq!(result["properties"]["submit"]["$ref"], "#/definitions/Key");
        assert_eq!(
            result["properties"]["keys"]["anyOf"][0]["$ref"],
            "#/definitions/Key"
        );
    }

    #[test]
    fn test_settings_schema_sections() {
        let schema = settings_schema();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["primary", "secondary", "scanner", "workflow", "logging"] {
            assert!(properties.contains_key(section), "missing {}", section);
        }
        assert!(schema["definitions"].is_object());
        assert!(!schema.to_string().contains("#/$defs/"));
    }
}
