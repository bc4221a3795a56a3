//! JSON Schema validation of delivery descriptors.
//!
//! The schema file named by `delivery.schema_file` is a draft-07 JSON Schema.
//! [`DeliverySchema::default_document`] is the schema shipped for the
//! delivery descriptor format written next to submitted archives.

use super::DescriptorError;
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Compiled delivery descriptor schema
pub struct DeliverySchema {
    compiled: JSONSchema,
}

impl DeliverySchema {
    /// Compile a schema document; `origin` names it in errors
    pub fn compile(origin: &Path, document: &Value) -> Result<Self, DescriptorError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(document)
            .map_err(|e| DescriptorError::Schema {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self { compiled })
    }

    /// Read and compile a schema file
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let raw = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|source| DescriptorError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::compile(path, &document)
    }

    /// One line per schema violation of `document`
    pub fn violations(&self, document: &Value) -> Vec<String> {
        match self.compiled.validate(document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| {
                    let pointer = e.instance_path.to_string();
                    let property = if pointer.is_empty() { "/" } else { pointer.as_str() };
                    format!(
                        "Property '{}': {}",
                        property,
                        e.to_string().replace('\n', " ")
                    )
                })
                .collect(),
        }
    }

    /// Schema for delivery descriptors of type `DELIVERY`
    pub fn default_document() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "Delivery descriptor",
            "type": "object",
            "required": ["type", "files"],
            "properties": {
                "type": { "const": "DELIVERY" },
                "id": { "type": "string" },
                "profile": { "type": "string" },
                "files": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["href", "size", "checksum", "checksum_type"],
                        "properties": {
                            "href": { "type": "string", "minLength": 1 },
                            "size": { "type": "integer", "minimum": 0 },
                            "checksum": { "type": "string", "pattern": "^[0-9A-Fa-f]+$" },
                            "checksum_type": { "enum": ["MD5", "SHA-256"] },
                            "mimetype": { "type": "string" }
                        }
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for DeliverySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliverySchema").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> DeliverySchema {
        DeliverySchema::compile(Path::new("delivery_schema.json"), &DeliverySchema::default_document())
            .unwrap()
    }

    #[test]
    fn test_valid_delivery_descriptor() {
        let document = json!({
            "type": "DELIVERY",
            "files": [{
                "href": "SIP-1.tar",
                "size": 10240,
                "checksum": "900150983cd24fb0d6963f7d28e17f72",
                "checksum_type": "MD5"
            }]
        });
        assert!(schema().violations(&document).is_empty());
    }

    #[test]
    fn test_violations_name_the_property() {
        let violations = schema().violations(&json!({"type": "SIP"}));
        assert_eq!(violations.len(), 2, "{violations:?}");
        assert!(violations.iter().all(|v| v.starts_with("Property '")));
        assert!(violations.iter().any(|v| v.starts_with("Property '/type'")));
        assert!(violations.iter().any(|v| v.contains("files")));

        let violations = schema().violations(&json!({
            "type": "DELIVERY",
            "files": [{"href": "a.tar", "size": -1, "checksum": "zz", "checksum_type": "CRC"}]
        }));
        assert_eq!(violations.len(), 3, "{violations:?}");
        assert!(violations.iter().any(|v| v.starts_with("Property '/files/0/size'")));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let result = DeliverySchema::compile(Path::new("bad.json"), &json!({"type": 12}));
        assert!(matches!(result, Err(DescriptorError::Schema { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery_schema.json");
        fs::write(&path, DeliverySchema::default_document().to_string()).unwrap();
        assert!(DeliverySchema::load(&path).is_ok());
        assert!(matches!(
            DeliverySchema::load(&dir.path().join("missing.json")),
            Err(DescriptorError::Io { .. })
        ));
    }
}
