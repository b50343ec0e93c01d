// Resolved type graph. Immutable once produced; nested schemas are shared.
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    pub properties: IndexMap<String, TypeProperty>,  // declaration order
    pub is_array: bool,
    pub is_enum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,           // present iff is_enum
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeProperty {
    #[serde(rename = "type")]
    pub type_name: String,   // display text of the declared type
    pub is_optional: bool,
    pub is_array: bool,
    pub is_enum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_type: Option<Arc<Schema>>,
}

impl Schema {
    pub fn object(name: impl Into<String>, properties: IndexMap<String, TypeProperty>, is_array: bool) -> Self {
        Schema { name: name.into(), properties, is_array, is_enum: false, enum_values: None }
    }

    pub fn enumeration(name: impl Into<String>, values: Vec<String>, is_array: bool) -> Self {
        Schema {
            name: name.into(),
            properties: IndexMap::new(),
            is_array,
            is_enum: true,
            enum_values: Some(values),
        }
    }

    /// Names of every schema nested below this one (depth-first, not deduplicated).
    pub fn nested_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(schema) = stack.pop() {
            for prop in schema.properties.values() {
                if let Some(nested) = &prop.nested_type {
                    out.push(nested.name.as_str());
                    stack.push(nested);
                }
            }
        }
        out
    }
}

impl TypeProperty {
    /// An opaque leaf of the given display type.
    pub fn leaf(type_name: impl Into<String>) -> Self {
        TypeProperty {
            type_name: type_name.into(),
            is_optional: false,
            is_array: false,
            is_enum: false,
            enum_values: None,
            nested_type: None,
        }
    }

    pub fn optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    pub fn array(mut self, is_array: bool) -> Self {
        self.is_array = is_array;
        self
    }

    pub fn literals(mut self, values: Option<Vec<String>>) -> Self {
        self.is_enum = values.is_some();
        self.enum_values = values;
        self
    }

    pub fn nested(mut self, schema: Arc<Schema>) -> Self {
        self.nested_type = Some(schema);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_declaration_order_with_camel_case() {
        let mut props = IndexMap::new();
        props.insert("id".to_string(), TypeProperty::leaf("string"));
        props.insert(
            "tags".to_string(),
            TypeProperty::leaf("string").optional(true).array(true),
        );
        props.insert(
            "role".to_string(),
            TypeProperty::leaf("Role").literals(Some(vec!["a".into()])),
        );
        let schema = Schema::object("User", props, false);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "User",
                "properties": {
                    "id": { "type": "string", "isOptional": false, "isArray": false, "isEnum": false },
                    "tags": { "type": "string", "isOptional": true, "isArray": true, "isEnum": false },
                    "role": { "type": "Role", "isOptional": false, "isArray": false, "isEnum": true, "enumValues": ["a"] }
                },
                "isArray": false,
                "isEnum": false
            })
        );
        let keys: Vec<_> = value["properties"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["id", "tags", "role"]);
    }

    #[test]
    fn nested_names_walks_the_graph() {
        let inner = Arc::new(Schema::object("B", IndexMap::new(), false));
        let mut props = IndexMap::new();
        props.insert("b".to_string(), TypeProperty::leaf("B").nested(inner));
        let outer = Schema::object("A", props, false);
        assert_eq!(outer.nested_names(), ["B"]);
    }
}
