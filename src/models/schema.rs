use once_cell::sync::Lazy;
use schemars::{generate::SchemaSettings, JsonSchema};
use serde_json::Value;

use crate::models::domain::Course;

static COURSE_SCHEMA: Lazy<Value> = Lazy::new(response_schema_for::<Course>);

/// JSON schema for the course output, shaped for a structured-output request.
///
/// Subschemas are inlined because structured-output endpoints do not
/// reliably resolve `$ref`. Root metadata keys are dropped. Every declared
/// property is listed as required; optional fields stay nullable instead.
pub fn course_response_schema() -> &'static Value {
    &COURSE_SCHEMA
}

pub fn response_schema_for<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft2020_12()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let mut value = generator.into_root_schema_for::<T>().to_value();

    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    require_all_properties(&mut value);

    value
}

fn require_all_properties(schema: &mut Value) {
    match schema {
        Value::Object(object) => {
            if let Some(Value::Object(properties)) = object.get("properties") {
                let names = properties.keys().cloned().map(Value::String).collect();
                object.insert("required".to_string(), Value::Array(names));
            }
            for child in object.values_mut() {
                require_all_properties(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(require_all_properties),
        _ => {}
    }
}
