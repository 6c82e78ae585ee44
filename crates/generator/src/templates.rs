//! Template loading and management

use cfn_controller_gen_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

pub const TYPES_TEMPLATE: &str = "types.go";
pub const STACK_OBJECT_TEMPLATE: &str = "stackobject.go";
pub const GROUP_VERSION_TEMPLATE: &str = "groupversion_info.go";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("lowerfirst", lowerfirst_filter);

    let templates = [
        (TYPES_TEMPLATE, include_str!("../templates/types.go.tera")),
        (
            STACK_OBJECT_TEMPLATE,
            include_str!("../templates/stackobject.go.tera"),
        ),
        (
            GROUP_VERSION_TEMPLATE,
            include_str!("../templates/groupversion_info.go.tera"),
        ),
    ];

    for (name, body) in templates {
        tera.add_raw_template(name, body).map_err(|e| {
            GeneratorError::Generation(format!("Failed to load {} template: {}", name, e))
        })?;
    }

    Ok(tera)
}

/// Lowercase the first character of an identifier
pub fn lowerfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Filter to lowercase the first letter
fn lowerfirst_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("lowerfirst filter expects a string"))?;

    Ok(Value::String(lowerfirst(s)))
}
