//! Built-in templates compiled into the binary.

/// Default field layouts, in the template file format.
pub static BUILTIN_TEMPLATES: &str = include_str!("../../templates/builtin.json");
