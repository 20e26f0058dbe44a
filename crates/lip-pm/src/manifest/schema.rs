//! Structural validation of manifest documents
//!
//! Each format version is described by a tree of [`Shape`]s. Validation walks
//! the JSON document against it and collects every violation instead of
//! stopping at the first one.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Format version written by this crate
pub const CURRENT_FORMAT_VERSION: i64 = 2;

/// Format version of legacy manifests
pub const LEGACY_FORMAT_VERSION: i64 = 1;

/// A single schema violation, located by a JSON path such as `$.files.place[0].src`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Expected shape of a JSON value
pub(crate) enum Shape {
    String,
    /// String accepted by a predicate, with a description for messages
    Pattern(fn(&str) -> bool, &'static str),
    Integer(i64),
    OneOf(&'static [&'static str]),
    Array {
        items: &'static Shape,
        min_items: usize,
    },
    Object {
        fields: &'static [Field],
        deny_unknown: bool,
    },
    /// Object with arbitrary keys whose values share one shape
    Map(&'static Shape),
    /// Any object, contents unchecked
    AnyObject,
}

pub(crate) struct Field {
    name: &'static str,
    required: bool,
    shape: Shape,
}

macro_rules! field {
    ($name:literal, required, $shape:expr $(,)?) => {
        Field {
            name: $name,
            required: true,
            shape: $shape,
        }
    };
    ($name:literal, $shape:expr $(,)?) => {
        Field {
            name: $name,
            required: false,
            shape: $shape,
        }
    };
}

const STRING_LIST: Shape = Shape::Array {
    items: &Shape::String,
    min_items: 0,
};

const COMMANDS: Shape = Shape::Object {
    fields: &[
        field!("pre_install", STRING_LIST),
        field!("post_install", STRING_LIST),
        field!("pre_uninstall", STRING_LIST),
        field!("post_uninstall", STRING_LIST),
    ],
    deny_unknown: true,
};

const DEPENDENCIES: Shape = Shape::Map(&Shape::String);

const FILES: Shape = Shape::Object {
    fields: &[
        field!(
            "place",
            Shape::Array {
                items: &Shape::Object {
                    fields: &[
                        field!("src", required, Shape::String),
                        field!("dest", required, Shape::String),
                    ],
                    deny_unknown: true,
                },
                min_items: 0,
            },
        ),
        field!("preserve", STRING_LIST),
    ],
    deny_unknown: true,
};

/// Current (format 2) manifest
pub(crate) const CURRENT: Shape = Shape::Object {
    fields: &[
        field!("format_version", required, Shape::Integer(CURRENT_FORMAT_VERSION)),
        field!(
            "tooth",
            required,
            Shape::Pattern(is_tooth_path_shaped, "a tooth repository path"),
        ),
        field!(
            "version",
            required,
            Shape::Pattern(is_version_shaped, "a semantic version"),
        ),
        field!(
            "info",
            Shape::Object {
                fields: &[
                    field!("name", Shape::String),
                    field!("description", Shape::String),
                    field!("author", Shape::String),
                ],
                deny_unknown: true,
            },
        ),
        field!("commands", COMMANDS),
        field!("dependencies", DEPENDENCIES),
        field!("files", FILES),
        field!(
            "platforms",
            Shape::Array {
                items: &Shape::Object {
                    fields: &[
                        field!("goos", required, Shape::String),
                        field!("goarch", Shape::String),
                        field!("commands", COMMANDS),
                        field!("dependencies", DEPENDENCIES),
                        field!("files", FILES),
                    ],
                    deny_unknown: true,
                },
                min_items: 0,
            },
        ),
    ],
    deny_unknown: true,
};

/// Legacy (format 1) manifest
pub(crate) const LEGACY: Shape = Shape::Object {
    fields: &[
        field!("format_version", required, Shape::Integer(LEGACY_FORMAT_VERSION)),
        field!("tooth", required, Shape::String),
        field!("version", required, Shape::String),
        field!(
            "dependencies",
            Shape::Map(&Shape::Array {
                items: &Shape::Array {
                    items: &Shape::String,
                    min_items: 0,
                },
                min_items: 1,
            }),
        ),
        field!("information", Shape::AnyObject),
        field!(
            "placement",
            Shape::Array {
                items: &Shape::Object {
                    fields: &[
                        field!("source", required, Shape::String),
                        field!("destination", required, Shape::String),
                        field!("GOOS", Shape::String),
                        field!("GOARCH", Shape::String),
                    ],
                    deny_unknown: false,
                },
                min_items: 0,
            },
        ),
        field!("possession", STRING_LIST),
        field!(
            "commands",
            Shape::Array {
                items: &Shape::Object {
                    fields: &[
                        field!("type", required, Shape::OneOf(&["install", "uninstall"])),
                        field!("commands", required, STRING_LIST),
                        field!("GOOS", required, Shape::String),
                        field!("GOARCH", Shape::String),
                    ],
                    deny_unknown: false,
                },
                min_items: 0,
            },
        ),
    ],
    deny_unknown: false,
};

/// Validate `value` against `shape`, returning every violation found
pub(crate) fn validate(value: &Value, shape: &Shape) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    check(value, shape, "$", &mut violations);
    violations
}

/// Read the declared format version of a document, if any
pub(crate) fn declared_format_version(value: &Value) -> Option<i64> {
    value.get("format_version").and_then(as_integer)
}

/// Read a JSON number with no fractional part, so `2` and `2.0` agree
fn as_integer(value: &Value) -> Option<i64> {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= EXACT_LIMIT)
            .map(|f| f as i64)
    })
}

/// Serde adapter for integer fields that may be written as `2.0`
pub(crate) fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    as_integer(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected an integer, found {}", value))
    })
}

fn check(value: &Value, shape: &Shape, path: &str, out: &mut Vec<SchemaViolation>) {
    match shape {
        Shape::String => {
            if !value.is_string() {
                push(out, path, expected("a string", value));
            }
        }
        Shape::Pattern(accepts, description) => match value.as_str() {
            Some(s) if accepts(s) => {}
            Some(s) => push(out, path, format!("'{}' is not {}", s, description)),
            None => push(out, path, expected("a string", value)),
        },
        Shape::Integer(want) => {
            if as_integer(value) != Some(*want) {
                push(out, path, format!("must be {}, found {}", want, value));
            }
        }
        Shape::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => {}
            _ => push(out, path, format!("must be one of {:?}, found {}", allowed, value)),
        },
        Shape::Array { items, min_items } => match value.as_array() {
            Some(elements) => {
                if elements.len() < *min_items {
                    push(out, path, format!("expected at least {} item(s)", min_items));
                }
                for (i, element) in elements.iter().enumerate() {
                    check(element, items, &format!("{}[{}]", path, i), out);
                }
            }
            None => push(out, path, expected("an array", value)),
        },
        Shape::Object {
            fields,
            deny_unknown,
        } => match value.as_object() {
            Some(map) => {
                for field in fields.iter() {
                    let field_path = format!("{}.{}", path, field.name);
                    match map.get(field.name) {
                        Some(v) => check(v, &field.shape, &field_path, out),
                        None if field.required => {
                            push(out, &field_path, "is required".to_string())
                        }
                        None => {}
                    }
                }
                if *deny_unknown {
                    for key in map.keys() {
                        if !fields.iter().any(|f| f.name == key.as_str()) {
                            let key_path = format!("{}.{}", path, key);
                            push(out, &key_path, "unknown property".to_string());
                        }
                    }
                }
            }
            None => push(out, path, expected("an object", value)),
        },
        Shape::Map(values) => match value.as_object() {
            Some(map) => {
                for (key, v) in map {
                    check(v, values, &format!("{}.{}", path, key), out);
                }
            }
            None => push(out, path, expected("an object", value)),
        },
        Shape::AnyObject => {
            if !value.is_object() {
                push(out, path, expected("an object", value));
            }
        }
    }
}

fn push(out: &mut Vec<SchemaViolation>, path: &str, message: String) {
    out.push(SchemaViolation {
        path: path.to_string(),
        message,
    });
}

fn expected(what: &str, value: &Value) -> String {
    format!("expected {}, found {}", what, type_name(value))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_tooth_path_shaped(s: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\-_./]*$").expect("valid regex"))
        .is_match(s)
}

fn is_version_shaped(s: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.\-]+)?(\+[0-9A-Za-z.\-]+)?$")
                .expect("valid regex")
        })
        .is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(violations: &[SchemaViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn test_minimal_current_document() {
        let doc = json!({
            "format_version": 2,
            "tooth": "github.com/tooth-hub/llbds3",
            "version": "1.0.0"
        });
        assert!(validate(&doc, &CURRENT).is_empty());
    }

    #[test]
    fn test_integral_float_format_version() {
        let doc = json!({
            "format_version": 2.0,
            "tooth": "github.com/tooth-hub/llbds3",
            "version": "1.0.0"
        });
        assert!(validate(&doc, &CURRENT).is_empty());
        assert_eq!(declared_format_version(&doc), Some(2));

        let fractional = json!({ "format_version": 2.5 });
        assert_eq!(declared_format_version(&fractional), None);
        assert!(paths(&validate(&fractional, &CURRENT)).contains(&"$.format_version"));
    }

    #[test]
    fn test_collects_all_violations() {
        let doc = json!({
            "format_version": 1,
            "version": "one",
            "files": { "place": [{ "src": 3 }] },
            "extra": true
        });
        let violations = validate(&doc, &CURRENT);
        let found = paths(&violations);
        assert!(found.contains(&"$.format_version"));
        assert!(found.contains(&"$.tooth"));
        assert!(found.contains(&"$.version"));
        assert!(found.contains(&"$.files.place[0].src"));
        assert!(found.contains(&"$.files.place[0].dest"));
        assert!(found.contains(&"$.extra"));
    }

    #[test]
    fn test_platform_blocks_checked() {
        let doc = json!({
            "format_version": 2,
            "tooth": "example.com/t",
            "version": "1.0.0",
            "platforms": [{ "goarch": "amd64", "dependencies": { "a.com/b": 5 } }]
        });
        let violations = validate(&doc, &CURRENT);
        assert_eq!(
            paths(&violations),
            vec!["$.platforms[0].goos", "$.platforms[0].dependencies.a.com/b"]
        );
    }

    #[test]
    fn test_legacy_document() {
        let doc = json!({
            "format_version": 1,
            "tooth": "example.com/t",
            "version": "1.0.0",
            "dependencies": { "example.com/dep": [[">=1.0.0"]] },
            "information": { "anything": ["goes"] },
            "commands": [{ "type": "install", "commands": ["echo"], "GOOS": "linux" }]
        });
        assert!(validate(&doc, &LEGACY).is_empty());

        let bad = json!({
            "format_version": 1,
            "tooth": "example.com/t",
            "version": "1.0.0",
            "dependencies": { "example.com/dep": [] },
            "commands": [{ "type": "build", "commands": [] }]
        });
        let violations = validate(&bad, &LEGACY);
        assert_eq!(
            paths(&violations),
            vec![
                "$.dependencies.example.com/dep",
                "$.commands[0].type",
                "$.commands[0].GOOS"
            ]
        );
    }

    #[test]
    fn test_shape_patterns() {
        assert!(is_version_shaped("1.2.3-beta.1+build"));
        assert!(!is_version_shaped("1.2"));
        assert!(is_tooth_path_shaped("GitHub.com/Tooth"));
        assert!(!is_tooth_path_shaped("/abs"));
        assert!(!is_tooth_path_shaped(""));
    }
}
