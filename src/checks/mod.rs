//! Structural checks against the parsed document tree.
//!
//! Checks are independent of grammar validation: they express rules a
//! RELAX NG schema cannot (uniqueness across siblings, cross-language
//! consistency). Each check is a named predicate over the parsed tree; the
//! registry fixes the set and order of checks before a run starts and the
//! runner guarantees that one broken check never hides the outcome of the
//! others.

mod docset;
mod languages;
mod links;

use roxmltree::{Document, Node};
use tracing::trace;

use crate::error::{CheckError, ConfigError};
use crate::report::{CheckResult, Location};

pub use languages::ALLOWED_LANGUAGES;

/// One message produced by a check, optionally anchored to a source
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub message: String,
    pub location: Option<Location>,
}

impl Finding {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location: Some(location),
        }
    }
}

/// A check predicate: zero findings means the check passes. An `Err` (or a
/// panic) marks the check itself as broken, not the document.
pub type CheckFn = fn(&Document<'_>) -> Result<Vec<Finding>, CheckError>;

/// A named check. Names are unique within a registry.
#[derive(Clone)]
pub struct CheckDefinition {
    pub name: &'static str,
    pub func: CheckFn,
}

/// Ordered, read-only collection of checks.
///
/// All registration happens before a validation run starts; during the run
/// the registry is shared immutably across tasks, so no locking is needed.
pub struct CheckRegistry {
    checks: Vec<CheckDefinition>,
}

impl CheckRegistry {
    /// An empty registry; mostly useful in tests.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// The full built-in check set, in registration order.
    pub fn builtin() -> Self {
        Self {
            checks: vec![
                CheckDefinition {
                    name: "dc_in_language",
                    func: docset::dc_in_language,
                },
                CheckDefinition {
                    name: "duplicated_categoryid",
                    func: docset::duplicated_categoryid,
                },
                CheckDefinition {
                    name: "duplicated_format_in_extralinks",
                    func: links::duplicated_format_in_extralinks,
                },
                CheckDefinition {
                    name: "duplicated_linkid",
                    func: links::duplicated_linkid,
                },
                CheckDefinition {
                    name: "duplicated_url_in_extralinks",
                    func: links::duplicated_url_in_extralinks,
                },
                CheckDefinition {
                    name: "enabled_format",
                    func: docset::enabled_format,
                },
                CheckDefinition {
                    name: "format_subdeliverable",
                    func: docset::format_subdeliverable,
                },
                CheckDefinition {
                    name: "lang_code_in_category",
                    func: languages::lang_code_in_category,
                },
                CheckDefinition {
                    name: "lang_code_in_desc",
                    func: languages::lang_code_in_desc,
                },
                CheckDefinition {
                    name: "lang_code_in_docset",
                    func: languages::lang_code_in_docset,
                },
                CheckDefinition {
                    name: "lang_code_in_extralinks",
                    func: links::lang_code_in_extralinks,
                },
                CheckDefinition {
                    name: "lang_code_in_overridedesc",
                    func: languages::lang_code_in_overridedesc,
                },
                CheckDefinition {
                    name: "subdeliverable_in_deliverable",
                    func: docset::subdeliverable_in_deliverable,
                },
                CheckDefinition {
                    name: "translation_deliverables",
                    func: docset::translation_deliverables,
                },
                CheckDefinition {
                    name: "valid_languages",
                    func: languages::valid_languages,
                },
            ],
        }
    }

    /// Register an additional check. Duplicate names are rejected so that a
    /// result list can always be attributed unambiguously.
    pub fn register(&mut self, name: &'static str, func: CheckFn) -> Result<(), ConfigError> {
        if self.checks.iter().any(|c| c.name == name) {
            return Err(ConfigError::DuplicateCheck {
                name: name.to_string(),
            });
        }
        self.checks.push(CheckDefinition { name, func });
        Ok(())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every registered check against one parsed tree, in registration
    /// order.
    ///
    /// Failure isolation is a hard requirement here: a predicate that
    /// returns an error or panics becomes an `error`-status result for that
    /// check alone and never aborts the remaining checks.
    pub fn run_all(&self, doc: &Document<'_>) -> Vec<CheckResult> {
        self.checks
            .iter()
            .map(|def| {
                trace!(check = def.name, "running check");
                let outcome =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (def.func)(doc)));
                match outcome {
                    Ok(Ok(findings)) if findings.is_empty() => CheckResult::pass(def.name),
                    Ok(Ok(findings)) => {
                        let location = findings[0].location;
                        let message = findings
                            .iter()
                            .map(|f| f.message.as_str())
                            .collect::<Vec<_>>()
                            .join("; ");
                        let mut result = CheckResult::fail(def.name, message);
                        result.location = location;
                        result
                    }
                    Ok(Err(e)) => CheckResult::error(def.name, e.to_string()),
                    Err(payload) => CheckResult::error(def.name, panic_message(payload)),
                }
            })
            .collect()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}

// Shared traversal helpers for the built-in checks.

pub(crate) fn node_location(doc: &Document<'_>, node: Node<'_, '_>) -> Location {
    let pos = doc.text_pos_at(node.range().start);
    Location {
        line: pos.row,
        column: pos.col,
    }
}

pub(crate) fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(name))
}

pub(crate) fn descendants_named<'a, 'input>(
    doc: &'a Document<'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants().filter(move |n| n.has_tag_name(name))
}

pub(crate) fn child_text<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
}

/// Attribute of the nearest ancestor (or the node itself) with the given
/// tag name.
pub(crate) fn ancestor_attr<'a>(node: Node<'a, '_>, tag: &str, attr: &str) -> Option<&'a str> {
    node.ancestors()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.attribute(attr))
}

/// Values that occur more than once, in first-occurrence order.
pub(crate) fn duplicates<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for value in values {
        if !counts.contains_key(value) {
            order.push(value);
        }
        *counts.entry(value).or_insert(0) += 1;
    }
    order
        .into_iter()
        .filter(|v| counts[v] > 1)
        .map(|v| v.to_string())
        .collect()
}

/// Interpret a format-toggle attribute value as a boolean.
///
/// Accepts yes/true/1/on and no/false/0/off (case-insensitive); anything
/// else is a check-level error.
pub(crate) fn attr_bool(value: &str) -> Result<bool, CheckError> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Ok(true),
        "no" | "false" | "0" | "off" => Ok(false),
        _ => Err(CheckError::InvalidBool {
            value: value.to_string(),
        }),
    }
}
