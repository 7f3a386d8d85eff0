//! Checks over docset/deliverable structure.

use std::collections::{HashMap, HashSet};

use roxmltree::{Document, Node};

use super::{
    Finding, ancestor_attr, attr_bool, child_text, children_named, descendants_named, duplicates,
    node_location,
};
use crate::error::CheckError;

fn is_default_language(node: Node<'_, '_>) -> bool {
    matches!(node.attribute("default"), Some("1") | Some("true"))
}

/// Each `<dc>` must appear only once within a language.
///
/// ```xml
/// <language lang="en-us" default="1">
///     <deliverable><dc>DC-foo</dc></deliverable>
///     <deliverable><dc>DC-foo</dc></deliverable> <!-- Duplicate -->
/// </language>
/// ```
pub fn dc_in_language(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for language in descendants_named(doc, "language") {
        let dc_values: Vec<&str> = children_named(language, "deliverable")
            .filter_map(|d| child_text(d, "dc"))
            .collect();
        let dups = duplicates(dc_values.iter().copied());
        if !dups.is_empty() {
            let setid = ancestor_attr(language, "docset", "setid").unwrap_or("n/a");
            let langcode = language.attribute("lang").unwrap_or("n/a");
            findings.push(Finding::at(
                format!(
                    "Some dc elements within a language have non-unique values. \
                     Check for occurrences of the following duplicated dc elements \
                     in docset={setid} language={langcode}: {}",
                    dups.join(", ")
                ),
                node_location(doc, language),
            ));
        }
    }
    Ok(findings)
}

/// `categoryid` must be unique within a product.
pub fn duplicated_categoryid(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let categoryids: Vec<&str> = descendants_named(doc, "category")
        .filter_map(|cat| cat.attribute("categoryid"))
        .collect();
    let dups = duplicates(categoryids.iter().copied());
    if dups.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![Finding::new(format!(
            "Some category elements have non-unique categoryid values: {}",
            dups.join(", ")
        ))])
    }
}

/// At least one output format must be enabled per deliverable.
///
/// ```xml
/// <deliverable>
///   <dc>DC-fake-doc</dc>
///   <format epub="0" html="0" pdf="0" single-html="0"/> <!-- all disabled -->
/// </deliverable>
/// ```
pub fn enabled_format(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for deliverable in descendants_named(doc, "deliverable") {
        for fmt in children_named(deliverable, "format") {
            let mut any_enabled = false;
            for attribute in fmt.attributes() {
                if attr_bool(attribute.value())? {
                    any_enabled = true;
                }
            }
            if !any_enabled {
                let setid = ancestor_attr(fmt, "docset", "setid").unwrap_or("n/a");
                let dc = child_text(deliverable, "dc").unwrap_or("n/a");
                findings.push(Finding::at(
                    format!("No enabled format found in docset={setid} for deliverable={dc}"),
                    node_location(doc, fmt),
                ));
            }
        }
    }
    Ok(findings)
}

/// Deliverables that carry subdeliverables may only enable HTML formats.
///
/// ```xml
/// <deliverable>
///    <dc>DC-fake-all</dc>
///    <format epub="0" html="1" pdf="1" single-html="1"/> <!-- pdf enabled -->
///    <subdeliverable>book-one</subdeliverable>
/// </deliverable>
/// ```
pub fn format_subdeliverable(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for deliverable in descendants_named(doc, "deliverable") {
        if children_named(deliverable, "subdeliverable").next().is_none() {
            continue;
        }
        let formats = children_named(deliverable, "format").next();
        let pdf = match formats.and_then(|f| f.attribute("pdf")) {
            Some(value) => attr_bool(value)?,
            None => false,
        };
        let epub = match formats.and_then(|f| f.attribute("epub")) {
            Some(value) => attr_bool(value)?,
            None => false,
        };

        if pdf || epub {
            let setid = ancestor_attr(deliverable, "docset", "setid").unwrap_or("n/a");
            let language = ancestor_attr(deliverable, "language", "lang").unwrap_or("n/a");
            let dc = child_text(deliverable, "dc").unwrap_or("n/a");
            findings.push(Finding::at(
                format!(
                    "A deliverable that has subdeliverables has PDF or EPUB enabled \
                     as a format: docset={setid}/language={language}/deliverable={dc}; \
                     only HTML formats are allowed here"
                ),
                node_location(doc, deliverable),
            ));
        }
    }
    Ok(findings)
}

/// Subdeliverables must be unique within their deliverable.
pub fn subdeliverable_in_deliverable(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for deliverable in descendants_named(doc, "deliverable") {
        let subdelis: Vec<&str> = children_named(deliverable, "subdeliverable")
            .filter_map(|node| node.text())
            .collect();
        let dups = duplicates(subdelis.iter().copied());
        if !dups.is_empty() {
            let setid = ancestor_attr(deliverable, "docset", "setid").unwrap_or("n/a");
            let language = ancestor_attr(deliverable, "language", "lang").unwrap_or("n/a");
            findings.push(Finding::at(
                format!(
                    "Some subdeliverable elements within a deliverable have non-unique \
                     values. In docset={setid}/language={language}, found duplicates: {}",
                    dups.join(", ")
                ),
                node_location(doc, deliverable),
            ));
        }
    }
    Ok(findings)
}

/// Translated deliverables must be a subset of the default language's.
///
/// A subdeliverable configured for a translation language but absent from
/// the same deliverable in the default language means the translation would
/// build documents the default never ships.
pub fn translation_deliverables(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for docset in descendants_named(doc, "docset") {
        let setid = docset.attribute("setid").unwrap_or("n/a");
        for builddocs in children_named(docset, "builddocs") {
            let languages: Vec<Node> = children_named(builddocs, "language").collect();

            let mut default_subdelis: HashMap<&str, HashSet<&str>> = HashMap::new();
            for language in languages.iter().filter(|l| is_default_language(**l)) {
                for deliverable in children_named(*language, "deliverable") {
                    if let Some(dc) = child_text(deliverable, "dc") {
                        let entry = default_subdelis.entry(dc).or_default();
                        for sub in children_named(deliverable, "subdeliverable") {
                            if let Some(text) = sub.text() {
                                entry.insert(text);
                            }
                        }
                    }
                }
            }

            for language in languages.iter().filter(|l| !is_default_language(**l)) {
                let lang = language.attribute("lang").unwrap_or("n/a");
                for deliverable in children_named(*language, "deliverable") {
                    let Some(dc) = child_text(deliverable, "dc") else {
                        continue;
                    };
                    for sub in children_named(deliverable, "subdeliverable") {
                        let Some(text) = sub.text() else { continue };
                        let known = default_subdelis
                            .get(dc)
                            .is_some_and(|subs| subs.contains(text));
                        if !known {
                            findings.push(Finding::at(
                                format!(
                                    "The subdeliverable {text:?} is configured for \
                                     docset={setid}/language={lang}/deliverable={dc} but not \
                                     for same deliverable of the default language. Documents \
                                     configured for translation languages must be a subset of \
                                     the documents configured for the default language."
                                ),
                                node_location(doc, sub),
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(findings)
}
