//! Checks over the external-links section of a docset.

use roxmltree::Document;

use super::{
    Finding, ancestor_attr, children_named, descendants_named, duplicates, node_location,
};
use crate::error::CheckError;

/// Format attributes must be unique within a link's language.
///
/// ```xml
/// <external><link><language>
///   <url href="https://example.com/page1" format="html"/>
///   <url href="https://example.com/page1_again" format="html"/> <!-- Duplicate -->
/// </language></link></external>
/// ```
pub fn duplicated_format_in_extralinks(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for external in descendants_named(doc, "external") {
        for link in children_named(external, "link") {
            for language in children_named(link, "language") {
                let formats: Vec<&str> = children_named(language, "url")
                    .filter_map(|url| url.attribute("format"))
                    .collect();
                let dups = duplicates(formats.iter().copied());
                if !dups.is_empty() {
                    let docset = ancestor_attr(language, "docset", "setid").unwrap_or("n/a");
                    findings.push(Finding::at(
                        format!(
                            "Duplicated format attributes found in \
                             external/link/language/url in docset={docset}: {}",
                            dups.join(", ")
                        ),
                        node_location(doc, language),
                    ));
                }
            }
        }
    }
    Ok(findings)
}

/// `linkid` must be unique within a docset's external section.
pub fn duplicated_linkid(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for docset in descendants_named(doc, "docset") {
        let setid = docset.attribute("setid").unwrap_or("unknown");
        let linkids: Vec<&str> = children_named(docset, "external")
            .flat_map(|external| children_named(external, "link"))
            .filter_map(|link| link.attribute("linkid"))
            .collect();

        let dups = duplicates(linkids.iter().copied());
        if !dups.is_empty() {
            findings.push(Finding::at(
                format!(
                    "Some link elements have non-unique linkid values in docset={setid}: {}",
                    dups.join(", ")
                ),
                node_location(doc, docset),
            ));
        }
    }
    Ok(findings)
}

/// Each URL may appear only once within a given language of the external
/// links section.
pub fn duplicated_url_in_extralinks(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for external in descendants_named(doc, "external") {
        for link in children_named(external, "link") {
            for language in children_named(link, "language") {
                let lang_code = language.attribute("lang").unwrap_or("unknown");
                let urls: Vec<&str> = children_named(language, "url")
                    .filter_map(|url| url.attribute("href"))
                    .collect();

                let dups = duplicates(urls.iter().copied());
                if !dups.is_empty() {
                    let docset = ancestor_attr(language, "docset", "setid").unwrap_or("unknown");
                    findings.push(Finding::at(
                        format!(
                            "Some url elements have non-unique href values in \
                             language={lang_code} for docset={docset}: {}",
                            dups.join(", ")
                        ),
                        node_location(doc, language),
                    ));
                }
            }
        }
    }
    Ok(findings)
}

/// Each language code may appear only once within a link.
pub fn lang_code_in_extralinks(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for external in descendants_named(doc, "external") {
        for link in children_named(external, "link") {
            let langs: Vec<&str> = children_named(link, "language")
                .filter_map(|lng| lng.attribute("lang"))
                .collect();

            let dups = duplicates(langs.iter().copied());
            if !dups.is_empty() {
                let docsetid = ancestor_attr(link, "docset", "setid").unwrap_or("n/a");
                findings.push(Finding::at(
                    format!(
                        "Some language elements within a link have non-unique lang \
                         attributes. In docset={docsetid}, check for duplicate \
                         external/link/language. Found duplicates: {}",
                        dups.join(", ")
                    ),
                    node_location(doc, link),
                ));
            }
        }
    }
    Ok(findings)
}
