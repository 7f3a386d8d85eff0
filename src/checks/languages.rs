//! Language-code checks.

use roxmltree::Document;

use super::{Finding, children_named, descendants_named, duplicates, node_location};
use crate::error::CheckError;

/// All language codes supported by the documentation portal.
pub const ALLOWED_LANGUAGES: &[&str] = &[
    "de-de", "en-us", "es-es", "fr-fr", "ja-jp", "ko-kr", "pt-br", "zh-cn",
];

/// Each language code may appear only once within a `<category>`.
pub fn lang_code_in_category(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for category in descendants_named(doc, "category") {
        let langs: Vec<&str> = children_named(category, "language")
            .filter_map(|lng| lng.attribute("lang"))
            .collect();

        let dups = duplicates(langs.iter().copied());
        if !dups.is_empty() {
            let catid = category.attribute("categoryid").unwrap_or("n/a");
            findings.push(Finding::at(
                format!(
                    "Some of the name translation of category {catid:?} have \
                     non-unique lang attributes. Found duplicates: {}",
                    dups.join(", ")
                ),
                node_location(doc, category),
            ));
        }
    }
    Ok(findings)
}

/// Each language code may appear only once among a product's `<desc>`
/// elements.
pub fn lang_code_in_desc(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let langs: Vec<&str> = children_named(doc.root_element(), "desc")
        .filter_map(|desc| desc.attribute("lang"))
        .collect();

    let dups = duplicates(langs.iter().copied());
    if dups.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![Finding::new(format!(
            "Some <desc> elements have non-unique lang attributes. Found duplicates: {}",
            dups.join(", ")
        ))])
    }
}

/// Each language code may appear only once within a docset's builddocs.
pub fn lang_code_in_docset(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for docset in descendants_named(doc, "docset") {
        let langs: Vec<&str> = children_named(docset, "builddocs")
            .flat_map(|builddocs| children_named(builddocs, "language"))
            .filter_map(|lng| lng.attribute("lang"))
            .collect();

        let dups = duplicates(langs.iter().copied());
        if !dups.is_empty() {
            let setid = docset.attribute("setid").unwrap_or("n/a");
            findings.push(Finding::at(
                format!(
                    "Some language elements within a set have non-unique lang \
                     attributes. In docset={setid}, check for duplicate \
                     builddocs/language. Found duplicates: {}",
                    dups.join(", ")
                ),
                node_location(doc, docset),
            ));
        }
    }
    Ok(findings)
}

/// Each language code may appear only once within an `<overridedesc>`.
pub fn lang_code_in_overridedesc(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for docset in descendants_named(doc, "docset") {
        for node in children_named(docset, "overridedesc") {
            let langs: Vec<&str> = children_named(node, "desc")
                .filter_map(|desc| desc.attribute("lang"))
                .collect();

            let dups = duplicates(langs.iter().copied());
            if !dups.is_empty() {
                findings.push(Finding::at(
                    format!(
                        "Some language elements within overridedesc have non-unique \
                         lang attributes. Found duplicates: {}",
                        dups.join(", ")
                    ),
                    node_location(doc, node),
                ));
            }
        }
    }
    Ok(findings)
}

/// Every `lang` attribute anywhere in the document must carry an allowed
/// language code.
pub fn valid_languages(doc: &Document<'_>) -> Result<Vec<Finding>, CheckError> {
    let mut findings = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        let Some(lang) = node.attribute("lang") else {
            continue;
        };
        if !ALLOWED_LANGUAGES.contains(&lang) {
            let setid = node
                .ancestors()
                .find(|n| n.has_tag_name("docset"))
                .and_then(|n| n.attribute("setid"))
                .unwrap_or("n/a");
            findings.push(Finding::at(
                format!(
                    "In docset={setid}, invalid language code found: {lang}. \
                     Valid codes are: {}",
                    ALLOWED_LANGUAGES.join(", ")
                ),
                node_location(doc, node),
            ));
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Document<'_> {
        Document::parse(xml).unwrap()
    }

    #[test]
    fn test_lang_code_in_category_flags_repeats() {
        let doc = parse(
            r#"<product><category categoryid="container">
              <language lang="en-us" title="Container"/>
              <language lang="en-us" title="Container again"/>
            </category></product>"#,
        );

        let findings = lang_code_in_category(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("container"));
        assert!(findings[0].message.contains("en-us"));
    }

    #[test]
    fn test_lang_code_in_desc_flags_repeats() {
        let doc = parse(
            r#"<product>
              <desc lang="en-us">First</desc>
              <desc lang="en-us">Second</desc>
              <desc lang="de-de">Erste</desc>
            </product>"#,
        );

        let findings = lang_code_in_desc(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("en-us"));
        assert!(!findings[0].message.contains("de-de"));
    }

    #[test]
    fn test_lang_code_in_docset_flags_repeats() {
        let doc = parse(
            r#"<product><docset setid="15sp6" lifecycle="supported"><builddocs>
              <git remote="https://example.com/repo.git"/>
              <language lang="en-us" default="1"/>
              <language lang="en-us" default="1"/>
            </builddocs></docset></product>"#,
        );

        let findings = lang_code_in_docset(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("docset=15sp6"));
    }

    #[test]
    fn test_lang_code_in_overridedesc_flags_repeats() {
        let doc = parse(
            r#"<product><docset setid="s"><overridedesc>
              <desc lang="en-us">One</desc>
              <desc lang="en-us">Two</desc>
            </overridedesc></docset></product>"#,
        );

        let findings = lang_code_in_overridedesc(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("overridedesc"));
    }

    #[test]
    fn test_valid_languages_accepts_known_codes() {
        let doc = parse(
            r#"<product>
              <desc lang="en-us">ok</desc>
              <desc lang="zh-cn">ok</desc>
            </product>"#,
        );
        assert!(valid_languages(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_valid_languages_flags_unknown_code() {
        let doc = parse(
            r#"<product><docset setid="s1"><builddocs>
              <language lang="en-us" default="1"/>
              <language lang="klingon"/>
            </builddocs></docset></product>"#,
        );

        let findings = valid_languages(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("klingon"));
        assert!(findings[0].message.contains("docset=s1"));
        assert!(findings[0].message.contains("en-us"));
        assert!(findings[0].location.is_some());
    }
}
