use indexmap::IndexMap;
use log::debug;

use crate::error::Result;
use crate::key::KeyDecoder;
use crate::resolver::VariableTable;

/// An INI document: ordered sections of ordered `field = value` pairs.
///
/// Field names are stored exactly as given; several services insist on a
/// particular letter case (e.g. `HOST` inside `[Database]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedDocument {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl SectionedDocument {
    /// Builds the document from a table already restricted to one prefix.
    /// Every key must have the `PREFIX__SECTION__FIELD` layout.
    pub fn from_table(table: &VariableTable) -> Result<Self> {
        let mut doc = Self::default();
        for (key, value) in table.iter() {
            let decoded = KeyDecoder::decode_sectioned(key)?;
            debug!("{} -> [{}] {}", key, decoded.section, decoded.field);
            doc.set(decoded.section, decoded.field, value);
        }
        Ok(doc)
    }

    /// Sets a value. A repeated field keeps its first position.
    pub fn set(&mut self, section: impl Into<String>, field: impl Into<String>, value: impl Into<String>) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(field.into(), value.into());
    }

    pub fn get(&self, section: &str, field: &str) -> Option<&str> {
        self.sections.get(section)?.get(field).map(String::as_str)
    }

    /// Serializes as INI text. Each section ends with a blank line and
    /// multi-line values continue on tab-indented lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (section, fields) in &self.sections {
            out.push('[');
            out.push_str(section);
            out.push_str("]\n");
            for (field, value) in fields {
                out.push_str(field);
                out.push_str(" = ");
                out.push_str(&value.replace('\n', "\n\t"));
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSnapshot;
    use crate::error::GenerateError;
    use crate::resolver::resolve;

    fn table(pairs: &[(&str, &str)]) -> VariableTable {
        let env = EnvSnapshot::from_pairs(pairs.iter().copied());
        resolve("SEAFEVENTS__", &Default::default(), &env)
    }

    #[test]
    fn test_render_groups_sections() {
        let mut doc = SectionedDocument::default();
        doc.set("Database", "HOST", "db");
        doc.set("General", "enabled", "true");
        doc.set("Database", "PORT", "3306");
        assert_eq!(
            doc.render(),
            "[Database]\nHOST = db\nPORT = 3306\n\n[General]\nenabled = true\n\n"
        );
    }

    #[test]
    fn test_duplicate_field_keeps_first_position() {
        let mut doc = SectionedDocument::default();
        doc.set("s", "a", "1");
        doc.set("s", "b", "2");
        doc.set("s", "a", "3");
        assert_eq!(doc.render(), "[s]\na = 3\nb = 2\n\n");
    }

    #[test]
    fn test_escaped_section_name() {
        let doc = SectionedDocument::from_table(&table(&[(
            "SEAFEVENTS__Index0x20Files__enabled",
            "true",
        )]))
        .unwrap();
        assert!(doc.render().starts_with("[Index Files]\nenabled = true\n"));
        assert_eq!(doc.get("Index Files", "enabled"), Some("true"));
    }

    #[test]
    fn test_case_is_preserved() {
        let doc = SectionedDocument::from_table(&table(&[
            ("SEAFEVENTS__MixedCase__UPPER", "1"),
            ("SEAFEVENTS__MixedCase__lower", "2"),
        ]))
        .unwrap();
        let text = doc.render();
        assert!(text.contains("[MixedCase]\n"));
        assert!(text.contains("UPPER = 1\n"));
        assert!(text.contains("lower = 2\n"));
    }

    #[test]
    fn test_multiline_value() {
        let mut doc = SectionedDocument::default();
        doc.set("s", "k", "one\ntwo");
        assert_eq!(doc.render(), "[s]\nk = one\n\ttwo\n\n");
    }

    #[test]
    fn test_malformed_key() {
        let err = SectionedDocument::from_table(&table(&[("SEAFEVENTS__a__b__c", "x")]))
            .unwrap_err();
        assert!(matches!(err, GenerateError::MalformedKey { .. }));
    }
}
