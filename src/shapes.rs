use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single row of a `lumise_shapes` dump: the display name of a shape and
/// its SVG markup. The numeric id and category column of the source tuple
/// are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub name: String,
    pub content: String,
}

impl ShapeRecord {
    /// True when `content` looks like a complete inline SVG document.
    pub fn is_svg(&self) -> bool {
        let content = self.content.trim();
        content.starts_with("<svg") && content.ends_with("</svg>")
    }
}

// Tuple shape: (id,'name','content','category'). None of the quoted fields
// may contain an unescaped single quote; a row that does will not match and
// is dropped rather than recovered.
fn tuple_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((\d+),'([^']+)','([^']+)','[^']+'\)").unwrap())
}

/// Scan `sql` for shape tuples and return one record per match, in source
/// order. Content is kept verbatim, including any backslash escapes the
/// dump carries. Non-matching text is skipped silently.
pub fn extract_shapes(sql: &str) -> Vec<ShapeRecord> {
    tuple_pattern()
        .captures_iter(sql)
        .map(|caps| ShapeRecord {
            name: caps[2].to_string(),
            content: caps[3].to_string(),
        })
        .collect()
}

/// Render records as a pretty-printed JSON array of `{name, content}`
/// objects, the format the designer frontend loads at startup.
pub fn to_json(records: &[ShapeRecord]) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Render records as newline-separated `name|svg` pairs, the shape-asset
/// import format of the designer backend.
pub fn to_pairs(records: &[ShapeRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{}|{}", record.name, record.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_json(records: &[ShapeRecord], path: impl AsRef<Path>) -> Result<(), Error> {
    let json = to_json(records)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn write_pairs(records: &[ShapeRecord], path: impl AsRef<Path>) -> Result<(), Error> {
    let pairs = to_pairs(records);
    let mut file = File::create(path)?;
    file.write_all(pairs.as_bytes())?;
    Ok(())
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "(3,'Arrow 1','<svg>A</svg>','shapes'),(4,'Arrow 2','<svg>B</svg>','shapes')";

    #[test]
    fn test_extracts_records_in_source_order() {
        let shapes = extract_shapes(SAMPLE);
        assert_eq!(shapes.len(), 2);
        assert_eq!(
            shapes[0],
            ShapeRecord {
                name: "Arrow 1".to_string(),
                content: "<svg>A</svg>".to_string(),
            }
        );
        assert_eq!(shapes[1].name, "Arrow 2");
        assert_eq!(shapes[1].content, "<svg>B</svg>");
    }

    #[test]
    fn test_id_and_category_are_discarded() {
        let json = to_json(&extract_shapes(SAMPLE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for entry in value.as_array().unwrap() {
            let object = entry.as_object().unwrap();
            assert_eq!(object.len(), 2);
            assert!(object.contains_key("name"));
            assert!(object.contains_key("content"));
        }
    }

    #[test]
    fn test_surrounding_sql_is_ignored() {
        let sql = format!("INSERT INTO `lumise_shapes` VALUES \n{},\n{};", SAMPLE, SAMPLE);
        assert_eq!(extract_shapes(&sql).len(), 4);
    }

    #[test]
    fn test_no_matches_yields_empty_array() {
        let shapes = extract_shapes("INSERT INTO `lumise_shapes` VALUES ;");
        assert!(shapes.is_empty());
        assert_eq!(to_json(&shapes).unwrap(), "[]");
    }

    #[test]
    fn test_unescaped_quote_in_content_drops_the_tuple() {
        let sql = "(5,'Bad','<svg style='fill:red'/>','shapes'),(6,'Good','<svg/>','shapes')";
        let shapes = extract_shapes(sql);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "Good");
    }

    #[test]
    fn test_empty_fields_do_not_match() {
        assert!(extract_shapes("(7,'','<svg/>','shapes')").is_empty());
        assert!(extract_shapes("(8,'Name','','shapes')").is_empty());
    }

    #[test]
    fn test_content_kept_verbatim() {
        let sql = r#"(9,'Badge','<svg viewBox=\"0 0 10 10\"><rect/></svg>','shapes')"#;
        let shapes = extract_shapes(sql);
        assert_eq!(shapes[0].content, r#"<svg viewBox=\"0 0 10 10\"><rect/></svg>"#);
    }

    #[test]
    fn test_json_is_two_space_indented_and_keeps_non_ascii() {
        let shapes = extract_shapes("(10,'Štít','<svg>Ü</svg>','shapes')");
        let json = to_json(&shapes).unwrap();
        assert!(json.starts_with("[\n  {\n    \"name\": \"Štít\","));
        assert!(json.contains("\n    \"content\": \"<svg>Ü</svg>\"\n  }\n]"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_pairs_format() {
        let pairs = to_pairs(&extract_shapes(SAMPLE));
        assert_eq!(pairs, "Arrow 1|<svg>A</svg>\nArrow 2|<svg>B</svg>");
    }

    #[test]
    fn test_is_svg() {
        let svg = ShapeRecord {
            name: "Arrow".to_string(),
            content: " <svg viewBox=\"0 0 8 8\"><path/></svg> ".to_string(),
        };
        assert!(svg.is_svg());

        let fragment = ShapeRecord {
            name: "Path".to_string(),
            content: "<path d=\"M0 0\"/>".to_string(),
        };
        assert!(!fragment.is_svg());
    }

    #[test]
    fn test_write_json_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shapes.json");

        std::fs::write(&path, "stale").unwrap();
        write_json(&extract_shapes(SAMPLE), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[\n  {"));
        assert_eq!(written, to_json(&extract_shapes(SAMPLE)).unwrap());
    }

    #[test]
    fn test_write_json_empty_input_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shapes.json");

        write_json(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
