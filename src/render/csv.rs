//! CSV output with row/column inference over arbitrary JSON payloads.
//!
//! The shape of a payload is resolved once, up front, into a [`CsvShape`]:
//!
//! 1. a service with a [`NestedListLayout`] whose list field holds a non-empty
//!    array: whitelisted header, one row per record;
//! 2. a single object: its fields as header, one value row;
//! 3. an array of objects: the first element's fields are the schema for every
//!    element; missing fields render empty, extra fields are dropped.
//!
//! Anything else (scalars, empty arrays, arrays of non-objects) is
//! `RenderError::UnsupportedShape`.
//!
//! Cells containing a comma, a double quote, or a newline are wrapped in
//! double quotes with inner quotes doubled. Headers and values are escaped
//! the same way.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::core::RenderError;

use super::NestedListLayout;

const LINE_END: &str = "\n";

/// Row extraction strategy for one payload.
#[derive(Debug)]
pub enum CsvShape<'a> {
    /// Whitelisted columns over a list nested in the root object.
    NestedList {
        /// Header, from the layout.
        columns: &'a [String],
        /// Records, one row each.
        records: &'a [Value],
    },
    /// A single object: one header row, one value row.
    Object(&'a Map<String, Value>),
    /// An array whose first element fixes the columns.
    Array {
        /// Field names of the first element.
        columns: Vec<&'a str>,
        /// Every element, including the first.
        records: &'a [Value],
    },
    /// No rows can be inferred.
    Unsupported(&'static str),
}

impl<'a> CsvShape<'a> {
    /// Resolve the shape of `root` for `service_name`.
    #[must_use]
    pub fn infer(layouts: &'a [NestedListLayout], service_name: &str, root: &'a Value) -> Self {
        if let Some(layout) = layouts.iter().find(|l| l.service == service_name) {
            match root.get(&layout.list_field) {
                Some(Value::Array(records)) if !records.is_empty() => {
                    return Self::NestedList {
                        columns: &layout.columns,
                        records,
                    };
                }
                _ => {
                    tracing::warn!(
                        service = %service_name,
                        field = %layout.list_field,
                        "Payload lacks the expected record list, inferring columns instead"
                    );
                }
            }
        }

        match root {
            Value::Object(map) if map.is_empty() => Self::Unsupported("object has no fields"),
            Value::Object(map) => Self::Object(map),
            Value::Array(records) => match records.first() {
                None => Self::Unsupported("empty array"),
                Some(Value::Object(first)) if !first.is_empty() => Self::Array {
                    columns: first.keys().map(String::as_str).collect(),
                    records,
                },
                Some(Value::Object(_)) => Self::Unsupported("first array element has no fields"),
                Some(_) => Self::Unsupported("array of non-objects"),
            },
            _ => Self::Unsupported("scalar payload"),
        }
    }

    /// Write header and rows into `out`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::UnsupportedShape` for [`CsvShape::Unsupported`].
    pub fn write_rows(&self, out: &mut String) -> Result<(), RenderError> {
        match self {
            Self::NestedList { columns, records } => {
                write_row(out, columns.iter().map(|c| Cow::Borrowed(c.as_str())));
                for record in *records {
                    write_row(out, columns.iter().map(|c| cell(record.get(c.as_str()))));
                }
            }
            Self::Object(map) => {
                write_row(out, map.keys().map(|k| Cow::Borrowed(k.as_str())));
                write_row(out, map.values().map(|v| cell(Some(v))));
            }
            Self::Array { columns, records } => {
                write_row(out, columns.iter().map(|c| Cow::Borrowed(*c)));
                for record in *records {
                    write_row(out, columns.iter().map(|c| cell(record.get(*c))));
                }
            }
            Self::Unsupported(reason) => {
                return Err(RenderError::UnsupportedShape((*reason).to_owned()));
            }
        }
        Ok(())
    }
}

/// Render `payload` as CSV rows.
///
/// # Errors
///
/// - `RenderError::MalformedPayload` if the payload is not JSON
/// - `RenderError::UnsupportedShape` if no rows can be inferred
pub fn render(
    layouts: &[NestedListLayout],
    service_name: &str,
    payload: &str,
) -> Result<Vec<u8>, RenderError> {
    let root: Value = serde_json::from_str(payload)?;
    let mut out = String::new();
    CsvShape::infer(layouts, service_name, &root).write_rows(&mut out)?;
    Ok(out.into_bytes())
}

/// Plain text of a cell: empty for null or missing, compact JSON for
/// containers, the raw value otherwise.
fn cell(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Quote a cell if it contains a comma, a double quote, or a newline.
#[must_use]
pub fn escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

fn write_row<'c>(out: &mut String, cells: impl Iterator<Item = Cow<'c, str>>) {
    for (idx, cell) in cells.enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape(&cell));
    }
    out.push_str(LINE_END);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_str(service: &str, payload: &str) -> Result<String, RenderError> {
        render(&NestedListLayout::defaults(), service, payload)
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(cell(None), "");
        assert_eq!(cell(Some(&Value::Null)), "");
        assert_eq!(cell(Some(&serde_json::json!(true))), "true");
        assert_eq!(cell(Some(&serde_json::json!(1.5))), "1.5");
        assert_eq!(cell(Some(&serde_json::json!("text"))), "text");
        assert_eq!(cell(Some(&serde_json::json!({"k": [1, 2]}))), r#"{"k":[1,2]}"#);
    }

    #[test]
    fn test_single_object() {
        let out = render_str("CatFacts", r#"{"name":"John","age":30}"#).unwrap();
        assert_eq!(out, "name,age\nJohn,30\n");
    }

    #[test]
    fn test_single_object_keeps_field_order() {
        let out = render_str("CatFacts", r#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        assert_eq!(out, "zeta,alpha,mid\n1,2,3\n");
    }

    #[test]
    fn test_nested_values_are_compact_json() {
        let out = render_str(
            "Weather",
            r#"{"location":{"name":"Paris","country":"France"},"tags":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(
            out,
            "location,tags\n\"{\"\"name\"\":\"\"Paris\"\",\"\"country\"\":\"\"France\"\"}\",\"[1,2]\"\n"
        );
    }

    #[test]
    fn test_array_uses_first_element_schema() {
        let out = render_str(
            "Items",
            r#"[{"id":1,"name":"Item 1"},{"name":"Item 2","extra":true},{"id":3}]"#,
        )
        .unwrap();
        assert_eq!(out, "id,name\n1,Item 1\n,Item 2\n3,\n");
    }

    #[test]
    fn test_nytimes_layout() {
        let payload = r#"{
            "status": "OK",
            "results": [
                {"title": "First", "abstract": "A, B", "url": "http://a", "published_date": "2024-01-01", "byline": "By X", "section": "U.S.", "id": 1},
                {"title": "Second", "abstract": "C", "url": "http://b", "published_date": "2024-01-02", "byline": "By Y"}
            ]
        }"#;
        let out = render_str("NYTimes", payload).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "title,abstract,url,published_date,byline,section");
        assert_eq!(lines[1], "First,\"A, B\",http://a,2024-01-01,By X,U.S.");
        assert_eq!(lines[2], "Second,C,http://b,2024-01-02,By Y,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_nytimes_without_results_falls_back() {
        let out = render_str("NYTimes", r#"{"status":"ERROR","fault":"rate limited"}"#).unwrap();
        assert_eq!(out, "status,fault\nERROR,rate limited\n");

        let out = render_str("NYTimes", r#"{"status":"OK","results":"none"}"#).unwrap();
        assert_eq!(out, "status,results\nOK,none\n");

        let out = render_str("NYTimes", r#"[{"a":1}]"#).unwrap();
        assert_eq!(out, "a\n1\n");
    }

    #[test]
    fn test_unsupported_shapes() {
        for payload in ["[]", "42", "\"text\"", "[1,2,3]", "{}", "[{}]", "null"] {
            assert!(
                matches!(render_str("Any", payload), Err(RenderError::UnsupportedShape(_))),
                "payload {payload} should be unsupported"
            );
        }
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            render_str("Any", "{name:Invalid}"),
            Err(RenderError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_shape_selection() {
        let layouts = NestedListLayout::defaults();
        let root = serde_json::json!({"results": [{"title": "t"}]});
        assert!(matches!(
            CsvShape::infer(&layouts, "NYTimes", &root),
            CsvShape::NestedList { .. }
        ));
        assert!(matches!(
            CsvShape::infer(&layouts, "Other", &root),
            CsvShape::Object(_)
        ));
    }
}
