//! Structured-format steps: CSV, JSON, XML, fixed-length, and paths.

use serde_json_path::JsonPath;

use crate::error::StepError;
use crate::row::{Row, Value};

use super::{StepOutcome, require};

/// Read the column as one CSV record and append `<column>_<i>` pieces.
/// Quoting is honored; `skip_empty` drops empty fields before numbering.
pub(super) fn parse_as_csv(
    mut row: Row,
    column: &str,
    delimiter: char,
    skip_empty: bool,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let pieces = read_csv_record(&text, delimiter).map_err(|message| StepError::Malformed {
        column: column.to_string(),
        message,
    })?;

    let mut i = 0;
    for piece in pieces {
        if skip_empty && piece.is_empty() {
            continue;
        }
        i += 1;
        row.add(format!("{column}_{i}"), Value::String(piece));
    }
    Ok(StepOutcome::Keep(row))
}

/// `set format csv` — parse the starting column (position 0) as CSV and
/// drop it, leaving only the numbered pieces it produced.
pub(super) fn set_format_csv(
    row: Row,
    delimiter: char,
    skip_empty: bool,
) -> Result<StepOutcome, StepError> {
    if row.is_empty() {
        return Err(StepError::WidthMismatch {
            expected: 1,
            found: 0,
        });
    }
    let column = row.name(0).to_string();
    match parse_as_csv(row, &column, delimiter, skip_empty)? {
        StepOutcome::Keep(mut row) => {
            row.remove(0);
            Ok(StepOutcome::Keep(row))
        }
        other => Ok(other),
    }
}

fn read_csv_record(text: &str, delimiter: char) -> Result<Vec<String>, String> {
    let mut delim_buf = [0u8; 4];
    let delim_bytes = delimiter.encode_utf8(&mut delim_buf).as_bytes();
    if delim_bytes.len() != 1 {
        return Err(format!("delimiter '{delimiter}' is not a single byte"));
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim_bytes[0])
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(ToString::to_string).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(e.to_string()),
    }
}

/// Expand one level of a JSON object into `<column>.<key>` columns,
/// preserving value types. A JSON scalar replaces the column value in
/// place; a JSON array becomes an array handle. Re-applying to a
/// generated object-handle column expands one more level.
pub(super) fn parse_as_json(
    mut row: Row,
    column: &str,
    delete_source: bool,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let json = match row.value(pos) {
        Value::String(s) => {
            serde_json::from_str::<serde_json::Value>(s).map_err(|e| StepError::Malformed {
                column: column.to_string(),
                message: e.to_string(),
            })?
        }
        Value::JsonObject(map) => serde_json::Value::Object(map.clone()),
        Value::JsonArray(items) => serde_json::Value::Array(items.clone()),
        other => {
            return Err(StepError::TypeMismatch {
                column: column.to_string(),
                expected: "JSON text or a JSON handle",
                found: other.type_name(),
            });
        }
    };

    match json {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                row.add(format!("{column}.{key}"), Value::from_json(value));
            }
            if delete_source {
                row.remove(pos);
            }
        }
        other => row.set_value(pos, Value::from_json(other)),
    }
    Ok(StepOutcome::Keep(row))
}

/// Parse the column by fixed character widths and append
/// `<column>_<i>` pieces with the padding character trimmed.
pub(super) fn parse_as_fixed_length(
    mut row: Row,
    column: &str,
    widths: &[usize],
    padding: char,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let text = row.value(pos).to_text();
    let mut chars = text.chars();
    for (i, width) in widths.iter().enumerate() {
        let piece: String = chars.by_ref().take(*width).collect();
        let trimmed = piece.trim_matches(padding).to_string();
        row.add(format!("{column}_{}", i + 1), Value::String(trimmed));
    }
    Ok(StepOutcome::Keep(row))
}

/// Validate the column as XML and replace it with a document handle.
pub(super) fn parse_as_xml(mut row: Row, column: &str) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let source = match row.value(pos) {
        Value::Xml(_) => return Ok(StepOutcome::Keep(row)),
        Value::String(s) => s.clone(),
        other => {
            return Err(StepError::TypeMismatch {
                column: column.to_string(),
                expected: "XML text",
                found: other.type_name(),
            });
        }
    };
    roxmltree::Document::parse(&source).map_err(|e| StepError::Malformed {
        column: column.to_string(),
        message: e.to_string(),
    })?;
    row.set_value(pos, Value::Xml(source));
    Ok(StepOutcome::Keep(row))
}

/// Expand one level of the document root's child elements into
/// `<column>.<child>` columns. A child with element children becomes an
/// XML handle over its snippet; a leaf child becomes its text.
pub(super) fn parse_xml_element(
    mut row: Row,
    column: &str,
    delete_source: bool,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, column)?;
    let source = match row.value(pos) {
        Value::Xml(s) | Value::String(s) => s.clone(),
        other => {
            return Err(StepError::TypeMismatch {
                column: column.to_string(),
                expected: "XML text or an XML handle",
                found: other.type_name(),
            });
        }
    };
    let doc = roxmltree::Document::parse(&source).map_err(|e| StepError::Malformed {
        column: column.to_string(),
        message: e.to_string(),
    })?;

    let mut children = Vec::new();
    for child in doc.root_element().children().filter(roxmltree::Node::is_element) {
        let name = child.tag_name().name().to_string();
        let value = if child.children().any(|n| n.is_element()) {
            Value::Xml(source[child.range()].to_string())
        } else {
            child
                .text()
                .map_or(Value::Null, |t| Value::String(t.trim().to_string()))
        };
        children.push((name, value));
    }
    for (name, value) in children {
        row.add(format!("{column}.{name}"), value);
    }
    if delete_source {
        row.remove(pos);
    }
    Ok(StepOutcome::Keep(row))
}

/// Evaluate a JSONPath expression against the source column and write
/// the first match (or null) to `dest`, creating it if absent.
pub(super) fn json_path(
    mut row: Row,
    src: &str,
    dest: &str,
    path: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, src)?;
    let json = match row.value(pos) {
        Value::String(s) => {
            serde_json::from_str::<serde_json::Value>(s).map_err(|e| StepError::Malformed {
                column: src.to_string(),
                message: e.to_string(),
            })?
        }
        handle @ (Value::JsonObject(_) | Value::JsonArray(_) | Value::Map(_) | Value::List(_)) => {
            handle.to_json()
        }
        other => {
            return Err(StepError::TypeMismatch {
                column: src.to_string(),
                expected: "JSON text or a JSON handle",
                found: other.type_name(),
            });
        }
    };

    let compiled = JsonPath::parse(path).map_err(|e| StepError::BadPattern {
        pattern: path.to_string(),
        message: e.to_string(),
    })?;
    let matched = compiled.query(&json).all().into_iter().next().cloned();
    row.set_or_add(dest, matched.map_or(Value::Null, Value::from_json));
    Ok(StepOutcome::Keep(row))
}

/// Evaluate a slash path of element names against an XML column. A
/// trailing `@attr` selects an attribute, `text()` the element text;
/// a bare final element yields its snippet when it has element
/// children, its text otherwise. No match writes null.
pub(super) fn xml_path(
    mut row: Row,
    src: &str,
    dest: &str,
    path: &str,
) -> Result<StepOutcome, StepError> {
    let pos = require(&row, src)?;
    let source = match row.value(pos) {
        Value::Xml(s) | Value::String(s) => s.clone(),
        other => {
            return Err(StepError::TypeMismatch {
                column: src.to_string(),
                expected: "XML text or an XML handle",
                found: other.type_name(),
            });
        }
    };
    let doc = roxmltree::Document::parse(&source).map_err(|e| StepError::Malformed {
        column: src.to_string(),
        message: e.to_string(),
    })?;

    let result = evaluate_xml_path(&doc, &source, path);
    row.set_or_add(dest, result);
    Ok(StepOutcome::Keep(row))
}

fn evaluate_xml_path(doc: &roxmltree::Document<'_>, source: &str, path: &str) -> Value {
    let mut segments = path.trim_start_matches('/').split('/').peekable();
    let mut current = doc.root_element();

    // A leading segment naming the root is consumed, XPath-style.
    if segments.peek() == Some(&current.tag_name().name()) {
        segments.next();
    }

    while let Some(segment) = segments.next() {
        if let Some(attr) = segment.strip_prefix('@') {
            if segments.peek().is_some() {
                return Value::Null; // attribute must be the last segment
            }
            return current
                .attribute(attr)
                .map_or(Value::Null, |v| Value::String(v.to_string()));
        }
        if segment == "text()" {
            if segments.peek().is_some() {
                return Value::Null;
            }
            return current
                .text()
                .map_or(Value::Null, |t| Value::String(t.trim().to_string()));
        }
        match current
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == segment)
        {
            Some(child) => current = child,
            None => return Value::Null,
        }
    }

    if current.children().any(|n| n.is_element()) {
        Value::Xml(source[current.range()].to_string())
    } else {
        current
            .text()
            .map_or(Value::Null, |t| Value::String(t.trim().to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keep(outcome: Result<StepOutcome, StepError>) -> Row {
        match outcome.unwrap() {
            StepOutcome::Keep(row) => row,
            _ => unreachable!(),
        }
    }

    #[test]
    fn csv_pieces_are_numbered() {
        let row = Row::from_pairs([("body", "x,y,z")]);
        let out = keep(parse_as_csv(row, "body", ',', false));
        assert_eq!(
            out.names().collect::<Vec<_>>(),
            vec!["body", "body_1", "body_2", "body_3"]
        );
        assert_eq!(out.value_of("body_2"), Some(&Value::from("y")));
    }

    #[test]
    fn csv_honors_quoting() {
        let row = Row::from_pairs([("body", r#""a,b",c"#)]);
        let out = keep(parse_as_csv(row, "body", ',', false));
        assert_eq!(out.value_of("body_1"), Some(&Value::from("a,b")));
        assert_eq!(out.value_of("body_2"), Some(&Value::from("c")));
    }

    #[test]
    fn csv_skip_empty_renumbers() {
        let row = Row::from_pairs([("body", "a,,b")]);
        let out = keep(parse_as_csv(row, "body", ',', true));
        assert_eq!(out.value_of("body_1"), Some(&Value::from("a")));
        assert_eq!(out.value_of("body_2"), Some(&Value::from("b")));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn set_format_csv_drops_starting_column() {
        let row = Row::from_pairs([("body", "x,y,z")]);
        let out = keep(set_format_csv(row, ',', true));
        assert_eq!(
            out.names().collect::<Vec<_>>(),
            vec!["body_1", "body_2", "body_3"]
        );
    }

    #[test]
    fn json_object_expands_one_level() {
        let row = Row::from_pairs([(
            "body",
            r#"{"id":1,"name":{"first":"R","last":"J"}}"#,
        )]);
        let out = keep(parse_as_json(row, "body", false));
        assert_eq!(out.value_of("body.id"), Some(&Value::Int(1)));
        assert!(matches!(
            out.value_of("body.name"),
            Some(Value::JsonObject(_))
        ));
        assert!(out.value_of("body").is_some());
    }

    #[test]
    fn json_handle_expands_one_more_level() {
        let row = Row::from_pairs([("body", r#"{"name":{"first":"R"}}"#)]);
        let once = keep(parse_as_json(row, "body", false));
        let twice = keep(parse_as_json(once, "body.name", false));
        assert_eq!(
            twice.value_of("body.name.first"),
            Some(&Value::from("R"))
        );
    }

    #[test]
    fn json_delete_source_removes_column() {
        let row = Row::from_pairs([("body", r#"{"id":1}"#)]);
        let out = keep(parse_as_json(row, "body", true));
        assert_eq!(out.value_of("body"), None);
        assert_eq!(out.value_of("body.id"), Some(&Value::Int(1)));
    }

    #[test]
    fn json_on_non_json_is_malformed() {
        let row = Row::from_pairs([("body", "not json")]);
        assert!(matches!(
            parse_as_json(row, "body", false),
            Err(StepError::Malformed { .. })
        ));
    }

    #[test]
    fn fixed_length_trims_padding() {
        let row = Row::from_pairs([("rec", "AA BB CC ")]);
        let out = keep(parse_as_fixed_length(row, "rec", &[3, 3, 3], ' '));
        assert_eq!(out.value_of("rec_1"), Some(&Value::from("AA")));
        assert_eq!(out.value_of("rec_3"), Some(&Value::from("CC")));
    }

    #[test]
    fn json_path_writes_first_match() {
        let row = Row::from_pairs([("body", r#"{"a":{"b":[1,2]}}"#)]);
        let out = keep(json_path(row, "body", "d", "$.a.b[1]"));
        assert_eq!(out.value_of("d"), Some(&Value::Int(2)));
    }

    #[test]
    fn json_path_no_match_writes_null() {
        let row = Row::from_pairs([("body", r#"{"a":1}"#)]);
        let out = keep(json_path(row, "body", "d", "$.missing"));
        assert_eq!(out.value_of("d"), Some(&Value::Null));
    }

    #[test]
    fn xml_element_expands_children() {
        let xml = "<person><name>Ada</name><address><city>X</city></address></person>";
        let row = Row::from_pairs([("body", xml)]);
        let out = keep(parse_xml_element(row, "body", false));
        assert_eq!(out.value_of("body.name"), Some(&Value::from("Ada")));
        assert!(matches!(out.value_of("body.address"), Some(Value::Xml(_))));
    }

    #[test]
    fn xml_path_selects_text_and_attributes() {
        let xml = r#"<doc><item id="7">first</item><other/></doc>"#;
        let row = Row::from_pairs([("body", xml)]);
        let out = keep(xml_path(row, "body", "d", "/doc/item/@id"));
        assert_eq!(out.value_of("d"), Some(&Value::from("7")));

        let row = Row::from_pairs([("body", xml)]);
        let out = keep(xml_path(row, "body", "d", "item/text()"));
        assert_eq!(out.value_of("d"), Some(&Value::from("first")));

        let row = Row::from_pairs([("body", xml)]);
        let out = keep(xml_path(row, "body", "d", "nope"));
        assert_eq!(out.value_of("d"), Some(&Value::Null));
    }

    #[test]
    fn parse_as_xml_stores_handle() {
        let row = Row::from_pairs([("body", "<a><b/></a>")]);
        let out = keep(parse_as_xml(row, "body"));
        assert!(matches!(out.value_of("body"), Some(Value::Xml(_))));

        let row = Row::from_pairs([("body", "<unclosed")]);
        assert!(matches!(
            parse_as_xml(row, "body"),
            Err(StepError::Malformed { .. })
        ));
    }
}
