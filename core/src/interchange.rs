//! Newline-delimited dump format.
//!
//! A dump is one header line carrying the index detail, followed by record pairs: a bulk
//! action line naming index, type and id, then the document source as compact JSON. The
//! record pairs are exactly what the store's bulk endpoint ingests.

use crate::error::Result;
use crate::index::{Detail, Hit};
use serde::Serialize;
use std::io::Write;

const HEADER_KEY: &str = "detail";

#[derive(Serialize)]
struct Action<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type")]
    doc_type: &'a str,
    #[serde(rename = "_id")]
    id: &'a str,
}

#[derive(Serialize)]
struct Header<'a> {
    detail: &'a serde_json::Value,
}

pub fn write_header<W: Write>(out: &mut W, detail: &Detail) -> Result<()> {
    serde_json::to_writer(&mut *out, &Header { detail: &detail.0 })?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Writes one record pair for `hit`.
pub fn write_record<W: Write>(out: &mut W, hit: &Hit) -> Result<()> {
    let action = Action {
        index: ActionMeta { index: &hit.index, doc_type: hit.doc_type(), id: &hit.id },
    };
    serde_json::to_writer(&mut *out, &action)?;
    out.write_all(b"\n")?;
    serde_json::to_writer(&mut *out, &hit.source)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Renders a page of hits as a bulk request body.
pub fn bulk_body(hits: &[Hit]) -> Result<String> {
    let mut buf = Vec::with_capacity(hits.len() * 256);
    for hit in hits {
        write_record(&mut buf, hit)?;
    }
    String::from_utf8(buf).map_err(|e| crate::Error::Decode(e.to_string()))
}

/// Recognises a header line. Record action lines never carry the header key, so a match is
/// unambiguous.
pub fn parse_header(line: &str) -> Option<Detail> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get(HEADER_KEY).map(|d| Detail(d.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, doc_type: Option<&str>) -> Hit {
        Hit {
            index: "books".into(),
            doc_type: doc_type.map(str::to_string),
            id: id.into(),
            source: serde_json::json!({ "title": "Dune", "year": 1965 }),
        }
    }

    #[test]
    fn record_pair_is_bit_exact() {
        let mut out = Vec::new();
        write_record(&mut out, &hit("42", Some("book"))).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"index\":{\"_index\":\"books\",\"_type\":\"book\",\"_id\":\"42\"}}\n{\"title\":\"Dune\",\"year\":1965}\n"
        );
    }

    #[test]
    fn missing_type_is_written_as_default() {
        let body = bulk_body(&[hit("1", None)]).unwrap();
        assert!(body.starts_with("{\"index\":{\"_index\":\"books\",\"_type\":\"_doc\",\"_id\":\"1\"}}\n"));
    }

    #[test]
    fn header_round_trips_and_actions_are_not_headers() {
        let detail = Detail(serde_json::json!({ "books": { "mappings": {} } }));
        let mut out = Vec::new();
        write_header(&mut out, &detail).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert_eq!(parse_header(line.trim_end()), Some(detail));

        assert!(parse_header(r#"{"index":{"_index":"books","_type":"_doc","_id":"1"}}"#).is_none());
        assert!(parse_header(r#"{"detail":1,"other":2}"#).is_none());
        assert!(parse_header("not json").is_none());
    }
}
