//! Content negotiation.
//!
//! The format is resolved before any byte is written: it fixes the
//! content-type header, which cannot change once the status line is out.

/// Wire representation chosen from the request's Accept preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    Json,
    JsonLines,
    Ndjson,
}

impl Format {
    /// Case-insensitive substring match over the Accept value, in
    /// precedence order: `jsonl`, `ndjson`, `json`. Anything else, or no
    /// Accept at all, selects plain text.
    pub fn negotiate(accept: Option<&str>) -> Format {
        let Some(accept) = accept else {
            return Format::Plain;
        };
        let accept = accept.to_ascii_lowercase();
        if accept.contains("jsonl") {
            Format::JsonLines
        } else if accept.contains("ndjson") {
            Format::Ndjson
        } else if accept.contains("json") {
            Format::Json
        } else {
            Format::Plain
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Plain => "text/plain; charset=utf-8",
            Format::Json => "application/json; charset=utf-8",
            Format::JsonLines => "application/jsonl; charset=utf-8",
            Format::Ndjson => "application/x-ndjson; charset=utf-8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_accept_selects_plain() {
        assert_eq!(Format::negotiate(None), Format::Plain);
        assert_eq!(Format::negotiate(Some("text/html")), Format::Plain);
        assert_eq!(Format::negotiate(Some("*/*")), Format::Plain);
    }

    #[test]
    fn json_markers_select_formats() {
        assert_eq!(Format::negotiate(Some("application/json")), Format::Json);
        assert_eq!(
            Format::negotiate(Some("application/jsonl")),
            Format::JsonLines
        );
        assert_eq!(
            Format::negotiate(Some("application/x-ndjson")),
            Format::Ndjson
        );
    }

    #[test]
    fn precedence_is_jsonl_then_ndjson_then_json() {
        assert_eq!(
            Format::negotiate(Some("application/jsonl, application/json")),
            Format::JsonLines
        );
        assert_eq!(
            Format::negotiate(Some("application/x-ndjson, application/json")),
            Format::Ndjson
        );
        assert_eq!(
            Format::negotiate(Some("application/jsonl, application/x-ndjson")),
            Format::JsonLines
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(Format::negotiate(Some("Application/JSON")), Format::Json);
        assert_eq!(Format::negotiate(Some("APPLICATION/JSONL")), Format::JsonLines);
    }

    #[test]
    fn content_types_carry_charset() {
        assert_eq!(Format::Plain.content_type(), "text/plain; charset=utf-8");
        assert_eq!(
            Format::Json.content_type(),
            "application/json; charset=utf-8"
        );
        assert_eq!(
            Format::JsonLines.content_type(),
            "application/jsonl; charset=utf-8"
        );
        assert_eq!(
            Format::Ndjson.content_type(),
            "application/x-ndjson; charset=utf-8"
        );
    }
}
