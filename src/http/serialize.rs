//! Response serialization.
//!
//! # Responsibilities
//! - Serialize whole values under the negotiated format (tab-indented for
//!   plain text, compact for the JSON family)
//! - Encode streamed sequences incrementally, one element in memory at a
//!   time, awaiting the writer between elements
//! - Write structured errors, suppressing the status line when headers
//!   are already out

use bytes::Bytes;
use futures_util::StreamExt;
use http::StatusCode;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use thiserror::Error;

use crate::http::error::HttpError;
use crate::http::negotiate::Format;
use crate::http::reply::{Reply, ValueStream};
use crate::http::writer::{ResponseWriter, WriteError};

/// Error type for serialization.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write a successful handler outcome.
pub async fn write_result(
    writer: &mut ResponseWriter,
    format: Format,
    reply: Reply,
) -> Result<(), SerializeError> {
    match reply {
        Reply::Empty => {
            writer.send_head(StatusCode::OK, None, None)?;
            Ok(())
        }
        Reply::Value(value) => write_whole(writer, format, StatusCode::OK, &value).await,
        Reply::Status(code, value) => write_whole(writer, format, code, &value).await,
        Reply::Stream(stream) => write_stream(writer, format, stream).await,
        // Routed by the dispatcher before reaching here.
        Reply::Error(error) => write_error(writer, format, &error).await,
    }
}

/// Write a structured error.
///
/// When headers are already out the status line is suppressed; the
/// dispatcher then just closes the body.
pub async fn write_error(
    writer: &mut ResponseWriter,
    format: Format,
    error: &HttpError,
) -> Result<(), SerializeError> {
    if writer.headers_sent() {
        return Ok(());
    }
    let content_type = error.body.as_ref().map(|_| format.content_type());
    writer.send_head(error.code, Some(error.message.clone()), content_type)?;
    if let Some(body) = &error.body {
        writer.write(encode_whole(format, body)?).await?;
    }
    Ok(())
}

async fn write_whole(
    writer: &mut ResponseWriter,
    format: Format,
    code: StatusCode,
    value: &Value,
) -> Result<(), SerializeError> {
    let body = encode_whole(format, value)?;
    writer.send_head(code, None, Some(format.content_type()))?;
    writer.write(body).await?;
    Ok(())
}

/// Incremental encoding loop. Each element is serialized on its own and
/// handed to the writer, which suspends while the transport drains, so
/// memory stays bounded for arbitrarily long sequences.
async fn write_stream(
    writer: &mut ResponseWriter,
    format: Format,
    mut stream: ValueStream,
) -> Result<(), SerializeError> {
    writer.send_head(StatusCode::OK, None, Some(format.content_type()))?;

    match format {
        Format::Json => {
            writer.write(Bytes::from_static(b"[\n")).await?;
            let mut first = true;
            while let Some(value) = stream.next().await {
                let mut buf = if first {
                    Vec::new()
                } else {
                    b",\n".to_vec()
                };
                serde_json::to_writer(&mut buf, &value)?;
                writer.write(buf.into()).await?;
                first = false;
            }
            writer.write(Bytes::from_static(b"\n]")).await?;
        }
        Format::JsonLines | Format::Ndjson => {
            while let Some(value) = stream.next().await {
                let mut buf = serde_json::to_vec(&value)?;
                buf.push(b'\n');
                writer.write(buf.into()).await?;
            }
        }
        Format::Plain => {
            while let Some(value) = stream.next().await {
                let mut buf = pretty_tab(&value)?;
                buf.push(b'\n');
                writer.write(buf.into()).await?;
            }
        }
    }
    Ok(())
}

fn encode_whole(format: Format, value: &Value) -> Result<Bytes, serde_json::Error> {
    let buf = match format {
        Format::Plain => pretty_tab(value)?,
        Format::Json => serde_json::to_vec(value)?,
        Format::JsonLines | Format::Ndjson => {
            let mut buf = serde_json::to_vec(value)?;
            buf.push(b'\n');
            buf
        }
    };
    Ok(buf.into())
}

/// Human-readable rendering: JSON pretty-printed with tab indentation.
fn pretty_tab(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::writer::{channel, ChannelBody};
    use futures_util::stream;
    use http::Response;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn collect(response: Response<ChannelBody>) -> (StatusCode, Option<String>, String) {
        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    fn values(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({"n": i})).collect()
    }

    #[tokio::test]
    async fn empty_reply_has_no_content_type() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        write_result(&mut writer, Format::Plain, Reply::Empty)
            .await
            .unwrap();
        writer.finish();

        let (status, content_type, body) = collector.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, None);
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn whole_value_plain_is_tab_indented() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        write_result(
            &mut writer,
            Format::Plain,
            Reply::Value(json!({"a": [1, 2]})),
        )
        .await
        .unwrap();
        writer.finish();

        let (status, content_type, body) = collector.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
        assert_eq!(body, "{\n\t\"a\": [\n\t\t1,\n\t\t2\n\t]\n}");
    }

    #[tokio::test]
    async fn whole_value_json_is_compact() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        write_result(&mut writer, Format::Json, Reply::Value(json!({"a": [1, 2]})))
            .await
            .unwrap();
        writer.finish();

        let (_, content_type, body) = collector.await.unwrap();
        assert_eq!(
            content_type.as_deref(),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(body, r#"{"a":[1,2]}"#);
    }

    #[tokio::test]
    async fn explicit_status_is_used() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        write_result(
            &mut writer,
            Format::Json,
            Reply::Status(StatusCode::CREATED, json!({"id": 7})),
        )
        .await
        .unwrap();
        writer.finish();

        let (status, _, body) = collector.await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, r#"{"id":7}"#);
    }

    #[tokio::test]
    async fn streamed_json_parses_back_to_the_array() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        let items = values(25);
        write_result(
            &mut writer,
            Format::Json,
            Reply::Stream(stream::iter(items.clone()).boxed()),
        )
        .await
        .unwrap();
        writer.finish();

        let (_, content_type, body) = collector.await.unwrap();
        assert_eq!(
            content_type.as_deref(),
            Some("application/json; charset=utf-8")
        );
        let parsed: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, items);
    }

    #[tokio::test]
    async fn empty_stream_is_a_valid_json_array() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        write_result(
            &mut writer,
            Format::Json,
            Reply::Stream(stream::iter(Vec::<Value>::new()).boxed()),
        )
        .await
        .unwrap();
        writer.finish();

        let (_, _, body) = collector.await.unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn streamed_jsonl_is_one_line_per_element() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        let items = values(10);
        write_result(
            &mut writer,
            Format::JsonLines,
            Reply::Stream(stream::iter(items.clone()).boxed()),
        )
        .await
        .unwrap();
        writer.finish();

        let (_, _, body) = collector.await.unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 10);
        for (line, item) in lines.iter().zip(&items) {
            assert_eq!(&serde_json::from_str::<Value>(line).unwrap(), item);
        }
    }

    #[tokio::test]
    async fn error_writes_code_and_optional_body() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        let error =
            HttpError::new(StatusCode::CONFLICT).with_body(json!({"reason": "already exists"}));
        write_error(&mut writer, Format::Json, &error).await.unwrap();
        writer.finish();

        let (status, content_type, body) = collector.await.unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            content_type.as_deref(),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(body, r#"{"reason":"already exists"}"#);
    }

    #[tokio::test]
    async fn error_after_headers_sent_writes_no_second_status_line() {
        let (mut writer, pending) = channel();
        let collector = tokio::spawn(async move { collect(pending.resolve().await).await });

        writer
            .send_head(StatusCode::OK, None, Some(Format::Json.content_type()))
            .unwrap();
        write_error(
            &mut writer,
            Format::Json,
            &HttpError::new(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .await
        .unwrap();
        writer.finish();

        let (status, _, body) = collector.await.unwrap();
        assert_eq!(status, StatusCode::OK, "original status line must stand");
        assert_eq!(body, "");
    }
}
