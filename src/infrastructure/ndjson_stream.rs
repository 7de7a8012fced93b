// Chunked NDJSON streaming utilities
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use serde::Serialize;

/// Create a chunked response with one JSON document per line
pub fn ndjson_stream<S, T>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
{
    let byte_stream = stream.map(|item| serialize_line(&item));
    let body = Body::from_stream(byte_stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single item followed by a newline
fn serialize_line<T: Serialize>(item: &T) -> Result<Bytes, serde_json::Error> {
    let mut chunk = BytesMut::with_capacity(256);
    serde_json::to_writer((&mut chunk).writer(), item)?;
    chunk.put_u8(b'\n');
    Ok(chunk.freeze())
}

/// Helper to turn any item stream into a streaming response
pub fn stream_response<S, T>(stream: S) -> impl IntoResponse
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
{
    match ndjson_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
