//! Minimal HTTP/1.1 framing: one request per connection, CORS on every response.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ServerError;

/// Refuse bodies larger than this
const MAX_BODY_BYTES: usize = 1024 * 1024;
/// Refuse header blocks with more lines than this
const MAX_HEADER_LINES: usize = 100;
/// Refuse a request line or header line longer than this
const MAX_LINE_BYTES: u64 = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    /// Request target without the query string
    pub path: String,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn is(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }
}

/// `read_line` bounded by [`MAX_LINE_BYTES`].
async fn read_capped_line<R>(reader: &mut R, line: &mut String) -> Result<usize, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let n = (&mut *reader).take(MAX_LINE_BYTES).read_line(line).await?;
    if n as u64 == MAX_LINE_BYTES && !line.ends_with('\n') {
        return Err(ServerError::Malformed("line too long"));
    }
    Ok(n)
}

/// Read the request line, headers and exactly `Content-Length` body bytes.
///
/// Returns `Ok(None)` for a connection that closed or sent an empty request line.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<HttpRequest>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if read_capped_line(reader, &mut line).await? == 0 {
        return Ok(None);
    }
    let request_line = line.trim_end();
    if request_line.is_empty() {
        return Ok(None);
    }

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(ServerError::Malformed("bad request line"));
    };
    let method = method.to_string();
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut content_length = 0usize;
    for _ in 0..MAX_HEADER_LINES {
        line.clear();
        if read_capped_line(reader, &mut line).await? == 0 {
            break;
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((key, value)) = header.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(ServerError::Malformed("request body too large"));
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Some(HttpRequest { method, path, body }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, "application/json", body)
    }

    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, "text/html", body)
    }

    pub fn text(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, "text/plain", body)
    }

    /// CORS preflight answer
    pub fn no_content() -> Self {
        Self::new(204, "text/plain", Vec::new())
    }

    pub fn not_found() -> Self {
        Self::json(404, r#"{"error":"not found"}"#)
    }

    pub fn internal_error() -> Self {
        Self::text(500, "error")
    }

    /// `{"ok":true}` acknowledgement
    pub fn ack() -> Self {
        Self::json(200, r#"{"ok":true}"#)
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        response.status,
        reason_phrase(response.status),
        response.content_type,
        response.body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn parse(raw: &str) -> Result<Option<HttpRequest>, ServerError> {
        let mut reader = BufReader::new(raw.as_bytes());
        read_request(&mut reader).await
    }

    #[tokio::test]
    async fn test_reads_post_with_body() {
        let raw = "POST /api/analyze?x=1 HTTP/1.1\r\nHost: localhost\r\ncontent-length: 13\r\n\r\n{\"limit\": 2}\nEXTRA";
        let req = parse(raw).await.unwrap().unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/analyze");
        assert_eq!(req.body, b"{\"limit\": 2}\n");
    }

    #[tokio::test]
    async fn test_reads_get_without_body() {
        let req = parse("GET /ping HTTP/1.1\r\n\r\n").await.unwrap().unwrap();
        assert!(req.is("get"));
        assert_eq!(req.path, "/ping");
        assert!(req.body.is_empty());
    }

    #[tokio::test]
    async fn test_empty_connection_is_none() {
        assert!(parse("").await.unwrap().is_none());
        assert!(parse("\r\n").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_request_line() {
        assert!(matches!(parse("GARBAGE\r\n\r\n").await, Err(ServerError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_short_body_is_io_error() {
        let raw = "POST /analyze HTTP/1.1\r\nContent-Length: 50\r\n\r\n{}";
        assert!(matches!(parse(raw).await, Err(ServerError::Io(_))));
    }

    #[tokio::test]
    async fn test_oversized_lines_are_rejected() {
        let long_target = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(10_000));
        assert!(matches!(parse(&long_target).await, Err(ServerError::Malformed(_))));

        let long_header = format!("GET / HTTP/1.1\r\nX-Junk: {}\r\n\r\n", "b".repeat(10_000));
        assert!(matches!(parse(&long_header).await, Err(ServerError::Malformed(_))));

        let fits = format!("GET /ping HTTP/1.1\r\nX-Junk: {}\r\n\r\n", "c".repeat(4_000));
        assert_eq!(parse(&fits).await.unwrap().unwrap().path, "/ping");
    }

    #[tokio::test]
    async fn test_response_has_cors_and_length() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::not_found()).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.contains("Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n"));
        assert!(text.contains("Content-Length: 21\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"error\":\"not found\"}"));
    }

    #[tokio::test]
    async fn test_no_content_has_empty_body() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::no_content()).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }
}
