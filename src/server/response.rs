use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes a JSON response with allow-all CORS, matching what the frontends
/// consuming this API already expect. Connections are single-request.
pub async fn write_json<W>(writer: &mut W, status: u16, body: &Value) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = body.to_string();
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nAccess-Control-Allow-Origin: *\r\nContent-Length: {length}\r\nConnection: close\r\n\r\n{payload}",
        reason = reason(status),
        length = payload.len(),
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await
}

/// Empty CORS preflight response.
pub async fn write_preflight<W>(writer: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = "HTTP/1.1 204 No Content\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: *\r\nAccess-Control-Allow-Headers: *\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}
