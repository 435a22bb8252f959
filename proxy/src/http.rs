//! HTTP/1.0 request reading, parsing and header rewriting.
//!
//! The proxy accepts exactly one request shape:
//!
//! ```text
//! GET http://<host>[:port][/path...] HTTP/x.y
//! ```
//!
//! Anything else is rejected — a non-GET method with `501`, everything else
//! malformed with `400`. Headers forwarded to the origin are rewritten so
//! the upstream conversation is never persistent: `Keep-Alive` is dropped,
//! `Connection` and `Proxy-Connection` are forced to `close`, and a `Host`
//! header is synthesized when the client sent none.

use std::io::{self, BufRead, Write};

use webcache_rs::Blob;

use crate::error::ProxyError;

/// Chunk size for socket reads and the initial line-buffer capacity.
pub const BUFFER_SIZE: usize = 8192;

/// The parsed target of a GET request.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestTarget {
    /// Host as it appeared in the URL, `:port` included when given.
    pub host: String,
    /// URL path starting with `/`; `/` when the URL had none.
    pub path: String,
}

/// Reads one line, up to and including the `\r\n` terminator.
///
/// An EOF or read failure before the terminator is an error; a header block
/// that just stops mid-line is not something worth recovering from.
pub fn read_full_line<R: BufRead>(reader: &mut R) -> io::Result<Blob> {
    let mut line = Blob::with_capacity(BUFFER_SIZE);
    let mut last = 0u8;
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        line.push(byte[0]);
        if last == b'\r' && byte[0] == b'\n' {
            return Ok(line);
        }
        last = byte[0];
    }
}

/// Parses the request line into its target host and path.
pub fn parse_request_line(line: &mut Blob) -> Result<RequestTarget, ProxyError> {
    // NUL-terminated view: an embedded NUL cuts the line short instead of
    // reaching the tokenizer.
    let text = String::from_utf8_lossy(line.as_cstr().to_bytes()).into_owned();
    let mut tokens = text.split_whitespace();
    let (Some(method), Some(url), Some(version), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ProxyError::Malformed("GET requests have three parts"));
    };

    if method != "GET" {
        return Err(ProxyError::NotImplemented(
            "this proxy only handles GET requests",
        ));
    }
    if !version.starts_with("HTTP/") {
        return Err(ProxyError::Malformed(
            "the third part of a GET request is an HTTP version",
        ));
    }
    let Some(rest) = url.strip_prefix("http://") else {
        return Err(ProxyError::Malformed(
            "the request URL should start with 'http://'",
        ));
    };

    // The path starts at the first '/' after the host; a bare host means "/".
    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    Ok(RequestTarget {
        host: host.to_string(),
        path: path.to_string(),
    })
}

/// Splits `host[:port]`, defaulting to port 80.
pub fn split_host_port(full_host: &str) -> Result<(&str, u16), ProxyError> {
    match full_host.split_once(':') {
        None => Ok((full_host, 80)),
        Some((hostname, port_str)) => match port_str.parse::<u16>() {
            Ok(port) if port > 0 => Ok((hostname, port)),
            _ => Err(ProxyError::Malformed("invalid port")),
        },
    }
}

/// Reads the client's remaining headers and forwards them to the origin,
/// rewritten for a one-shot connection.
pub fn forward_headers<R: BufRead, W: Write>(
    reader: &mut R,
    origin: &mut W,
    host: &str,
) -> Result<(), ProxyError> {
    let mut sent_host_header = false;
    let mut sent_connection_header = false;

    loop {
        let line = read_full_line(reader)
            .map_err(|_| ProxyError::Malformed("header not terminated by a new line"))?;
        let bytes = line.as_bytes();

        if bytes == b"\r\n" {
            break;
        }
        if bytes.starts_with(b"Keep-Alive:") {
            continue;
        }

        let forwarded: &[u8] = if bytes.starts_with(b"Host:") {
            sent_host_header = true;
            bytes
        } else if bytes.starts_with(b"Connection:") {
            sent_connection_header = true;
            b"Connection: close\r\n"
        } else if bytes.starts_with(b"Proxy-Connection:") {
            b"Proxy-Connection: close\r\n"
        } else {
            bytes
        };
        origin.write_all(forwarded)?;
    }

    if !sent_host_header {
        origin.write_all(b"Host: ")?;
        origin.write_all(host.as_bytes())?;
        origin.write_all(b"\r\n")?;
    }
    if !sent_connection_header {
        origin.write_all(b"Connection: close\r\n")?;
    }
    origin.write_all(b"\r\n")?;
    Ok(())
}

/// Sends an HTML status page to the client.
pub fn send_status_page<W: Write>(client: &mut W, status: &str, msg: &str) -> io::Result<()> {
    let response = format!(
        "HTTP/1.0 {status}\r\n\
         Content-Type: text/html\r\n\
         Connection: close\r\n\
         \r\n\
         <html><head><title>{status}</title></head><body>{msg}</body></html>"
    );
    client.write_all(response.as_bytes())
}
