//! Per-connection worker.
//!
//! One of these runs on its own thread for every accepted connection. The
//! flow mirrors the cache's contract: derive the key, try `lookup`, and on
//! a miss stream the origin's response to the client while accumulating it
//! into a blob that is handed to `insert` when it fits under the per-object
//! ceiling. The blob returned by a lookup is an owned copy and is dropped
//! after forwarding; a refused insert hands the key and blob back and they
//! are dropped here.

use std::io::{BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;

use log::{debug, info};
use webcache_rs::key::cache_key;
use webcache_rs::{Blob, CacheTable};

use crate::error::ProxyError;
use crate::http::{self, RequestTarget, BUFFER_SIZE};

/// Handles one client connection to completion, reporting failures to the
/// log only; the accept loop never sees them.
pub fn handle_connection(client: TcpStream, cache: Arc<CacheTable>) {
    let peer = client
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    if let Err(err) = serve(client, &cache) {
        debug!("connection from {peer}: {err}");
    }
}

fn serve(client: TcpStream, cache: &CacheTable) -> Result<(), ProxyError> {
    let mut reader = BufReader::new(client.try_clone()?);
    let mut writer = client;

    match proxy_request(&mut reader, &mut writer, cache) {
        Ok(()) => finish(&mut reader, &writer),
        Err(err) => {
            if let Some((status, msg)) = err.status_page() {
                // The page and the drain are best-effort; the conversation
                // is over either way.
                if http::send_status_page(&mut writer, status, msg).is_ok() {
                    let _ = finish(&mut reader, &writer);
                }
            }
            Err(err)
        }
    }
}

/// Half-closes the write side and waits for the client's EOF before the
/// socket drops.
fn finish<R: Read>(reader: &mut R, client: &TcpStream) -> Result<(), ProxyError> {
    client.shutdown(Shutdown::Write)?;
    let mut discard = [0u8; BUFFER_SIZE];
    let _ = reader.read(&mut discard)?;
    Ok(())
}

fn proxy_request<R, W>(reader: &mut R, writer: &mut W, cache: &CacheTable) -> Result<(), ProxyError>
where
    R: std::io::BufRead,
    W: Write,
{
    let mut line = http::read_full_line(reader).map_err(|_| ProxyError::Malformed("no request string"))?;
    let RequestTarget { host, path } = http::parse_request_line(&mut line)?;
    let key = cache_key(&host, &path);
    info!("handling request: {key}");

    if let Some(cached) = cache.lookup(&key) {
        debug!("cache hit: {key} ({} bytes)", cached.len());
        writer.write_all(cached.as_bytes())?;
        return Ok(());
    }

    let mut origin = connect_origin(&host)?;
    write!(origin, "GET {path} HTTP/1.0\r\n")?;
    http::forward_headers(reader, &mut origin, &host)?;
    stream_response(origin, writer, cache, key)
}

/// Resolves the host and opens the origin connection.
///
/// Resolution failures owe the client a `502`; a refused or unreachable
/// origin just closes the conversation.
fn connect_origin(full_host: &str) -> Result<TcpStream, ProxyError> {
    let (hostname, port) = http::split_host_port(full_host)?;
    let addrs: Vec<SocketAddr> = (hostname, port)
        .to_socket_addrs()
        .map_err(|_| ProxyError::Gateway("DNS could not resolve address."))?
        .collect();
    if addrs.is_empty() {
        return Err(ProxyError::Gateway("DNS has no network addresses for host."));
    }
    Ok(TcpStream::connect(addrs.as_slice())?)
}

/// Streams the origin's response to the client while accumulating it, then
/// offers the body to the cache.
fn stream_response<W: Write>(
    mut origin: TcpStream,
    client: &mut W,
    cache: &CacheTable,
    key: String,
) -> Result<(), ProxyError> {
    let mut body = Blob::with_capacity(BUFFER_SIZE);
    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let n = origin.read(&mut buf)?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
        client.write_all(&buf[..n])?;
    }

    cache.record_miss(body.len() as u64);
    if (body.len() as u64) < cache.max_object_size() {
        if let Err((key, blob)) = cache.insert(key, body) {
            debug!("cache refused {key}: {} bytes exceed the table budget", blob.len());
        }
    } else {
        debug!(
            "not caching {key}: {} bytes reaches the per-object ceiling",
            body.len()
        );
    }
    Ok(())
}
