//! Concurrent forward HTTP/1.0 proxy.
//!
//! Binds a listening socket, builds the one process-wide cache before any
//! worker exists, and hands every accepted connection to a fresh OS thread.
//! The cache is passed to each worker explicitly behind an `Arc`; there is
//! no global. Threads are detached — the handle is dropped right away and
//! each connection runs to completion on its own.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use log::{error, info};
use webcache_rs::{CacheConfig, CacheTable};

mod error;
mod http;
mod worker;

/// Forward HTTP/1.0 proxy with a shared LRU object cache
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Address to bind the listener to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let listener = TcpListener::bind((args.bind.as_str(), args.port))?;
    let cache = Arc::new(CacheTable::init(CacheConfig::default()));

    println!("Proxy listening on port {}", args.port);
    info!("cache budget: {} bytes across 67 buckets", cache.max_size());

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let cache = Arc::clone(&cache);
                thread::spawn(move || worker::handle_connection(stream, cache));
            }
            Err(err) => {
                error!("accept error: {err}");
            }
        }
    }
    Ok(())
}
