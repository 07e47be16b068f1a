//! Serve command - preview server with rebuild on change

use std::{path::Path, sync::Arc};

use blogsmith_generator::{BuildOptions, DirWriter, MemoryWriter, OutputWriter};
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::oneshot;

use super::{builder, nested_dest};
use crate::watcher::{WatchError, Watcher};

/// Serve options.
#[derive(Debug, Clone)]
pub struct ServeArgs<'a> {
    pub src: &'a Path,
    /// Build onto disk instead of into memory.
    pub dest: Option<&'a Path>,
    pub addr: &'a str,
    pub drafts: bool,
    /// Published URL; defaults to the listen address.
    pub base_url: Option<&'a str>,
}

/// Run the serve command until Ctrl+C.
pub async fn run(args: ServeArgs<'_>) -> Result<()> {
    let base_url = args
        .base_url
        .map_or_else(|| format!("http://{}/", args.addr), str::to_string);
    tracing::info!(src = %args.src.display(), addr = args.addr, base_url = %base_url, "Starting preview");

    let writer: Arc<dyn OutputWriter> = match args.dest {
        Some(dest) => Arc::new(DirWriter::new(dest)),
        None => Arc::new(MemoryWriter::new()),
    };
    let options = BuildOptions {
        base_url: Some(base_url),
        preview: args.drafts,
        exclude: args
            .dest
            .and_then(|dest| nested_dest(args.src, dest))
            .into_iter()
            .collect(),
        ..BuildOptions::default()
    };

    let builder = Arc::new(builder(args.src, writer, options));
    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(());
        }
    });

    println!();
    println!("  Preview server running at http://{}", args.addr);
    println!("  Press Ctrl+C to stop");
    println!();

    match Watcher::new(builder, args.src, args.addr).run(stop_rx).await {
        Ok(()) | Err(WatchError::ServerClosed) => Ok(()),
        Err(e) => Err(e).wrap_err("Watch loop failed"),
    }
}
