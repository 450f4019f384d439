#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Entrypoint for the QuickFix admin console binary.

use std::process;

/// Parse arguments, run the selected command, and exit with its code.
#[tokio::main]
async fn main() {
    let code = quickfix_console::run().await;
    if code != 0 {
        process::exit(code);
    }
}
