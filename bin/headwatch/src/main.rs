//! Watches the chain heads reported by a set of RPC providers and flags the heights at
//! which they disagree.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

use clap::Parser;

pub mod cli;
pub mod commands;
pub mod config;
pub mod flags;
pub mod poll;

fn main() {
    headwatch_cli::backtrace::enable();

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
