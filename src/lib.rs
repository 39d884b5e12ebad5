//! Sublingo - subtitle segmentation and duration fitting.
//!
//! `segment` turns an ASR token stream into subtitle-sized sentences;
//! `fit` shortens subtitle lines that cannot be read within their time window.

pub mod cli;
pub mod config;
pub mod error;
pub mod fit;
pub mod rewrite;
pub mod segment;
pub mod subtitle;
pub mod transcript;
pub mod workflow;

pub use error::{Result, SublingoError};
