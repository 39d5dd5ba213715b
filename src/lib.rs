//! Retrieval and download engine for 9GAG data exports.
//!
//! The [gag] module parses the "Upvotes" and "Saved" tables out of a 9GAG HTML
//! export and downloads the media behind every listed post, one at a time, into
//! `{destination}/gags/videos` and `{destination}/gags/images`.

#[macro_use]
extern crate log;

pub mod gag;

pub use gag::{parse_export, run_downloads};
