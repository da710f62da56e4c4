#![warn(missing_docs)]

//! <div class="warning">
//!
//! Note: API is unstable, and may change in `0.x` versions.
//!
//! </div>
//!
//! # As a library
//!
//! The workflow is "find one image for these fallback tag sets, then
//! download it": [`session::SessionClient::fetch_one`] picks a record,
//! [`download::Downloader::download_with_progress`] saves it.
//!
//! See [`session::SessionClient#example`] for example.
//!
//! # As a binary
//!
//! In addition to the above, [`cli`] and [`config`] build the command
//! line. See `main.rs` to know how these modules are assembled into a
//! binary.

pub mod api;
pub mod download;
pub mod parse;
pub mod select;
pub mod session;
pub mod transport;

pub mod cli;
pub mod config;
pub mod tool;
