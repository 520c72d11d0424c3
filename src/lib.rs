//! rsfam: radial family tree engine for Gramps XML.
//!
//! A tree is discovered lazily from a root family, laid out in angular
//! sectors per generation and dated by inference where the document is silent.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
