//! Archive reading functionality.
//!
//! Lets locators serve files straight out of archives that were already
//! downloaded, such as mod-loader installer jars.

pub mod zip;

pub use zip::{ZipArchive, ZipFileInfo};
