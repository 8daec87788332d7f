//! Turning a Common Voice release into a Kaldi data directory. The interesting part, working
//! out pronunciations, lives in the crate root. This module handles the metadata, the ids Kaldi
//! expects and writing the files out.

pub mod analytics;
pub mod common_voice;
pub mod kaldi;
pub mod recipe;

pub use analytics::*;
pub use recipe::*;
