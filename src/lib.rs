//! phrasemine - template discovery and variable extraction for search phrases
//!
//! Mines recurring structures such as `best {SLOT} for {SLOT2}` from a corpus
//! of short phrases without a predefined template list, then extracts and
//! cross-validates the values that fill each slot.
//!
//! ```no_run
//! use phrasemine::config::{DiscoveryConfig, StopWords};
//! use phrasemine::models::Phrase;
//! use phrasemine::pipeline::Pipeline;
//!
//! let phrases: Vec<Phrase> = ["how to cook rice", "cook rice recipe"]
//!     .into_iter()
//!     .map(Phrase::from)
//!     .collect();
//! let pipeline = Pipeline::new(DiscoveryConfig::default(), StopWords::default_english())?;
//! let report = pipeline.discover(&phrases);
//! println!("{} templates", report.templates.len());
//! # Ok::<(), phrasemine::config::ConfigError>(())
//! ```

pub mod config;
pub mod corpus;
pub mod discovery;
pub mod models;
pub mod pipeline;
pub mod reporters;
