//! Mahmoud.AI - document, speech and video tools on top of a hosted
//! generative model
//!
//! Uploaded files are encoded inline, sent with a prompt and an output
//! schema, and the model's answer is parsed into validated records (chart
//! analyses, summaries, mind maps, question sets, slide outlines). Speech
//! comes back as PCM and is wrapped into WAV; video is produced by a
//! long-running operation that is polled to completion.

pub mod ai;
pub mod app;
pub mod audio;
pub mod contracts;
pub mod error;
pub mod flows;
pub mod media;
pub mod models;
pub mod prompts;
pub mod schema;

pub use error::{Error, Result};
