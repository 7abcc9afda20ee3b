//! Nanobanana - illustrated reflections from short journal notes
//!
//! A note goes in; a dated reflection comes out, with a short title, a few
//! poetic lines and an illustration. Generation uses a Gemini-compatible
//! service when an API key is configured and degrades to an offline
//! reflection when it is not, or when the service fails.

pub mod archive;
pub mod config;
pub mod journal;
pub mod reflection;
