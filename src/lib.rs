//! Traffic generator for the emojify demo application.
//!
//! Each virtual user repeatedly walks the emojify flow: load the home page
//! assets, submit a picture for processing, poll until the job finishes and
//! fetch the result from the cache.

pub mod config;
pub mod error;
pub mod load;
pub mod service;
pub mod shutdown;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
