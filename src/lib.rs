pub mod cli;
pub mod config;
pub mod exec;
pub mod flock;
pub mod model;
pub mod resolver;
pub mod staging;
pub mod vcs;

mod api;

pub use api::{Srcfetch, SrcfetchBuilder};
