mod commands;
mod report;

pub use commands::{run, Cli};
