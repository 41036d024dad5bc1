// CLI Subcommands

pub mod execute;
pub mod list;
pub mod run;
pub mod serialize;
