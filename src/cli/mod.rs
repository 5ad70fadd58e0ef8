//! CLI command handling

pub mod output;
pub mod queue;
pub mod rules;
pub mod run;

pub use output::*;
pub use queue::*;
pub use rules::*;
pub use run::*;
