//! Command handlers, one module per subcommand.

pub mod apply;
pub mod check;
pub mod render;
pub mod totals;
