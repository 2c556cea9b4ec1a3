// Chart DSL parser module

pub mod encoding;
pub mod labels;
pub mod lexer;
pub mod mark;
pub mod pipeline;
pub mod transform;

// Public API re-exports
pub use pipeline::parse_chart_spec;
