pub mod document;
pub mod output;
pub mod types;
