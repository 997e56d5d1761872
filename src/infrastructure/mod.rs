pub mod model;
pub mod parsing;
