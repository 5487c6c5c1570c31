pub mod check;
pub mod compose;
pub mod edl;
pub mod plan;
pub mod probe;
pub mod render;
pub mod validate;
