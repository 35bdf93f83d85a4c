pub mod gen;
pub mod model;
