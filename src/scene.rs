pub mod color;
pub mod filters;
pub mod model;
