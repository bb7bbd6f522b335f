pub mod compositor;
pub mod filters;
pub mod transform;
