pub mod image;
pub mod moves;
