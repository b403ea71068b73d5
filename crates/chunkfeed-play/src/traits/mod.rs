pub mod source;
pub mod surface;
