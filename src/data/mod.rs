pub mod csv;
pub mod encoding;
pub mod image;
pub mod sample;

pub use sample::Sample;
