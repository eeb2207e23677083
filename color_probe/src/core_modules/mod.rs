pub mod color;
pub mod color_grid;
pub mod convolution;
pub mod kernel;
pub mod similarity;
