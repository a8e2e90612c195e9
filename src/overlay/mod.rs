pub mod pixel;
pub mod quad;

pub use pixel::PixelWriter;
pub use quad::{draw_line, draw_quad, LinePoints};
