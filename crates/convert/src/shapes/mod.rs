mod circle;
mod line;
mod point;
mod polygon;
mod text;

pub use circle::circular_ring;
pub(crate) use text::apply_text_style;
