//! Render output: markup assembly

pub mod markup;

pub use markup::{escape, image_markup, text_markup, wrap_page};
