//! Value types shared by extraction, classification and composition.

mod category;
mod geometry;
mod image;

pub use category::Category;
pub use geometry::PageRect;
pub use image::{PageImage, RasterFormat};
