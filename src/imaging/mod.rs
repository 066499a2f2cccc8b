//! Image encoding and batch resizing.

pub mod encode;
pub mod resize;

pub use encode::{encode_image, OutputFormat};
pub use resize::{
    new_dimensions, resize_batch, resize_image, BatchResize, ResizeDownload, ResizeMode,
    ResizedImage,
};
