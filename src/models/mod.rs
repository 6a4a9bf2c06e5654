pub mod generated_image;

pub use generated_image::GeneratedImage;
