use image::io::Reader;
use image::{DynamicImage, ImageResult};
use std::path::Path;

/// Decodes an image file, choosing the codec from its leading bytes.
/// The extension is only consulted when the content is not recognized.
pub fn open_image(path: &Path) -> ImageResult<DynamicImage> {
    Reader::open(path)?.with_guessed_format()?.decode()
}
