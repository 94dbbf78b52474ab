use crate::models::ImageSize;
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

/// Side of the square the classifier expects.
pub const INPUT_SIZE: u32 = 224;

pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// An uploaded image decoded to RGB, along with its original dimensions.
pub struct DecodedImage {
    pub pixels: RgbImage,
    pub size: ImageSize,
}

pub fn decode(bytes: &[u8]) -> Result<DecodedImage, image::ImageError> {
    let pixels = image::load_from_memory(bytes)?.to_rgb8();
    let size = ImageSize {
        width: pixels.width(),
        height: pixels.height(),
    };
    Ok(DecodedImage { pixels, size })
}

/// Stretches to `INPUT_SIZE` x `INPUT_SIZE` and normalizes into a
/// `[1, 3, H, W]` tensor.
pub fn to_tensor(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let side = INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            tensor[[0, c, y as usize, x as usize]] = value;
        }
    }
    tensor
}
