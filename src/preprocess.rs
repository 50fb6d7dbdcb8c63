use image::{imageops::FilterType, DynamicImage, GrayImage, ImageReader, Luma};
use ndarray::{Array, Ix4};
use std::io::Cursor;
use thiserror::Error;

pub const INPUT_SIZE: u32 = 48;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot identify image file: {0}")]
    Format(std::io::Error),
    #[error("cannot decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Turns an encoded image into the `(1, 48, 48, 1)` tensor the model expects:
/// grayscale, nearest-neighbour resize, pixel values scaled into `[0, 1]`.
pub fn image_to_tensor(image_data: &[u8]) -> Result<Array<f32, Ix4>, DecodeError> {
    let image_reader = ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(DecodeError::Format)?;

    let original_img = image_reader.decode()?;

    let gray = to_grayscale(&original_img);
    let resized = image::imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Nearest);

    let side = INPUT_SIZE as usize;
    let mut input = Array::zeros((1, side, side, 1));
    for (x, y, pixel) in resized.enumerate_pixels() {
        input[[0, y as usize, x as usize, 0]] = pixel.0[0] as f32 / 255.;
    }

    Ok(input)
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded. This is the grayscale the
/// model was trained on; `DynamicImage::to_luma8` uses Rec. 709 weights instead.
fn itu601_luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn to_grayscale(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    let mut gray = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        gray.put_pixel(x, y, Luma([itu601_luma(r, g, b)]));
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_tensor_shape_and_range() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(100, 60, |x, y| {
            Rgb([(x * 2) as u8, (y * 4) as u8, 128])
        });

        let input = image_to_tensor(&encode_png(DynamicImage::ImageRgb8(img))).unwrap();

        assert_eq!(input.shape(), &[1, 48, 48, 1]);
        assert!(input.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_white_and_black_pixels_normalize() {
        let white = ImageBuffer::<Luma<u8>, Vec<u8>>::from_pixel(96, 96, Luma([255]));
        let input = image_to_tensor(&encode_png(DynamicImage::ImageLuma8(white))).unwrap();
        assert!(input.iter().all(|v| *v == 1.0));

        let black = ImageBuffer::<Luma<u8>, Vec<u8>>::from_pixel(20, 20, Luma([0]));
        let input = image_to_tensor(&encode_png(DynamicImage::ImageLuma8(black))).unwrap();
        assert!(input.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rows_map_to_height_axis() {
        // top half white, bottom half black
        let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_fn(48, 48, |_, y| {
            if y < 24 {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let input = image_to_tensor(&encode_png(DynamicImage::ImageLuma8(img))).unwrap();

        assert_eq!(input[[0, 0, 47, 0]], 1.0);
        assert_eq!(input[[0, 47, 0, 0]], 0.0);
    }

    #[test]
    fn test_non_image_bytes_fail() {
        let result = image_to_tensor(b"this is definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn test_truncated_png_fails() {
        let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_pixel(64, 64, Luma([90]));
        let bytes = encode_png(DynamicImage::ImageLuma8(img));

        let result = image_to_tensor(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::Image(_))));
    }

    #[test]
    fn test_color_uses_itu601_weights() {
        let cases = [
            (Rgb([0, 255, 0]), 150.0),
            (Rgb([255, 0, 0]), 76.0),
            (Rgb([0, 0, 255]), 29.0),
            (Rgb([255, 255, 255]), 255.0),
        ];

        for (color, expected) in cases {
            let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(48, 48, color);
            let input = image_to_tensor(&encode_png(DynamicImage::ImageRgb8(img))).unwrap();

            assert_eq!(input[[0, 10, 10, 0]], expected / 255.0, "{:?}", color);
        }
    }

    #[test]
    fn test_gray_input_is_unchanged_by_luma_conversion() {
        for v in [0u8, 1, 90, 128, 254, 255] {
            assert_eq!(itu601_luma(v, v, v), v);
        }
    }
}
