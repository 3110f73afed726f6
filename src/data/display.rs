//! Conversion of raw samples into displayable images

use image::{GrayImage, Luma};
use tch::Tensor;

use super::sampler::{tensor_to_vec, ImageBatch, ImageShape};
use crate::error::{Error, Result};

/// How a dataset's samples are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMode {
    /// Each row is a grayscale image with values in `[0, 1]`
    Images(ImageShape),
    /// Each row is a 2-D point; the whole batch becomes one scatter plot
    /// covering `[-extent, extent]` on both axes
    Points { extent: f32, size: u32 },
}

impl DisplayMode {
    pub fn render(&self, samples: &Tensor) -> Result<ImageBatch> {
        match *self {
            DisplayMode::Images(shape) => images_from_rows(samples, shape),
            DisplayMode::Points { extent, size } => {
                scatter_points(samples, extent, size).map(|img| ImageBatch::new(vec![img]))
            }
        }
    }
}

/// Turn `[n, c*h*w]` rows into `n` grayscale images (channels are averaged)
pub fn images_from_rows(samples: &Tensor, shape: ImageShape) -> Result<ImageBatch> {
    let numel = shape.numel();
    let cols = samples.size().last().copied().unwrap_or(0);
    if cols != numel {
        return Err(Error::DimensionMismatch {
            what: "displayed sample".to_string(),
            expected: numel,
            actual: cols,
        });
    }

    let values = tensor_to_vec(samples)?;
    let plane = (shape.height * shape.width) as usize;
    let mut images = Vec::with_capacity(values.len() / numel.max(1) as usize);

    for row in values.chunks(numel as usize) {
        let mut pixels = Vec::with_capacity(plane);
        for p in 0..plane {
            let mut acc = 0.0;
            for c in 0..shape.channels as usize {
                acc += row[c * plane + p];
            }
            let v = (acc / shape.channels as f32).clamp(0.0, 1.0);
            pixels.push((v * 255.0).round() as u8);
        }
        let img = GrayImage::from_raw(shape.width as u32, shape.height as u32, pixels)
            .ok_or_else(|| Error::InvalidConfig("image buffer size mismatch".to_string()))?;
        images.push(img);
    }

    Ok(ImageBatch::new(images))
}

/// Draw `[n, 2]` points as white dots on a black square canvas
pub fn scatter_points(samples: &Tensor, extent: f32, size: u32) -> Result<GrayImage> {
    let cols = samples.size().last().copied().unwrap_or(0);
    if cols != 2 {
        return Err(Error::DimensionMismatch {
            what: "scatter point".to_string(),
            expected: 2,
            actual: cols,
        });
    }

    if size == 0 || !(extent.is_finite() && extent > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "scatter canvas needs a positive size and extent, got {size} and {extent}"
        )));
    }

    let values = tensor_to_vec(samples)?;
    let mut canvas = GrayImage::new(size, size);
    let scale = (size - 1) as f32 / (2.0 * extent);

    for point in values.chunks(2) {
        let (x, y) = (point[0], point[1]);
        if !x.is_finite() || !y.is_finite() || x.abs() > extent || y.abs() > extent {
            continue;
        }
        let px = ((x + extent) * scale).round() as i64;
        // Image rows grow downwards
        let py = ((extent - y) * scale).round() as i64;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (qx, qy) = (px + dx, py + dy);
                if qx >= 0 && qy >= 0 && (qx as u32) < size && (qy as u32) < size {
                    canvas.put_pixel(qx as u32, qy as u32, Luma([255]));
                }
            }
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images_from_rows() {
        let shape = ImageShape {
            channels: 1,
            height: 2,
            width: 3,
        };
        let samples = Tensor::from_slice(&[0.0f32, 0.5, 1.0, 2.0, -1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .view([2, 6]);
        let batch = images_from_rows(&samples, shape).unwrap();

        assert_eq!(batch.len(), 2);
        let img = &batch.images[0];
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
        // Out-of-range values are clamped
        assert_eq!(img.get_pixel(0, 1)[0], 255);
        assert_eq!(img.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn test_images_from_rows_rejects_wrong_width() {
        let shape = ImageShape {
            channels: 1,
            height: 2,
            width: 2,
        };
        let samples = Tensor::zeros([1, 5], (tch::Kind::Float, tch::Device::Cpu));
        assert!(images_from_rows(&samples, shape).is_err());
    }

    #[test]
    fn test_scatter_points() {
        let samples = Tensor::from_slice(&[0.0f32, 0.0, 10.0, 10.0]).view([2, 2]);
        let img = scatter_points(&samples, 1.0, 65).unwrap();

        assert_eq!(img.dimensions(), (65, 65));
        assert_eq!(img.get_pixel(32, 32)[0], 255);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_scatter_points_rejects_empty_canvas() {
        let samples = Tensor::from_slice(&[0.0f32, 0.0]).view([1, 2]);
        assert!(matches!(scatter_points(&samples, 1.0, 0), Err(Error::InvalidConfig(_))));
        assert!(scatter_points(&samples, 0.0, 16).is_err());
    }
}
