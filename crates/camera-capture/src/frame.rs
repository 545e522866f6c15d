//! Video frame types

use image::{ImageBuffer, Rgb, RgbImage};

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds since the source was opened)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a black frame of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(vec![0; (width * height * 3) as usize], width, height, 0, 0)
    }

    /// Build a frame from a decoded image
    pub fn from_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }

    /// Copy the frame into an `image` buffer.
    ///
    /// Returns `None` when `data` does not hold exactly `width * height * 3` bytes.
    pub fn to_image(&self) -> Option<RgbImage> {
        ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, self.data.clone())
    }

    /// Frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_pixel() {
        let mut frame = VideoFrame::blank(4, 2);
        let idx = (4 + 2) * 3; // row 1, column 2
        frame.data[idx..idx + 3].copy_from_slice(&[10, 20, 30]);

        assert_eq!(frame.get_pixel(2, 1), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(frame.get_pixel(4, 0), None);
        assert_eq!(frame.get_pixel(0, 2), None);
    }

    #[test]
    fn test_image_conversion() {
        let image = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let frame = VideoFrame::from_image(image, 42, 7);

        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(frame.timestamp_ns, 42);
        assert_eq!(frame.sequence, 7);

        let back = frame.to_image().unwrap();
        assert_eq!(back.get_pixel(2, 1), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_to_image_rejects_short_buffer() {
        let frame = VideoFrame::new(vec![0; 5], 2, 2, 0, 0);
        assert!(frame.to_image().is_none());
    }
}
