use chrono::{DateTime, Utc};
use image::RgbImage;
use std::sync::Arc;
use uuid::Uuid;

/// One captured board image. Clones share the pixel buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    frame_id: Uuid,
    image: Arc<RgbImage>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            image: Arc::new(image),
            captured_at,
        }
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn cloning_frame_shares_image_buffer() {
        let img: RgbImage = ImageBuffer::from_pixel(16, 16, Rgb([1, 2, 3]));
        let f1 = Frame::new(img, Utc::now());
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.image, &f2.image));
        assert_eq!(f1.frame_id(), f2.frame_id());
    }

    #[test]
    fn frames_get_distinct_ids() {
        let img: RgbImage = ImageBuffer::from_pixel(4, 4, Rgb([0, 0, 0]));
        let a = Frame::new(img.clone(), Utc::now());
        let b = Frame::new(img, Utc::now());
        assert_ne!(a.frame_id(), b.frame_id());
    }
}
