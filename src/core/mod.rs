pub mod hash;
pub mod matcher;
pub mod report;
pub mod scanner;

#[cfg(test)]
pub(crate) mod test_support {
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::path::Path;

    // 64x64 grayscale image made of 8x8 blocks with pseudo-random levels.
    // Different seeds give visually unrelated images.
    pub(crate) fn create_test_image(seed: u32) -> RgbImage {
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        let mut cells = [0u8; 64];
        for cell in cells.iter_mut() {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *cell = (state >> 24) as u8;
        }

        ImageBuffer::from_fn(64, 64, |x, y| {
            let v = cells[((y / 8) * 8 + x / 8) as usize];
            Rgb([v, v, v])
        })
    }

    pub(crate) fn save_test_image(path: &Path, seed: u32) {
        create_test_image(seed).save(path).unwrap();
    }
}
