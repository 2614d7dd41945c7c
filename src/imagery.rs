use crate::image::DynamicImage;
use crate::image::GenericImageView;

/// Grayscale copy of a sketch, one intensity per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch(Vec<Vec<u8>>);

/// Binarized sketch. `true` is a drawn pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(Vec<Vec<bool>>);

impl Sketch {
    pub fn new(width: u32, height: u32) -> Self {
        Self(vec![vec![u8::MAX; width as usize]; height as usize])
    }

    pub fn width(&self) -> u32 {
        self.0.first().map_or(0, |row| row.len() as u32)
    }

    pub fn height(&self) -> u32 {
        self.0.len() as u32
    }

    /// Separable Gaussian blur with an odd `kernel_size`. Borders are mirrored
    /// without repeating the edge pixel.
    pub fn blurred(&self, kernel_size: usize) -> Self {
        let kernel = gaussian_kernel(kernel_size);
        let width = self.width() as usize;
        let height = self.height() as usize;
        let radius = kernel_size / 2;

        let horizontal: Vec<Vec<f64>> = self
            .0
            .iter()
            .map(|row| {
                (0..width)
                    .map(|x| {
                        kernel
                            .iter()
                            .enumerate()
                            .map(|(k, weight)| {
                                let sx = reflect(x as i64 + k as i64 - radius as i64, width);
                                weight * row[sx] as f64
                            })
                            .sum()
                    })
                    .collect()
            })
            .collect();

        Self(
            (0..height)
                .map(|y| {
                    (0..width)
                        .map(|x| {
                            let value: f64 = kernel
                                .iter()
                                .enumerate()
                                .map(|(k, weight)| {
                                    let sy = reflect(y as i64 + k as i64 - radius as i64, height);
                                    weight * horizontal[sy][x]
                                })
                                .sum();
                            f64_to_u8_clamped(value)
                        })
                        .collect()
                })
                .collect(),
        )
    }

    fn histogram(&self) -> [u64; 256] {
        let mut histogram = [0; 256];
        self.0
            .iter()
            .flatten()
            .for_each(|v| histogram[*v as usize] += 1);
        histogram
    }

    /// Otsu's threshold: the intensity that maximizes between-class variance.
    /// A uniform image yields `0`.
    pub fn otsu_threshold(&self) -> u8 {
        let histogram = self.histogram();
        let total: u64 = histogram.iter().sum();
        if total == 0 {
            return 0;
        }
        let total = total as f64;
        let mean = histogram
            .iter()
            .enumerate()
            .map(|(i, count)| i as f64 * *count as f64)
            .sum::<f64>()
            / total;

        let epsilon = f64::EPSILON;
        let mut best = (0u8, 0.0);
        let mut q1 = 0.0;
        let mut mu1 = 0.0;
        for (i, count) in histogram.iter().enumerate() {
            let p = *count as f64 / total;
            mu1 *= q1;
            q1 += p;
            let q2 = 1.0 - q1;
            if f64::min(q1, q2) < epsilon || f64::max(q1, q2) > 1.0 - epsilon {
                continue;
            }
            mu1 = (mu1 + i as f64 * p) / q1;
            let mu2 = (mean - q1 * mu1) / q2;
            let variance = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
            if variance > best.1 {
                best = (i as u8, variance);
            }
        }
        best.0
    }

    /// Inverted binarization: pixels at or below `threshold` are drawn.
    pub fn binarized_inv(&self, threshold: u8) -> Mask {
        Mask(
            self.0
                .iter()
                .map(|row| row.iter().map(|v| *v <= threshold).collect())
                .collect(),
        )
    }
}

fn gaussian_kernel(size: usize) -> Vec<f64> {
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f64;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

// Mirror index: -1 -> 1, len -> len - 2
fn reflect(i: i64, len: usize) -> usize {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = i.rem_euclid(period);
    (if i < len { i } else { period - i }) as usize
}

fn f64_to_u8_clamped(num: f64) -> u8 {
    f64::max(u8::MIN as f64, f64::min(u8::MAX as f64, num.round())) as u8
}

impl Mask {
    pub fn width(&self) -> u32 {
        self.0.first().map_or(0, |row| row.len() as u32)
    }

    pub fn height(&self) -> u32 {
        self.0.len() as u32
    }

    /// Whether the pixel at `(x, y)` is drawn. Out of bounds is background.
    pub fn is_set(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && self
                .0
                .get(y as usize)
                .and_then(|row| row.get(x as usize))
                .copied()
                .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.0.iter().flatten().filter(|v| **v).count()
    }
}

impl std::convert::From<Vec<Vec<bool>>> for Mask {
    fn from(rows: Vec<Vec<bool>>) -> Self {
        Self(rows)
    }
}

// BT.601 luma of the pixel composited over white paper
fn luma_over_white(pixel: image::Rgba<u8>) -> u8 {
    let alpha = pixel[3] as f64 / u8::MAX as f64;
    let paper = u8::MAX as f64 * (1.0 - alpha);
    let luma = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
    f64_to_u8_clamped(luma * alpha + paper)
}

impl std::convert::From<&DynamicImage> for Sketch {
    fn from(image: &DynamicImage) -> Self {
        let mut sketch = Self::new(image.width(), image.height());
        image
            .pixels()
            .for_each(|(x, y, p)| sketch[(x, y)] = luma_over_white(p));
        sketch
    }
}

impl std::ops::Index<(u32, u32)> for Sketch {
    type Output = u8;
    fn index(&self, (x, y): (u32, u32)) -> &Self::Output {
        &self.0[y as usize][x as usize]
    }
}

impl std::ops::IndexMut<(u32, u32)> for Sketch {
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut Self::Output {
        &mut self.0[y as usize][x as usize]
    }
}
