use crate::contour::{self, Contour};
use crate::geometry::{self, Point, Rect};
use crate::image::DynamicImage;
use crate::imagery::Sketch;
use crate::serde::Serialize;

const BLUR_KERNEL_SIZE: usize = 7;
/// Regions enclosing less than this many square pixels are stray marks.
const MIN_AREA: f64 = 1000.0;
/// Douglas-Peucker tolerance as a fraction of the contour's perimeter.
const APPROXIMATION_FACTOR: f64 = 0.03;
const SQUARE_ASPECT_RATIO: std::ops::RangeInclusive<f64> = 0.9..=1.1;
const MIN_CIRCULARITY: f64 = 0.6;

/// Bounding box as fractions of the image's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A recognized sketch. Serialized as `{"shape": ..., "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "params", rename_all = "lowercase")]
pub enum Shape {
    Triangle { points: Vec<[f64; 2]> },
    Square(Bounds),
    Rectangle(Bounds),
    Circle { cx: f64, cy: f64, r: f64 },
    Polygon(Bounds),
    Unknown {},
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Triangle { .. } => "triangle",
            Shape::Square(_) => "square",
            Shape::Rectangle(_) => "rectangle",
            Shape::Circle { .. } => "circle",
            Shape::Polygon(_) => "polygon",
            Shape::Unknown {} => "unknown",
        }
    }
}

/// Recognize the dominant drawn shape. `None` when nothing big enough was drawn.
pub fn classify(image: &DynamicImage) -> Option<Shape> {
    let sketch = Sketch::from(image).blurred(BLUR_KERNEL_SIZE);
    let threshold = sketch.otsu_threshold();
    let mask = sketch.binarized_inv(threshold);
    let contours = contour::external_contours(&mask);

    tracing::debug!(
        threshold,
        drawn_pixels = mask.count(),
        contours = contours.len(),
        "binarized sketch"
    );

    let (contour, area) = contours
        .iter()
        .map(|c| (c, c.area()))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    if area < MIN_AREA {
        tracing::debug!(area, "largest contour is too small");
        return None;
    }

    let shape = recognize(contour, area, image.width(), image.height());
    tracing::debug!(area, shape = shape.name(), "classified sketch");
    Some(shape)
}

fn recognize(contour: &Contour, area: f64, width: u32, height: u32) -> Shape {
    let perimeter = contour.perimeter();
    let vertices = geometry::simplify_closed(contour.points(), APPROXIMATION_FACTOR * perimeter);
    let normalize = Normalizer { width, height };

    match vertices.len() {
        3 => Shape::Triangle {
            points: vertices.iter().map(|p| normalize.point(p)).collect(),
        },
        4 => match Rect::bounding(&vertices) {
            Some(rect) if SQUARE_ASPECT_RATIO.contains(&rect.aspect_ratio()) => {
                Shape::Square(normalize.rect(&rect))
            }
            Some(rect) => Shape::Rectangle(normalize.rect(&rect)),
            None => Shape::Unknown {},
        },
        n => {
            let circularity = 4.0 * std::f64::consts::PI * area / (perimeter * perimeter);
            tracing::trace!(vertices = n, circularity, "not a 3 or 4 sided shape");
            if circularity > MIN_CIRCULARITY {
                match geometry::min_enclosing_circle(contour.points()) {
                    Some(circle) => Shape::Circle {
                        cx: normalize.x(circle.center.x),
                        cy: normalize.y(circle.center.y),
                        r: normalize.radius(circle.radius),
                    },
                    None => Shape::Unknown {},
                }
            } else if n > 4 && n < 10 {
                Rect::bounding(&vertices)
                    .map(|rect| Shape::Polygon(normalize.rect(&rect)))
                    .unwrap_or(Shape::Unknown {})
            } else {
                Shape::Unknown {}
            }
        }
    }
}

// Maps pixel measurements onto [0, 1]
struct Normalizer {
    width: u32,
    height: u32,
}

impl Normalizer {
    fn x(&self, x: f64) -> f64 {
        unit(x / self.width as f64)
    }

    fn y(&self, y: f64) -> f64 {
        unit(y / self.height as f64)
    }

    fn radius(&self, r: f64) -> f64 {
        unit(r / u32::max(self.width, self.height) as f64)
    }

    fn point(&self, p: &Point) -> [f64; 2] {
        [self.x(p.x as f64), self.y(p.y as f64)]
    }

    fn rect(&self, rect: &Rect) -> Bounds {
        Bounds {
            x: self.x(rect.x as f64),
            y: self.y(rect.y as f64),
            w: self.x(rect.w as f64),
            h: self.y(rect.h as f64),
        }
    }
}

fn unit(n: f64) -> f64 {
    f64::max(0.0, f64::min(1.0, n))
}
