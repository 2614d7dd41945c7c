use crate::rand::seq::SliceRandom;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn len(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn cross(&self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Perpendicular distance from `self` to the infinite line through `a` and `b`.
    /// Falls back to the distance to `a` when the two coincide.
    pub fn distance_to_line(&self, a: Self, b: Self) -> f64 {
        let direction = b - a;
        let length = direction.len();
        if length == 0.0 {
            (*self - a).len()
        } else {
            direction.cross(*self - a).abs() / length
        }
    }
}

impl std::ops::Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> <Self as std::ops::Add>::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> <Self as std::ops::Add>::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Div<f64> for Vector {
    type Output = Self;
    fn div(self, num: f64) -> <Self as std::ops::Div<f64>>::Output {
        Self::new(self.x / num, self.y / num)
    }
}

impl std::convert::From<Point> for Vector {
    fn from(point: Point) -> Self {
        Self::new(point.x as f64, point.y as f64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    fn distance_squared(&self, other: &Self) -> u64 {
        let dx = self.x.abs_diff(other.x) as u64;
        let dy = self.y.abs_diff(other.y) as u64;
        dx * dx + dy * dy
    }
}

/// Axis-aligned bounding box. `w` and `h` count pixels, so a single point is 1x1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (min_x, min_y, max_x, max_y) = points.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| {
                (
                    u32::min(min_x, p.x),
                    u32::min(min_y, p.y),
                    u32::max(max_x, p.x),
                    u32::max(max_y, p.y),
                )
            },
        );
        Some(Self {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.w as f64 / self.h as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vector,
    pub radius: f64,
}

impl Circle {
    fn new(center: Vector, radius: f64) -> Self {
        Self { center, radius }
    }

    fn diametric(a: Vector, b: Vector) -> Self {
        let center = (a + b) / 2.0;
        Self::new(center, (a - center).len())
    }

    // Degenerates to the widest diametric circle when the points are collinear
    fn circumscribed(a: Vector, b: Vector, c: Vector) -> Self {
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if d.abs() < 1e-9 {
            return [Self::diametric(a, b), Self::diametric(b, c), Self::diametric(a, c)]
                .into_iter()
                .fold(Self::new(a, 0.0), |widest, circle| {
                    if circle.radius > widest.radius {
                        circle
                    } else {
                        widest
                    }
                });
        }
        let (a2, b2, c2) = (a.x * a.x + a.y * a.y, b.x * b.x + b.y * b.y, c.x * c.x + c.y * c.y);
        let center = Vector::new(
            (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
            (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
        );
        Self::new(center, (a - center).len())
    }

    fn contains(&self, point: Vector) -> bool {
        (point - self.center).len() <= self.radius * (1.0 + 1e-9) + 1e-9
    }
}

/// Smallest circle containing every point (Welzl, iterative form).
pub fn min_enclosing_circle(points: &[Point]) -> Option<Circle> {
    let mut vectors: Vec<Vector> = points.iter().map(|p| Vector::from(*p)).collect();
    vectors.shuffle(&mut rand::thread_rng());

    let mut circle = Circle::new(*vectors.first()?, 0.0);
    for i in 1..vectors.len() {
        if circle.contains(vectors[i]) {
            continue;
        }
        circle = Circle::new(vectors[i], 0.0);
        for j in 0..i {
            if circle.contains(vectors[j]) {
                continue;
            }
            circle = Circle::diametric(vectors[i], vectors[j]);
            for k in 0..j {
                if !circle.contains(vectors[k]) {
                    circle = Circle::circumscribed(vectors[i], vectors[j], vectors[k]);
                }
            }
        }
    }
    Some(circle)
}

/// Area enclosed by a closed polygon (shoelace formula).
pub fn polygon_area(points: &[Point]) -> f64 {
    let doubled: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    doubled.abs() as f64 / 2.0
}

/// Length of a closed polyline, including the segment back to the start.
pub fn closed_arc_length(points: &[Point]) -> f64 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (Vector::from(*b) - Vector::from(*a)).len())
        .sum()
}

/// Douglas-Peucker simplification of a closed curve.
///
/// The curve is cut at two mutually distant points, each half is simplified as an
/// open polyline, and the halves are joined again. The first returned vertex is
/// the point farthest from `points[0]`.
pub fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let farthest_from = |origin: usize| {
        (0..points.len())
            .max_by_key(|&i| points[i].distance_squared(&points[origin]))
            .unwrap_or(origin)
    };
    let a = farthest_from(0);
    let b = farthest_from(a);
    if points[a] == points[b] {
        return vec![points[a]];
    }

    let n = points.len();
    let chain = |from: usize, to: usize| {
        let steps = (to + n - from) % n;
        (0..=steps)
            .map(|i| points[(from + i) % n])
            .collect::<Vec<_>>()
    };

    let mut simplified = Vec::new();
    simplify_open(&chain(a, b), epsilon, &mut simplified);
    simplify_open(&chain(b, a), epsilon, &mut simplified);
    simplified
}

// Pushes the kept vertices of `points`, except the last one
fn simplify_open(points: &[Point], epsilon: f64, kept: &mut Vec<Point>) {
    let first = Vector::from(points[0]);
    let last = Vector::from(points[points.len() - 1]);

    let farthest = points
        .iter()
        .enumerate()
        .take(points.len() - 1)
        .skip(1)
        .map(|(i, p)| (i, Vector::from(*p).distance_to_line(first, last)))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if best_d >= d => best,
            _ => Some((i, d)),
        });

    match farthest {
        Some((index, distance)) if distance > epsilon => {
            simplify_open(&points[..=index], epsilon, kept);
            simplify_open(&points[index..], epsilon, kept);
        }
        _ => kept.push(points[0]),
    }
}
