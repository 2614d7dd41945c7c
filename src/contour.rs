use crate::geometry::{self, Point};
use crate::imagery::Mask;

// Clockwise on screen (y grows downward), starting west
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];
const WEST: usize = 0;

/// Closed outer boundary of one drawn region, in tracing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour(Vec<Point>);

impl Contour {
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.0)
    }

    pub fn perimeter(&self) -> f64 {
        geometry::closed_arc_length(&self.0)
    }
}

/// Outer boundaries of the 8-connected drawn regions that are not nested inside
/// a hole of another region.
pub fn external_contours(mask: &Mask) -> Vec<Contour> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let outside = outside_background(mask);
    let mut visited = vec![vec![false; width]; height];
    let mut contours = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y][x] || !mask.is_set(x as i64, y as i64) {
                continue;
            }
            let size = mark_region(mask, &mut visited, (x, y));
            // (x, y) is the region's topmost-leftmost pixel, so its west side is background
            let external = x == 0 || outside[y][x - 1];
            if external {
                contours.push(Contour(trace(mask, (x as i64, y as i64), size)));
            }
        }
    }
    contours
}

// Background reachable from the image border through 4-connected background
fn outside_background(mask: &Mask) -> Vec<Vec<bool>> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let mut outside = vec![vec![false; width]; height];
    let mut stack: Vec<(usize, usize)> = (0..width)
        .flat_map(|x| [(x, 0), (x, height.saturating_sub(1))])
        .chain((0..height).flat_map(|y| [(0, y), (width.saturating_sub(1), y)]))
        .collect();

    while let Some((x, y)) = stack.pop() {
        if x >= width || y >= height || outside[y][x] || mask.is_set(x as i64, y as i64) {
            continue;
        }
        outside[y][x] = true;
        if x > 0 {
            stack.push((x - 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        stack.push((x + 1, y));
        stack.push((x, y + 1));
    }
    outside
}

// Flood fills the 8-connected region containing `start`, returning its pixel count
fn mark_region(mask: &Mask, visited: &mut [Vec<bool>], start: (usize, usize)) -> usize {
    let mut stack = vec![start];
    let mut size = 0;
    while let Some((x, y)) = stack.pop() {
        if visited[y][x] {
            continue;
        }
        visited[y][x] = true;
        size += 1;
        for (dx, dy) in NEIGHBORS {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if mask.is_set(nx, ny) && !visited[ny as usize][nx as usize] {
                stack.push((nx as usize, ny as usize));
            }
        }
    }
    size
}

// One Moore-neighbor step: scan clockwise from the backtrack direction and return the
// first drawn neighbor along with the direction of its new backtrack cell.
fn step(mask: &Mask, (x, y): (i64, i64), backtrack: usize) -> Option<((i64, i64), usize)> {
    (1..=8).map(|i| (backtrack + i) % 8).find_map(|dir| {
        let (dx, dy) = NEIGHBORS[dir];
        let next = (x + dx, y + dy);
        if !mask.is_set(next.0, next.1) {
            return None;
        }
        let (px, py) = NEIGHBORS[(dir + 7) % 8];
        let relative = (px - dx, py - dy);
        NEIGHBORS
            .iter()
            .position(|offset| *offset == relative)
            .map(|back| (next, back))
    })
}

fn trace(mask: &Mask, start: (i64, i64), region_size: usize) -> Vec<Point> {
    let point = |(x, y): (i64, i64)| Point::new(x as u32, y as u32);
    let mut contour = vec![point(start)];

    let (mut current, mut backtrack) = match step(mask, start, WEST) {
        Some(next) => next,
        None => return contour,
    };
    let second = current;

    // A boundary pixel is entered at most once from each side
    for _ in 0..8 * region_size {
        let Some((next, next_backtrack)) = step(mask, current, backtrack) else {
            break;
        };
        if current == start && next == second {
            break;
        }
        contour.push(point(current));
        current = next;
        backtrack = next_backtrack;
    }
    contour
}
