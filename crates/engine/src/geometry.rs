/// Polygons with more points than this are treated as malformed input.
pub const MAX_POLYGON_POINTS: usize = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle with a top-left origin, y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered_on(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.right(), self.y),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.x, self.bottom()),
        ]
    }

    /// Half-open containment: left/top edges are inside, right/bottom are not.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    fn contains_point_inclusive(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    fn edges(&self) -> [(Vec2, Vec2); 4] {
        let [a, b, c, d] = self.corners();
        [(a, b), (b, c), (c, d), (d, a)]
    }
}

/// Implicitly closed point loop; the last point connects back to the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fewer than two points, or more than [`MAX_POLYGON_POINTS`].
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || self.points.len() > MAX_POLYGON_POINTS
    }

    pub fn scaled(&self, scale: f32) -> Polygon {
        Polygon {
            points: self
                .points
                .iter()
                .map(|point| Vec2::new(point.x * scale, point.y * scale))
                .collect(),
        }
    }

    fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let count = self.points.len();
        (0..count).map(move |index| (self.points[index], self.points[(index + 1) % count]))
    }
}

/// Even-odd ray cast toward +x. Polygons with fewer than 3 points never contain.
pub fn point_in_polygon(point: Vec2, polygon: &Polygon) -> bool {
    let points = polygon.points();
    if points.len() < 3 || points.len() > MAX_POLYGON_POINTS {
        return false;
    }

    let mut inside = false;
    let mut previous = points[points.len() - 1];
    for &current in points {
        if (current.y > point.y) != (previous.y > point.y) {
            let crossing_x =
                (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y)
                    + current.x;
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

/// Closed-segment intersection, including touching endpoints and collinear overlap.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1 == 0.0 && within_bounds(b1, b2, a1))
        || (d2 == 0.0 && within_bounds(b1, b2, a2))
        || (d3 == 0.0 && within_bounds(a1, a2, b1))
        || (d4 == 0.0 && within_bounds(a1, a2, b2))
}

/// Corner containment, then edge crossing, then polygon vertices inside the rectangle.
/// The last leg catches obstacles smaller than the rectangle itself.
pub fn rect_intersects_polygon(rect: Rect, polygon: &Polygon) -> bool {
    if polygon.is_degenerate() {
        return false;
    }

    if rect_corners_in_polygon(rect, polygon) {
        return true;
    }

    let rect_edges = rect.edges();
    for (p1, p2) in polygon.edges() {
        if rect_edges
            .iter()
            .any(|&(r1, r2)| segments_intersect(p1, p2, r1, r2))
        {
            return true;
        }
    }

    polygon
        .points()
        .iter()
        .any(|&point| rect.contains_point_inclusive(point))
}

/// True when any of the rectangle's four corners lies inside the polygon.
pub fn rect_corners_in_polygon(rect: Rect, polygon: &Polygon) -> bool {
    if polygon.is_degenerate() {
        return false;
    }
    rect.corners()
        .iter()
        .any(|&corner| point_in_polygon(corner, polygon))
}

/// Strict overlap; rectangles that only share an edge do not intersect.
pub fn rect_intersects_rect(a: Rect, b: Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn straddles(first: f32, second: f32) -> bool {
    (first > 0.0 && second < 0.0) || (first < 0.0 && second > 0.0)
}

fn within_bounds(a: Vec2, b: Vec2, point: Vec2) -> bool {
    point.x >= a.x.min(b.x)
        && point.x <= a.x.max(b.x)
        && point.y >= a.y.min(b.y)
        && point.y <= a.y.max(b.y)
}
