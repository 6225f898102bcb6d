//! Integer geometry shared by drawing commands and the window server

/// A point in drawable-local or screen coordinates
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    #[inline]
    pub fn add(self, other: Point) -> Self {
        self.offset(other.x, other.y)
    }
}

/// Width and height in pixels
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }
}

/// A rectangle described by its top-left corner and size
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    #[inline]
    pub const fn from_parts(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.origin.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.origin.y
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.size.height
    }

    /// Exclusive right edge
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.origin.x + self.size.width
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.origin.y + self.size.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < self.max_x() && p.y < self.max_y()
    }

    #[inline]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            origin: self.origin.offset(dx, dy),
            size: self.size,
        }
    }

    /// Overlapping area, or `None` when the rects do not touch
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x().max(other.x());
        let y0 = self.y().max(other.y());
        let x1 = self.max_x().min(other.max_x());
        let y1 = self.max_y().min(other.max_y());
        if x0 >= x1 || y0 >= y1 {
            None
        } else {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }

    /// Bounding box of both rects
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.x().min(other.x());
        let y0 = self.y().min(other.y());
        let x1 = self.max_x().max(other.max_x());
        let y1 = self.max_y().max(other.max_y());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Clip to a `width` x `height` area anchored at the origin
    #[inline]
    pub fn clip_to(&self, bounds: Size) -> Option<Rect> {
        self.intersection(&Rect::from_parts(Point::ZERO, bounds))
    }
}
