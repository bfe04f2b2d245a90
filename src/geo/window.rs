use crate::constants::EARTH_RADIUS_METERS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center_lng: f64,
    pub center_lat: f64,
    pub radius_meters: f64,
}

impl Circle {
    pub fn radius_radians(&self) -> f64 {
        self.radius_meters / EARTH_RADIUS_METERS
    }
}

/// Axis-aligned box in degrees. `sw_*` is never greater than `ne_*`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub sw_lng: f64,
    pub sw_lat: f64,
    pub ne_lng: f64,
    pub ne_lat: f64,
}

impl Rectangle {
    /// Closed-interval containment, boundary included.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.sw_lng && lng <= self.ne_lng && lat >= self.sw_lat && lat <= self.ne_lat
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Rectangle(Rectangle),
}

/// One validated viewport request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryWindow {
    pub shape: Shape,
    pub category: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl QueryWindow {
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn rectangle(&self) -> Option<&Rectangle> {
        match &self.shape {
            Shape::Rectangle(rect) => Some(rect),
            Shape::Circle(_) => None,
        }
    }
}
