use std::fmt;

use super::{central_angle, QueryWindow, Rectangle, Shape};
use crate::constants::CATEGORY_ALL;
use crate::models::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum SpatialPredicate {
    /// Spherical cap: central angle from the center at most `radius_radians`.
    WithinSphere {
        center_lng: f64,
        center_lat: f64,
        radius_radians: f64,
    },
    WithinBox(Rectangle),
}

/// Storage-neutral filter. Stores translate it into their own query language.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePredicate {
    pub spatial: SpatialPredicate,
    pub category: Option<String>,
}

impl StorePredicate {
    /// Evaluates the predicate against a point in memory.
    pub fn matches(&self, point: &Point) -> bool {
        if let Some(category) = &self.category {
            if point.category != *category {
                return false;
            }
        }

        let (lng, lat) = (point.location.longitude, point.location.latitude);
        match &self.spatial {
            SpatialPredicate::WithinSphere {
                center_lng,
                center_lat,
                radius_radians,
            } => central_angle(*center_lng, *center_lat, lng, lat) <= *radius_radians,
            SpatialPredicate::WithinBox(rect) => rect.contains(lng, lat),
        }
    }
}

impl fmt::Display for StorePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spatial {
            SpatialPredicate::WithinSphere {
                center_lng,
                center_lat,
                radius_radians,
            } => write!(
                f,
                "sphere(center=[{}, {}], radius={:.6}rad)",
                center_lng, center_lat, radius_radians
            )?,
            SpatialPredicate::WithinBox(rect) => write!(
                f,
                "box(sw=[{}, {}], ne=[{}, {}])",
                rect.sw_lng, rect.sw_lat, rect.ne_lng, rect.ne_lat
            )?,
        }
        match &self.category {
            Some(category) => write!(f, " category={}", category),
            None => Ok(()),
        }
    }
}

pub fn build_predicate(window: &QueryWindow) -> StorePredicate {
    let spatial = match &window.shape {
        Shape::Circle(circle) => SpatialPredicate::WithinSphere {
            center_lng: circle.center_lng,
            center_lat: circle.center_lat,
            radius_radians: circle.radius_radians(),
        },
        Shape::Rectangle(rect) => SpatialPredicate::WithinBox(*rect),
    };

    let category = window
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != CATEGORY_ALL)
        .map(str::to_string);

    StorePredicate { spatial, category }
}
