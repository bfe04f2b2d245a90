//! Viewport handling: request validation, predicate construction and
//! density sampling for the map feed.

pub mod filter;
pub mod sampler;
pub mod validate;
mod window;

pub use filter::{build_predicate, SpatialPredicate, StorePredicate};
pub use sampler::{DensitySampler, SampleGrid};
pub use validate::validate_query;
pub use window::*;

/// Great-circle central angle between two coordinates, in radians.
pub fn central_angle(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * a.sqrt().min(1.0).asin()
}
