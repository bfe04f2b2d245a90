use serde::Deserialize;

use super::{Circle, QueryWindow, Rectangle, Shape};
use crate::config::QueryConfig;
use crate::constants::CATEGORY_ALL;
use crate::error::{AppError, AppResult};
use crate::models::MapDataParams;

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct BoundsParam {
    northeast: LatLng,
    southwest: LatLng,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(name: &str, raw: &str) -> AppResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::InvalidParameter(format!("{} must be a number", name)))
}

fn parse_integer(name: &str, raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidParameter(format!("{} must be an integer", name)))
}

fn in_range(lng: f64, lat: f64) -> bool {
    (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)
}

fn parse_bounds(raw: &str) -> AppResult<Rectangle> {
    let bounds: BoundsParam = serde_json::from_str(raw).map_err(|e| {
        AppError::InvalidBounds(format!(
            "bounds must be JSON with northeast/southwest latitude and longitude: {}",
            e
        ))
    })?;

    let rect = Rectangle {
        sw_lng: bounds.southwest.longitude,
        sw_lat: bounds.southwest.latitude,
        ne_lng: bounds.northeast.longitude,
        ne_lat: bounds.northeast.latitude,
    };

    if !in_range(rect.sw_lng, rect.sw_lat) || !in_range(rect.ne_lng, rect.ne_lat) {
        return Err(AppError::InvalidBounds(
            "bounds coordinates out of range".to_string(),
        ));
    }
    if rect.sw_lat > rect.ne_lat || rect.sw_lng > rect.ne_lng {
        return Err(AppError::InvalidBounds(
            "southwest corner must not lie north or east of northeast corner".to_string(),
        ));
    }

    Ok(rect)
}

fn parse_circle(params: &MapDataParams, config: &QueryConfig) -> AppResult<Shape> {
    let (lat, lng) = match (present(&params.lat), present(&params.lng)) {
        (None, None) => return Err(AppError::MissingLocation),
        (Some(lat), Some(lng)) => (parse_number("lat", lat)?, parse_number("lng", lng)?),
        _ => {
            return Err(AppError::InvalidParameter(
                "lat and lng must be provided together".to_string(),
            ))
        }
    };

    if !in_range(lng, lat) {
        return Err(AppError::InvalidParameter(
            "lat/lng out of range".to_string(),
        ));
    }

    let radius_meters = match present(&params.radius) {
        Some(raw) => parse_number("radius", raw)?,
        None => config.default_radius_meters,
    };
    if radius_meters < 0.0 {
        return Err(AppError::InvalidParameter(
            "radius must not be negative".to_string(),
        ));
    }

    Ok(Shape::Circle(Circle {
        center_lng: lng,
        center_lat: lat,
        radius_meters,
    }))
}

/// Turns raw query parameters into a `QueryWindow`.
///
/// `bounds` wins over `lat`/`lng`/`radius`: when it is present the circle
/// parameters are not looked at at all.
pub fn validate_query(params: &MapDataParams, config: &QueryConfig) -> AppResult<QueryWindow> {
    let shape = match present(&params.bounds) {
        Some(raw) => Shape::Rectangle(parse_bounds(raw)?),
        None => parse_circle(params, config)?,
    };

    let page = match present(&params.page) {
        Some(raw) => parse_integer("page", raw)?,
        None => 1,
    };
    let page_size = match present(&params.page_size) {
        Some(raw) => parse_integer("pageSize", raw)?,
        None => i64::from(config.default_page_size),
    };

    let max_page_size = config.max_page_size.max(1);
    let page = page.clamp(1, i64::from(u32::MAX)) as u32;
    let page_size = page_size.clamp(1, i64::from(max_page_size)) as u32;

    let category = present(&params.category)
        .filter(|c| *c != CATEGORY_ALL)
        .map(str::to_string);

    Ok(QueryWindow {
        shape,
        category,
        page,
        page_size,
    })
}
