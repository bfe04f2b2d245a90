use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{CATEGORY_ALL, DEFAULT_CATEGORY};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub location: GeoPoint,
    pub likes: i64,
    pub created_at: String,
}

/// A point ready for insertion; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoint {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub location: GeoPoint,
    pub likes: i64,
}

impl NewPoint {
    pub fn new(title: &str, category: &str, longitude: f64, latitude: f64) -> Self {
        Self {
            title: title.to_string(),
            author: None,
            description: None,
            category: category.to_string(),
            location: GeoPoint {
                longitude,
                latitude,
            },
            likes: 0,
        }
    }

    pub fn with_likes(mut self, likes: i64) -> Self {
        self.likes = likes;
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePointRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(
        required(message = "lat is required"),
        range(min = -90.0, max = 90.0, message = "lat must be within [-90, 90]")
    )]
    pub lat: Option<f64>,
    #[validate(
        required(message = "lng is required"),
        range(min = -180.0, max = 180.0, message = "lng must be within [-180, 180]")
    )]
    pub lng: Option<f64>,
}

impl CreatePointRequest {
    pub fn into_new_point(self) -> AppResult<NewPoint> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }

        let (Some(latitude), Some(longitude)) = (self.lat, self.lng) else {
            return Err(AppError::Validation("lat and lng are required".to_string()));
        };

        let category = match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() && c != CATEGORY_ALL => c.to_string(),
            _ => DEFAULT_CATEGORY.to_string(),
        };

        Ok(NewPoint {
            title: title.to_string(),
            author: self.author.filter(|a| !a.trim().is_empty()),
            description: self.description,
            category,
            location: GeoPoint {
                longitude,
                latitude,
            },
            likes: 0,
        })
    }
}
