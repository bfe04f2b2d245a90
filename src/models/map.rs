use serde::{Deserialize, Serialize};

use super::Point;

/// Raw `GET /api/map-data` query string. Everything stays a string so that
/// numeric parsing errors surface as `InvalidParameter` rather than a
/// framework rejection.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDataParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub category: Option<String>,
    pub bounds: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Radius,
    Bounds,
    GridSample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub page_size: u32,
    pub has_more_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityInfo {
    pub total_in_bounds: u64,
    pub returned: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampled: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDataResponse {
    pub success: bool,
    pub data: Vec<Point>,
    pub pagination: Pagination,
    pub query_type: QueryType,
    pub density_info: DensityInfo,
}
