//! Per-request orchestration of the map feed: count, pick a fetch strategy,
//! optionally grid-sample, paginate and wrap everything in the response
//! envelope.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::QueryConfig;
use crate::database::{FindOptions, PointStore};
use crate::error::{AppError, AppResult};
use crate::geo::{build_predicate, DensitySampler, QueryWindow, Rectangle, Shape, StorePredicate};
use crate::models::{DensityInfo, MapDataResponse, Pagination, Point, QueryType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Sorted, paginated fetch straight from the store.
    Direct,
    /// Fetch every match, decimate on a grid, paginate in memory.
    GridSample,
}

#[derive(Clone)]
pub struct PageAssembler {
    store: Arc<dyn PointStore>,
    config: QueryConfig,
}

impl PageAssembler {
    pub fn new(store: Arc<dyn PointStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Only rectangle viewports that overflow a single page are sampled.
    pub fn strategy(&self, window: &QueryWindow, total: u64) -> FetchStrategy {
        match window.shape {
            Shape::Rectangle(_) if total > u64::from(window.page_size) => FetchStrategy::GridSample,
            _ => FetchStrategy::Direct,
        }
    }

    pub fn sample_target(&self, page_size: u32) -> usize {
        page_size as usize * self.config.sample_multiplier.max(1) as usize
    }

    /// Uses the configured seed when there is one, entropy otherwise.
    pub fn assemble(&self, window: &QueryWindow) -> AppResult<MapDataResponse> {
        let mut rng = match self.config.sample_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.assemble_with_rng(window, &mut rng)
    }

    pub fn assemble_with_rng<R: Rng + ?Sized>(&self, window: &QueryWindow, rng: &mut R) -> AppResult<MapDataResponse> {
        let predicate = build_predicate(window);
        let total = self
            .store
            .count(&predicate)
            .map_err(|e| store_failure(e, &predicate, window))?;

        match (self.strategy(window, total), &window.shape) {
            (FetchStrategy::GridSample, Shape::Rectangle(rect)) => {
                self.grid_sample(window, rect, &predicate, total, rng)
            }
            _ => self.direct(window, &predicate, total),
        }
    }

    fn direct(&self, window: &QueryWindow, predicate: &StorePredicate, total: u64) -> AppResult<MapDataResponse> {
        let data = self
            .store
            .find(
                predicate,
                FindOptions {
                    sort: Some(self.config.sort),
                    skip: window.skip(),
                    limit: u64::from(window.page_size),
                },
            )
            .map_err(|e| store_failure(e, predicate, window))?;

        let query_type = match window.shape {
            Shape::Rectangle(_) => QueryType::Bounds,
            Shape::Circle(_) => QueryType::Radius,
        };

        debug!(
            "Direct fetch {}: total={} page={} returned={}",
            predicate,
            total,
            window.page,
            data.len()
        );

        Ok(envelope(window, data, total, total, None, query_type))
    }

    fn grid_sample<R: Rng + ?Sized>(
        &self,
        window: &QueryWindow,
        rect: &Rectangle,
        predicate: &StorePredicate,
        total: u64,
        rng: &mut R,
    ) -> AppResult<MapDataResponse> {
        let limit = self.config.max_sample_candidates;
        if total > limit {
            warn!(
                "Refusing to sample {}: {} candidates exceeds limit of {}",
                predicate, total, limit
            );
            return Err(AppError::ResultSetTooLarge { count: total, limit });
        }

        let candidates = self
            .store
            .find_all(predicate, limit)
            .map_err(|e| store_failure(e, predicate, window))?;

        let sampler = DensitySampler::new(self.sample_target(window.page_size));
        let sampled = sampler.sample(candidates, rect, rng);
        let sampled_count = sampled.len();

        let skip = usize::try_from(window.skip()).unwrap_or(usize::MAX);
        let data: Vec<Point> = sampled
            .into_iter()
            .skip(skip)
            .take(window.page_size as usize)
            .collect();

        debug!(
            "Grid sample {}: total={} target={} sampled={} page={} returned={}",
            predicate,
            total,
            sampler.target_count(),
            sampled_count,
            window.page,
            data.len()
        );

        Ok(envelope(
            window,
            data,
            sampled_count as u64,
            total,
            Some(sampled_count),
            QueryType::GridSample,
        ))
    }
}

/// Store-layer failures are logged with their query context and reduced to
/// `AppError::Store`; anything else passes through untouched.
fn store_failure(err: AppError, predicate: &StorePredicate, window: &QueryWindow) -> AppError {
    if !err.is_store_failure() {
        return err;
    }
    error!(
        "Point store failed for {} (page={}, pageSize={}): {}",
        predicate, window.page, window.page_size, err
    );
    match err {
        AppError::Store(msg) => AppError::Store(msg),
        other => AppError::Store(other.to_string()),
    }
}

fn envelope(
    window: &QueryWindow,
    data: Vec<Point>,
    paged_total: u64,
    total_in_bounds: u64,
    sampled: Option<usize>,
    query_type: QueryType,
) -> MapDataResponse {
    let total_pages = paged_total.div_ceil(u64::from(window.page_size));
    let returned = data.len();

    MapDataResponse {
        success: true,
        data,
        pagination: Pagination {
            total: paged_total,
            total_pages,
            current_page: window.page,
            page_size: window.page_size,
            has_more_data: u64::from(window.page) < total_pages,
        },
        query_type,
        density_info: DensityInfo {
            total_in_bounds,
            returned,
            sampled,
        },
    }
}
