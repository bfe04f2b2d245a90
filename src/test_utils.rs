#![cfg(test)]

use crate::app::create_app;
use crate::config::Config;
use crate::database::{create_memory_pool, init_database, FindOptions, PointStore, SqlitePointStore};
use crate::error::{AppError, AppResult};
use crate::geo::StorePredicate;
use crate::models::{NewPoint, Point};
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory SQLite store with the schema applied
pub fn create_test_store() -> SqlitePointStore {
    let pool = create_memory_pool().expect("Failed to create test database pool");

    let conn = pool.get().expect("Failed to get connection from pool");
    init_database(&conn).expect("Failed to initialize test database schema");
    drop(conn);

    SqlitePointStore::new(pool)
}

/// Test app over a fresh in-memory store
pub fn create_test_app() -> (Router, Arc<SqlitePointStore>) {
    let store = Arc::new(create_test_store());
    let app = create_app(Arc::new(Config::default()), store.clone());
    (app, store)
}

/// Test fixture: insert a point and return its id
pub fn insert_test_point(
    store: &SqlitePointStore,
    title: &str,
    category: &str,
    longitude: f64,
    latitude: f64,
    likes: i64,
) -> i64 {
    store
        .insert(&NewPoint::new(title, category, longitude, latitude).with_likes(likes))
        .expect("Failed to insert test point")
        .id
}

/// Store whose every call fails like a lost database connection.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

impl FailingStore {
    fn fail<T>(&self) -> AppResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Database(rusqlite::Error::InvalidQuery))
    }
}

impl PointStore for FailingStore {
    fn count(&self, _predicate: &StorePredicate) -> AppResult<u64> {
        self.fail()
    }

    fn find(&self, _predicate: &StorePredicate, _options: FindOptions) -> AppResult<Vec<Point>> {
        self.fail()
    }

    fn find_all(&self, _predicate: &StorePredicate, _max: u64) -> AppResult<Vec<Point>> {
        self.fail()
    }

    fn insert(&self, _point: &NewPoint) -> AppResult<Point> {
        self.fail()
    }

    fn insert_many(&self, _points: &[NewPoint]) -> AppResult<usize> {
        self.fail()
    }

    fn clear(&self) -> AppResult<usize> {
        self.fail()
    }
}
