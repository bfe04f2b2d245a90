use crate::error::{AppError, AppResult};
use crate::geo::central_angle;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// SQL name of the great-circle function used by radius queries.
pub const CENTRAL_ANGLE_FN: &str = "central_angle";

/// Registers `central_angle(lng1, lat1, lng2, lat2)`, returning radians.
pub fn register_geo_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CENTRAL_ANGLE_FN,
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(central_angle(
                ctx.get::<f64>(0)?,
                ctx.get::<f64>(1)?,
                ctx.get::<f64>(2)?,
                ctx.get::<f64>(3)?,
            ))
        },
    )
}

fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    register_geo_functions(conn)
}

pub fn create_pool(path: &Path, max_size: u32) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(init_connection);

    Pool::builder()
        .max_size(max_size.max(1))
        .build(manager)
        .map_err(|e| AppError::Internal(format!("Failed to create database pool: {}", e)))
}

/// Single-connection in-memory pool; every pooled connection would otherwise
/// see its own empty database.
pub fn create_memory_pool() -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| register_geo_functions(conn));

    Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| AppError::Internal(format!("Failed to create database pool: {}", e)))
}

pub fn get_connection(pool: &DbPool) -> AppResult<DbConn> {
    pool.get().map_err(AppError::Pool)
}

pub fn fetch_one<T, F>(conn: &DbConn, sql: &str, params: &[&dyn rusqlite::ToSql], mapper: F) -> AppResult<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    match rows.next()? {
        Some(row) => Ok(Some(mapper(row)?)),
        None => Ok(None),
    }
}

pub fn fetch_all<T, F>(conn: &DbConn, sql: &str, params: &[&dyn rusqlite::ToSql], mapper: F) -> AppResult<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, mapper)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn insert_returning_id(conn: &DbConn, sql: &str, params: &[&dyn rusqlite::ToSql]) -> AppResult<i64> {
    conn.execute(sql, params)?;
    Ok(conn.last_insert_rowid())
}
