use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Row, ToSql};

use crate::config::SortOrder;
use crate::database::{fetch_all, fetch_one, get_connection, insert_returning_id, queries, DbPool};
use crate::error::{AppError, AppResult};
use crate::geo::{SpatialPredicate, StorePredicate};
use crate::models::{GeoPoint, NewPoint, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    /// `None` leaves rows in insertion order.
    pub sort: Option<SortOrder>,
    pub skip: u64,
    pub limit: u64,
}

/// Persistent collection of geo-tagged points.
pub trait PointStore: Send + Sync {
    fn count(&self, predicate: &StorePredicate) -> AppResult<u64>;

    fn find(&self, predicate: &StorePredicate, options: FindOptions) -> AppResult<Vec<Point>>;

    /// Every match in insertion order. More than `max` matches is an error,
    /// never a silent truncation.
    fn find_all(&self, predicate: &StorePredicate, max: u64) -> AppResult<Vec<Point>>;

    fn insert(&self, point: &NewPoint) -> AppResult<Point>;

    fn insert_many(&self, points: &[NewPoint]) -> AppResult<usize>;

    /// Maintenance only; the feed never deletes.
    fn clear(&self) -> AppResult<usize>;
}

#[derive(Clone)]
pub struct SqlitePointStore {
    pool: DbPool,
}

impl SqlitePointStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn where_clause(predicate: &StorePredicate) -> (String, Vec<Value>) {
    let (mut clause, mut values) = match &predicate.spatial {
        SpatialPredicate::WithinSphere {
            center_lng,
            center_lat,
            radius_radians,
        } => (
            queries::points::WITHIN_SPHERE.to_string(),
            vec![
                Value::Real(*center_lng),
                Value::Real(*center_lat),
                Value::Real(*radius_radians),
            ],
        ),
        SpatialPredicate::WithinBox(rect) => (
            queries::points::WITHIN_BOX.to_string(),
            vec![
                Value::Real(rect.sw_lng),
                Value::Real(rect.ne_lng),
                Value::Real(rect.sw_lat),
                Value::Real(rect.ne_lat),
            ],
        ),
    };

    if let Some(category) = &predicate.category {
        clause.push_str(" AND ");
        clause.push_str(queries::points::CATEGORY_EQ);
        values.push(Value::Text(category.clone()));
    }

    (clause, values)
}

fn order_clause(sort: Option<SortOrder>) -> &'static str {
    match sort {
        Some(SortOrder::Popularity) => queries::points::ORDER_POPULARITY,
        Some(SortOrder::Recent) => queries::points::ORDER_RECENT,
        None => queries::points::ORDER_INSERTION,
    }
}

fn as_params(values: &[Value]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v as &dyn ToSql).collect()
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn map_point_row(row: &Row<'_>) -> rusqlite::Result<Point> {
    Ok(Point {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        location: GeoPoint {
            longitude: row.get(5)?,
            latitude: row.get(6)?,
        },
        likes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl PointStore for SqlitePointStore {
    fn count(&self, predicate: &StorePredicate) -> AppResult<u64> {
        let conn = get_connection(&self.pool)?;
        let (clause, values) = where_clause(predicate);
        let sql = format!("SELECT COUNT(*) FROM points WHERE {}", clause);

        let count: i64 = fetch_one(&conn, &sql, &as_params(&values), |row| row.get(0))?.unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    fn find(&self, predicate: &StorePredicate, options: FindOptions) -> AppResult<Vec<Point>> {
        let conn = get_connection(&self.pool)?;
        let (clause, mut values) = where_clause(predicate);
        let sql = format!(
            "SELECT {} FROM points WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            queries::points::COLUMNS,
            clause,
            order_clause(options.sort)
        );
        values.push(Value::Integer(to_sql_int(options.limit)));
        values.push(Value::Integer(to_sql_int(options.skip)));

        let points = fetch_all(&conn, &sql, &as_params(&values), map_point_row)?;
        Ok(points)
    }

    fn find_all(&self, predicate: &StorePredicate, max: u64) -> AppResult<Vec<Point>> {
        let points = {
            let conn = get_connection(&self.pool)?;
            let (clause, mut values) = where_clause(predicate);
            let sql = format!(
                "SELECT {} FROM points WHERE {} ORDER BY {} LIMIT ?",
                queries::points::COLUMNS,
                clause,
                queries::points::ORDER_INSERTION
            );
            values.push(Value::Integer(to_sql_int(max.saturating_add(1))));

            let rows = fetch_all(&conn, &sql, &as_params(&values), map_point_row)?;
            rows
        };

        if points.len() as u64 > max {
            let count = self.count(predicate)?;
            return Err(AppError::ResultSetTooLarge { count, limit: max });
        }

        Ok(points)
    }

    fn insert(&self, point: &NewPoint) -> AppResult<Point> {
        let conn = get_connection(&self.pool)?;
        let created_at = now_timestamp();

        let id = insert_returning_id(
            &conn,
            queries::points::INSERT,
            &[
                &point.title,
                &point.author,
                &point.description,
                &point.category,
                &point.location.longitude,
                &point.location.latitude,
                &point.likes,
                &created_at,
            ],
        )?;

        Ok(Point {
            id,
            title: point.title.clone(),
            author: point.author.clone(),
            description: point.description.clone(),
            category: point.category.clone(),
            location: point.location,
            likes: point.likes,
            created_at,
        })
    }

    fn insert_many(&self, points: &[NewPoint]) -> AppResult<usize> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn.transaction()?;
        let created_at = now_timestamp();

        {
            let mut stmt = tx.prepare(queries::points::INSERT)?;
            for point in points {
                stmt.execute(params![
                    point.title,
                    point.author,
                    point.description,
                    point.category,
                    point.location.longitude,
                    point.location.latitude,
                    point.likes,
                    created_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(points.len())
    }

    fn clear(&self) -> AppResult<usize> {
        let conn = get_connection(&self.pool)?;
        let removed = conn.execute(queries::points::DELETE_ALL, [])?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{build_predicate, Circle, QueryWindow, Rectangle, Shape};
    use crate::test_utils::{create_test_store, insert_test_point};

    fn box_predicate(category: Option<&str>) -> StorePredicate {
        StorePredicate {
            spatial: SpatialPredicate::WithinBox(Rectangle {
                sw_lng: 103.9,
                sw_lat: 29.0,
                ne_lng: 104.1,
                ne_lat: 31.0,
            }),
            category: category.map(str::to_string),
        }
    }

    fn popular(skip: u64, limit: u64) -> FindOptions {
        FindOptions {
            sort: Some(SortOrder::Popularity),
            skip,
            limit,
        }
    }

    #[test]
    fn test_insert_assigns_id_and_timestamp() {
        let store = create_test_store();
        let point = store
            .insert(&NewPoint::new("天府广场", "hot", 104.066801, 30.657401).with_author("倪瑜"))
            .unwrap();

        assert!(point.id > 0);
        assert_eq!(point.likes, 0);
        assert_eq!(point.author.as_deref(), Some("倪瑜"));
        assert!(chrono::DateTime::parse_from_rfc3339(&point.created_at).is_ok());

        let found = store.find(&box_predicate(None), popular(0, 10)).unwrap();
        assert_eq!(found, vec![point]);
    }

    #[test]
    fn test_box_filter_is_closed_and_excludes_outside() {
        let store = create_test_store();
        let inside = insert_test_point(&store, "inside", "hot", 104.0, 30.0, 5);
        let edge = insert_test_point(&store, "edge", "hot", 104.1, 31.0, 1);
        insert_test_point(&store, "far", "hot", 110.0, 25.0, 100);

        assert_eq!(store.count(&box_predicate(None)).unwrap(), 2);

        let ids: Vec<i64> = store
            .find(&box_predicate(None), popular(0, 10))
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![inside, edge]);
    }

    #[test]
    fn test_sphere_filter_matches_radius() {
        let store = create_test_store();
        let jinli = insert_test_point(&store, "锦里", "hot", 104.0652, 30.5728, 520);
        let ifs = insert_test_point(&store, "环球中心", "exhibition", 104.0668, 30.5684, 380);
        insert_test_point(&store, "宽窄巷子", "personal", 104.0665, 30.6727, 450);

        let window = QueryWindow {
            shape: Shape::Circle(Circle {
                center_lng: 104.0660,
                center_lat: 30.5700,
                radius_meters: 5000.0,
            }),
            category: None,
            page: 1,
            page_size: 10,
        };
        let predicate = build_predicate(&window);

        assert_eq!(store.count(&predicate).unwrap(), 2);
        let mut ids: Vec<i64> = store
            .find(&predicate, popular(0, 10))
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![jinli, ifs]);
    }

    #[test]
    fn test_category_filter_exact_match() {
        let store = create_test_store();
        insert_test_point(&store, "a", "hot", 104.0, 30.0, 1);
        let b = insert_test_point(&store, "b", "exhibition", 104.0, 30.1, 1);

        let found = store.find(&box_predicate(Some("exhibition")), popular(0, 10)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, b);
        assert_eq!(store.count(&box_predicate(Some("Exhibition"))).unwrap(), 0);
    }

    #[test]
    fn test_popularity_order_category_then_likes() {
        let store = create_test_store();
        let hot_low = insert_test_point(&store, "hot low", "hot", 104.0, 30.0, 1);
        let exhibition = insert_test_point(&store, "exhibition", "exhibition", 104.0, 30.0, 999);
        let hot_high = insert_test_point(&store, "hot high", "hot", 104.0, 30.0, 50);
        let hot_tie = insert_test_point(&store, "hot tie", "hot", 104.0, 30.0, 50);

        let ids: Vec<i64> = store
            .find(&box_predicate(None), popular(0, 10))
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();

        // "hot" > "exhibition"; equal likes fall back to newest, then highest id
        assert_eq!(ids, vec![hot_tie, hot_high, hot_low, exhibition]);
    }

    #[test]
    fn test_recent_order() {
        let store = create_test_store();
        let first = insert_test_point(&store, "first", "hot", 104.0, 30.0, 100);
        let second = insert_test_point(&store, "second", "exhibition", 104.0, 30.0, 1);

        let ids: Vec<i64> = store
            .find(
                &box_predicate(None),
                FindOptions {
                    sort: Some(SortOrder::Recent),
                    skip: 0,
                    limit: 10,
                },
            )
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_consecutive_pages_are_disjoint_and_complete() {
        let store = create_test_store();
        for i in 0..25 {
            insert_test_point(&store, &format!("p{}", i), "hot", 104.0, 30.0 + i as f64 * 0.01, i % 7);
        }

        let full: Vec<i64> = store
            .find(&box_predicate(None), popular(0, 100))
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(full.len(), 25);

        let mut paged = Vec::new();
        for page in 1..=3u64 {
            let chunk = store.find(&box_predicate(None), popular((page - 1) * 10, 10)).unwrap();
            paged.extend(chunk.iter().map(|p| p.id));
        }
        assert_eq!(paged, full);
    }

    #[test]
    fn test_find_all_respects_ceiling() {
        let store = create_test_store();
        for i in 0..5 {
            insert_test_point(&store, &format!("p{}", i), "hot", 104.0, 30.0, i);
        }

        let all = store.find_all(&box_predicate(None), 5).unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        match store.find_all(&box_predicate(None), 4) {
            Err(AppError::ResultSetTooLarge { count, limit }) => {
                assert_eq!(count, 5);
                assert_eq!(limit, 4);
            }
            other => panic!("expected ResultSetTooLarge, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_insert_many_and_clear() {
        let store = create_test_store();
        let batch = vec![
            NewPoint::new("春熙路", "hot", 104.082855, 30.655822),
            NewPoint::new("杜甫草堂", "exhibition", 104.026392, 30.667458).with_likes(12),
        ];

        assert_eq!(store.insert_many(&batch).unwrap(), 2);
        assert_eq!(store.count(&box_predicate(None)).unwrap(), 2);

        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.count(&box_predicate(None)).unwrap(), 0);
    }
}
