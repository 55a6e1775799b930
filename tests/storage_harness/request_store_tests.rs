//! Macro-generated test suite for `RequestStore` contract validation.
//!
//! The `request_store_tests!` macro generates a test module that validates
//! any `RequestStore` implementation against the listing contract:
//! ingestion, aggregates, conditions, ordering, limits and the
//! distinct-value lookups.
//!
//! # Generated Tests
//!
//! ## Ingestion
//! - `test_fetch_empty`: empty store returns no rows
//! - `test_record_and_fetch`: status code and query counter come back
//! - `test_response_for_unknown_request`: rejected
//!
//! ## Aggregates
//! - `test_db_time_sum`: annotated sum over query timings
//! - `test_db_time_null_without_timings`: no timings → absent, not zero
//! - `test_num_queries_count`
//!
//! ## Conditions
//! - `test_path_equals`
//! - `test_time_taken_narrowing`: absent or negative timings excluded
//! - `test_db_time_narrowing`: absent or negative sums excluded
//! - `test_status_and_method`
//! - `test_started_window`
//!
//! ## Ordering
//! - `test_every_sort_key_respects_limit_and_direction`
//! - `test_most_recent_first`
//! - `test_limit_beyond_signed_range_returns_everything`
//!
//! ## Lookups
//! - `test_distinct_lookups`

/// Generate a `RequestStore` conformance test suite.
///
/// `$factory` must be an expression that evaluates to an instance
/// implementing `RequestStore`. It is re-evaluated for each test to
/// ensure isolation.
#[macro_export]
macro_rules! request_store_tests {
    ($factory:expr) => {
        mod request_store_contract_tests {
            use super::*;
            use chrono::Duration;
            use reqlist::core::preferences::{OrderBy, OrderDir};
            use reqlist::core::query::{Condition, RequestQuery};
            use reqlist::core::record::{RequestRow, ResponseRecord};
            use reqlist::core::store::RequestStore;
            use uuid::Uuid;

            // ==================================================================
            // Ingestion
            // ==================================================================

            #[tokio::test]
            async fn test_fetch_empty() {
                let store = $factory;
                let rows = store.fetch(&RequestQuery::new()).await.unwrap();
                assert!(rows.is_empty());
            }

            #[tokio::test]
            async fn test_record_and_fetch() {
                let store = $factory;
                let id = seed(
                    &store,
                    Fixture::get("/orders")
                        .status(Some(404))
                        .queries(&[Some(1.0), None]),
                )
                .await;

                let rows = store.fetch(&RequestQuery::new()).await.unwrap();
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].request.id, id);
                assert_eq!(rows[0].request.path, "/orders");
                assert_eq!(rows[0].status_code, Some(404));
                assert_eq!(rows[0].request.num_sql_queries, 2);
                // Not annotated
                assert!(rows[0].db_time.is_none());
                assert!(rows[0].num_queries.is_none());
            }

            #[tokio::test]
            async fn test_response_for_unknown_request() {
                let store = $factory;
                let result = store
                    .record_response(ResponseRecord::new(Uuid::new_v4(), 200))
                    .await;
                assert!(result.is_err());
            }

            // ==================================================================
            // Aggregates
            // ==================================================================

            #[tokio::test]
            async fn test_db_time_sum() {
                let store = $factory;
                seed(&store, Fixture::get("/a").queries(&[Some(2.5), Some(4.0), None])).await;

                let rows = store
                    .fetch(&RequestQuery::new().with_db_time())
                    .await
                    .unwrap();
                let db_time = rows[0].db_time.unwrap();
                assert!((db_time - 6.5).abs() < 1e-9);
            }

            #[tokio::test]
            async fn test_db_time_null_without_timings() {
                let store = $factory;
                seed(&store, Fixture::get("/a")).await;
                seed(&store, Fixture::get("/b").queries(&[None])).await;

                let rows = store
                    .fetch(&RequestQuery::new().with_db_time())
                    .await
                    .unwrap();
                assert_eq!(rows.len(), 2);
                assert!(rows.iter().all(|r| r.db_time.is_none()));
            }

            #[tokio::test]
            async fn test_num_queries_count() {
                let store = $factory;
                seed(&store, Fixture::get("/a").queries(&[Some(1.0), None, Some(1.0)])).await;
                seed(&store, Fixture::get("/b")).await;

                let rows = store
                    .fetch(
                        &RequestQuery::new()
                            .filter(Condition::NumQueriesAtLeast(2))
                    )
                    .await
                    .unwrap();
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].request.path, "/a");
                assert_eq!(rows[0].num_queries, Some(3));
            }

            // ==================================================================
            // Conditions
            // ==================================================================

            #[tokio::test]
            async fn test_path_equals() {
                let store = $factory;
                seed_mixed(&store).await;

                let rows = store
                    .fetch(&RequestQuery::new().path_equals("/orders"))
                    .await
                    .unwrap();
                assert_eq!(rows.len(), 2);
                assert!(rows.iter().all(|r| r.request.path == "/orders"));
            }

            #[tokio::test]
            async fn test_time_taken_narrowing() {
                let store = $factory;
                seed_mixed(&store).await;

                let rows = store
                    .fetch(&RequestQuery::new().time_taken_at_least(0.0))
                    .await
                    .unwrap();
                // One request has no timing, one a negative timing
                assert_eq!(rows.len(), 3);
                assert!(rows.iter().all(|r| r.request.time_taken.unwrap() >= 0.0));
            }

            #[tokio::test]
            async fn test_db_time_narrowing() {
                let store = $factory;
                seed_mixed(&store).await;

                let rows = store
                    .fetch(&RequestQuery::new().db_time_at_least(0.0))
                    .await
                    .unwrap();
                let mut paths: Vec<&str> = rows.iter().map(|r| r.request.path.as_str()).collect();
                paths.sort();
                assert_eq!(paths, vec!["/orders", "/orders", "/users"]);
                assert!(rows.iter().all(|r| r.db_time.unwrap() >= 0.0));
            }

            #[tokio::test]
            async fn test_status_and_method() {
                let store = $factory;
                seed_mixed(&store).await;

                let errors = store
                    .fetch(&RequestQuery::new().filter(Condition::StatusCodeEquals(500)))
                    .await
                    .unwrap();
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].request.path, "/orders");

                let posts = store
                    .fetch(
                        &RequestQuery::new()
                            .filter(Condition::MethodEquals("POST".to_string())),
                    )
                    .await
                    .unwrap();
                assert_eq!(posts.len(), 1);
                assert_eq!(posts[0].request.path, "/users");
            }

            #[tokio::test]
            async fn test_started_window() {
                let store = $factory;
                seed_mixed(&store).await;

                let rows = store
                    .fetch(
                        &RequestQuery::new()
                            .filter(Condition::StartedAfter(base_time() + Duration::seconds(90)))
                            .filter(Condition::StartedBefore(base_time() + Duration::seconds(270))),
                    )
                    .await
                    .unwrap();
                let mut minutes: Vec<i64> = rows
                    .iter()
                    .map(|r| (r.request.start_time - base_time()).num_minutes())
                    .collect();
                minutes.sort();
                assert_eq!(minutes, vec![2, 3, 4]);
            }

            // ==================================================================
            // Ordering
            // ==================================================================

            fn sort_value(row: &RequestRow, key: OrderBy) -> f64 {
                match key {
                    OrderBy::StartTime => row.request.start_time.timestamp() as f64,
                    OrderBy::NumSqlQueries => row.request.num_sql_queries as f64,
                    OrderBy::TimeTaken => row.request.time_taken.unwrap(),
                    OrderBy::DbTime => row.db_time.unwrap(),
                    OrderBy::Path => 0.0,
                }
            }

            #[tokio::test]
            async fn test_every_sort_key_respects_limit_and_direction() {
                let store = $factory;
                seed_mixed(&store).await;

                for key in OrderBy::ALL {
                    for dir in [OrderDir::Asc, OrderDir::Desc] {
                        let mut query = RequestQuery::new();
                        if let Some(narrow) = key.narrowing() {
                            query = narrow(query);
                        }
                        let query = query.order_by(key, dir).limit(2);

                        let rows = store.fetch(&query).await.unwrap();
                        assert!(rows.len() <= 2, "{key} {dir:?} returned too many rows");

                        for pair in rows.windows(2) {
                            let (a, b) = (&pair[0], &pair[1]);
                            let ordered = if key == OrderBy::Path {
                                match dir {
                                    OrderDir::Asc => a.request.path <= b.request.path,
                                    OrderDir::Desc => a.request.path >= b.request.path,
                                }
                            } else {
                                match dir {
                                    OrderDir::Asc => sort_value(a, key) <= sort_value(b, key),
                                    OrderDir::Desc => sort_value(a, key) >= sort_value(b, key),
                                }
                            };
                            assert!(ordered, "{key} {dir:?} out of order");
                        }
                    }
                }
            }

            #[tokio::test]
            async fn test_most_recent_first() {
                let store = $factory;
                let ids = seed_mixed(&store).await;

                let rows = store
                    .fetch(
                        &RequestQuery::new()
                            .order_by(OrderBy::StartTime, OrderDir::Desc)
                            .limit(1),
                    )
                    .await
                    .unwrap();
                assert_eq!(rows.len(), 1);
                assert_eq!(Some(&rows[0].request.id), ids.last());
            }

            #[tokio::test]
            async fn test_limit_beyond_signed_range_returns_everything() {
                let store = $factory;
                let ids = seed_mixed(&store).await;

                let rows = store
                    .fetch(
                        &RequestQuery::new()
                            .order_by(OrderBy::StartTime, OrderDir::Desc)
                            .limit(usize::MAX),
                    )
                    .await
                    .unwrap();
                assert_eq!(rows.len(), ids.len());
            }

            // ==================================================================
            // Lookups
            // ==================================================================

            #[tokio::test]
            async fn test_distinct_lookups() {
                let store = $factory;
                seed_mixed(&store).await;

                assert_eq!(
                    store.distinct_paths().await.unwrap(),
                    vec!["/broken", "/health", "/orders", "/users"]
                );
                assert_eq!(
                    store.distinct_view_names().await.unwrap(),
                    vec!["orders-list", "users-create"]
                );
                assert_eq!(
                    store.distinct_status_codes().await.unwrap(),
                    vec![200, 201, 500]
                );
                assert_eq!(
                    store.distinct_methods().await.unwrap(),
                    vec!["DELETE", "GET", "POST"]
                );
            }
        }
    };
}
