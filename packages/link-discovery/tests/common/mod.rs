//! Shared Postgres container for store tests.
//!
//! One container starts per test binary and every test gets its own database,
//! so tests run in parallel without seeing each other's rows. When Docker is
//! not reachable `fresh_database` returns `None` and the caller skips.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use tracing_subscriber::EnvFilter;

struct SharedPostgres {
    _container: ContainerAsync<Postgres>,
    base_url: String,
}

static SHARED_POSTGRES: OnceCell<Option<SharedPostgres>> = OnceCell::const_new();

async fn start_postgres() -> Option<SharedPostgres> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let container = match Postgres::default().with_tag("16").start().await {
        Ok(container) => container,
        Err(e) => {
            tracing::warn!(error = %e, "docker unavailable, skipping postgres store tests");
            return None;
        }
    };

    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    Some(SharedPostgres {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: container,
    })
}

/// A new empty database, with the crate's migrations applied when `migrated`.
pub async fn fresh_database(migrated: bool) -> Option<PgPool> {
    let shared = SHARED_POSTGRES.get_or_init(start_postgres).await.as_ref()?;
    let name = format!("link_discovery_{}", uuid::Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&format!("{}/postgres", shared.base_url))
        .await
        .expect("connect to postgres");
    sqlx::raw_sql(&format!("CREATE DATABASE {name}"))
        .execute(&admin)
        .await
        .expect("create test database");
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&format!("{}/{name}", shared.base_url))
        .await
        .expect("connect to test database");

    if migrated {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("run migrations");
    }

    Some(pool)
}
