use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::models::drink::{Ingredient, NewDrink};

pub mod drinks;

pub async fn init() -> anyhow::Result<SqlitePool> {
	let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

	let options = SqliteConnectOptions::from_str(&database_url)
		.context("invalid DATABASE_URL")?
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(10)
		.min_connections(1)
		.acquire_timeout(Duration::from_secs(10))
		.connect_with(options)
		.await
		.context("failed to connect to database")?;

	migrate(&pool).await?;

	Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
	sqlx::migrate!()
		.run(pool)
		.await
		.context("failed to run migrations")
}

/// Remove every drink, restart id assignment and store the sample drink.
pub async fn reset(pool: &SqlitePool) -> anyhow::Result<()> {
	let mut tx = pool.begin().await?;
	sqlx::query("DELETE FROM drinks").execute(&mut *tx).await?;
	// sqlite_sequence only exists once an AUTOINCREMENT row has been written
	let has_sequence = sqlx::query_scalar::<_, i64>(
		"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
	)
	.fetch_one(&mut *tx)
	.await?;
	if has_sequence > 0 {
		sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'drinks'")
			.execute(&mut *tx)
			.await?;
	}
	tx.commit().await?;

	seed(pool).await
}

pub async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
	let water = NewDrink {
		title: "water".to_string(),
		recipe: vec![Ingredient {
			name: "water".to_string(),
			color: "blue".to_string(),
			parts: 1,
		}],
	};

	let drink = drinks::insert(pool, &water)
		.await
		.context("failed to insert sample drink")?;
	tracing::info!(drink_id = drink.id, title = %drink.title, "seeded sample drink");

	Ok(())
}
