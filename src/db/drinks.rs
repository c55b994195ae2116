//! Drink persistence.
//!
//! Each mutation runs in its own transaction. An early return drops the
//! transaction, which rolls it back and releases the connection.

use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};
use crate::models::drink::{DbDrink, Drink, Ingredient, NewDrink};

pub async fn list(pool: &SqlitePool) -> AppResult<Vec<Drink>> {
    let rows = sqlx::query_as::<_, DbDrink>("SELECT id, title, recipe FROM drinks ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(Drink::try_from).collect()
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Option<Drink>> {
    sqlx::query_as::<_, DbDrink>("SELECT id, title, recipe FROM drinks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Drink::try_from)
        .transpose()
}

pub async fn insert(pool: &SqlitePool, drink: &NewDrink) -> AppResult<Drink> {
    let recipe = encode_recipe(&drink.recipe)?;

    let mut tx = pool.begin().await?;
    let result = sqlx::query("INSERT INTO drinks (title, recipe) VALUES (?, ?)")
        .bind(&drink.title)
        .bind(&recipe)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Drink {
        id: result.last_insert_rowid(),
        title: drink.title.clone(),
        recipe: drink.recipe.clone(),
    })
}

pub async fn update(pool: &SqlitePool, drink: &Drink) -> AppResult<()> {
    let recipe = encode_recipe(&drink.recipe)?;

    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE drinks SET title = ?, recipe = ? WHERE id = ?")
        .bind(&drink.title)
        .bind(&recipe)
        .bind(drink.id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("drink {}", drink.id)));
    }
    tx.commit().await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, drink: &Drink) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM drinks WHERE id = ?")
        .bind(drink.id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("drink {}", drink.id)));
    }
    tx.commit().await?;

    Ok(())
}

fn encode_recipe(recipe: &[Ingredient]) -> AppResult<String> {
    serde_json::to_string(recipe).map_err(|err| AppError::internal(format!("failed to encode recipe: {err}")))
}
