use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    #[schema(example = "espresso")]
    pub name: String,
    #[schema(example = "#6f4e37")]
    pub color: String,
    #[schema(example = 1)]
    pub parts: i64,
}

/// Ingredient as shown on the public menu: no name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: i64,
}

impl From<&Ingredient> for ShortIngredient {
    fn from(value: &Ingredient) -> Self {
        Self {
            color: value.color.clone(),
            parts: value.parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LongDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.iter().map(ShortIngredient::from).collect(),
        }
    }

    pub fn long(&self) -> LongDrink {
        LongDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbDrink {
    pub id: i64,
    pub title: String,
    /// JSON array of ingredients.
    pub recipe: String,
}

impl TryFrom<DbDrink> for Drink {
    type Error = AppError;

    fn try_from(value: DbDrink) -> Result<Self, Self::Error> {
        let recipe = serde_json::from_str(&value.recipe)
            .map_err(|err| AppError::internal(format!("drink {} has an unreadable recipe: {err}", value.id)))?;

        Ok(Drink {
            id: value.id,
            title: value.title,
            recipe,
        })
    }
}

/// A drink that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Clients may send a single ingredient object instead of a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl RecipeInput {
    pub fn into_recipe(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::Many(ingredients) => ingredients,
            RecipeInput::One(ingredient) => vec![ingredient],
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DrinkCreateRequest {
    #[schema(example = "Flat White")]
    pub title: Option<String>,
    #[schema(value_type = Vec<Ingredient>)]
    pub recipe: Option<RecipeInput>,
}

impl DrinkCreateRequest {
    pub fn validate(self) -> Result<NewDrink, AppError> {
        let title = self
            .title
            .ok_or_else(|| AppError::unprocessable("title is required"))?;
        let title = non_empty_title(title)?;
        let recipe = self
            .recipe
            .ok_or_else(|| AppError::unprocessable("recipe is required"))?
            .into_recipe();

        Ok(NewDrink { title, recipe })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DrinkUpdateRequest {
    #[schema(example = "Double Flat White")]
    pub title: Option<String>,
    #[schema(value_type = Option<Vec<Ingredient>>)]
    pub recipe: Option<RecipeInput>,
}

impl DrinkUpdateRequest {
    /// Apply supplied fields to `drink`; absent fields are left as stored.
    pub fn apply_to(self, drink: &mut Drink) -> Result<(), AppError> {
        if let Some(title) = self.title {
            drink.title = non_empty_title(title)?;
        }
        if let Some(recipe) = self.recipe {
            drink.recipe = recipe.into_recipe();
        }
        Ok(())
    }
}

fn non_empty_title(title: String) -> Result<String, AppError> {
    if title.trim().is_empty() {
        return Err(AppError::unprocessable("title must not be empty"));
    }
    Ok(title)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShortDrinksResponse {
    pub success: bool,
    pub drinks: Vec<ShortDrink>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LongDrinksResponse {
    pub success: bool,
    pub drinks: Vec<LongDrink>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    /// Id of the removed drink.
    pub delete: i64,
}
