#![allow(dead_code)]

use recipebook_sdk::{
    actions::{create_ingredient, create_tag, register_user, save_recipe},
    form::{IngredientAmount, RecipeForm, RegisterForm},
    schema::{Id, Ingredient, Recipe, Tag, User},
};
use sqlx::PgPool;

pub async fn user(pool: &PgPool, username: &str) -> User {
    register_user(
        RegisterForm {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password: "correct horse".to_string(),
        },
        pool,
    )
    .await
    .unwrap()
}

pub async fn ingredient(pool: &PgPool, name: &str, unit: &str) -> Ingredient {
    create_ingredient(name, unit, pool).await.unwrap()
}

pub async fn tag(pool: &PgPool, name: &str, slug: &str) -> Tag {
    create_tag(name, "#49B64E", slug, pool).await.unwrap()
}

pub fn form(name: &str, ingredients: &[(Id, i32)], tags: &[Id]) -> RecipeForm {
    RecipeForm {
        name: name.to_string(),
        text: "Mix everything.".to_string(),
        cooking_time: 15,
        image: String::new(),
        tags: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
    }
}

pub async fn recipe(pool: &PgPool, author: &User, ingredients: &[(Id, i32)]) -> Recipe {
    save_recipe(form("Recipe", ingredients, &[]), author.id, None, pool)
        .await
        .unwrap()
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    count
}
