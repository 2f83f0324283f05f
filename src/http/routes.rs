use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{reply::Reply, Filter, Rejection};

use crate::{
    actions::RelationKind,
    constants::MAX_BODY_BYTES,
    form::{LoginForm, RecipeForm, RegisterForm},
    middleware::{with_possible_session, with_session},
    schema::Id,
};

use super::{
    handlers::{self, IngredientQuery},
    Context,
};

fn with_context(ctx: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// `/{parent}/{id}/{leaf}` for each relation kind.
pub fn relation_path(kind: RelationKind) -> (&'static str, &'static str) {
    match kind {
        RelationKind::Favorite => ("recipes", "favorite"),
        RelationKind::Cart => ("recipes", "shopping_cart"),
        RelationKind::Subscription => ("users", "subscribe"),
    }
}

fn relation_routes(
    kind: RelationKind,
    ctx: Context,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let (parent, leaf) = relation_path(kind);
    let path = warp::path(parent)
        .and(warp::path::param::<Id>())
        .and(warp::path(leaf))
        .and(warp::path::end());
    let kind = warp::any().map(move || kind);

    let add = path
        .clone()
        .and(warp::post())
        .and(with_session(ctx.secret.clone()))
        .and(with_context(ctx.clone()))
        .and(kind.clone())
        .and_then(handlers::add_relation);

    let remove = path
        .and(warp::delete())
        .and(with_session(ctx.secret.clone()))
        .and(with_context(ctx))
        .and(kind)
        .and_then(handlers::remove_relation);

    add.or(remove)
}

fn recipe_routes(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(ctx.secret.clone()))
        .and(json_body::<RecipeForm>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(ctx.secret.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::download_shopping_cart);

    let detail = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(ctx.secret.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipe_detail);

    let update = warp::path!("recipes" / Id)
        .and(warp::patch())
        .and(with_session(ctx.secret.clone()))
        .and(json_body::<RecipeForm>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_session(ctx.secret.clone()))
        .and(with_context(ctx))
        .and_then(handlers::remove_recipe);

    create.or(download).or(detail).or(update).or(delete)
}

fn catalog_routes(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let tags = warp::path!("tags")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handlers::tags);

    let tag = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handlers::tag);

    let ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientQuery>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::ingredients);

    let ingredient = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handlers::ingredient);

    tags.or(tag).or(ingredients).or(ingredient)
}

fn user_routes(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body::<LoginForm>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::login);

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body::<RegisterForm>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::register);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_session(ctx.secret.clone()))
        .and(with_context(ctx))
        .and_then(handlers::subscriptions);

    login.or(register).or(subscriptions)
}

/// Every endpoint of the service. Pair with `recover(handle_rejection)`.
pub fn routes(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    recipe_routes(ctx.clone())
        .or(relation_routes(RelationKind::Favorite, ctx.clone()))
        .or(relation_routes(RelationKind::Cart, ctx.clone()))
        .or(relation_routes(RelationKind::Subscription, ctx.clone()))
        .or(catalog_routes(ctx.clone()))
        .or(user_routes(ctx))
        .with(warp::log("recipebook"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_paths_are_distinct() {
        let paths = [
            relation_path(RelationKind::Favorite),
            relation_path(RelationKind::Cart),
            relation_path(RelationKind::Subscription),
        ];
        assert_eq!(
            paths,
            [
                ("recipes", "favorite"),
                ("recipes", "shopping_cart"),
                ("users", "subscribe"),
            ]
        );
    }
}
