use warp::{
    http::{header, StatusCode},
    reply::{self, Reply},
    Rejection,
};

use crate::{
    actions::{
        aggregate_cart, delete_recipe, get_ingredient, get_recipe_detail, get_recipe_mut,
        get_recipe_preview, get_tag, get_user_by_id, list_subscriptions, login_user,
        register_user, save_recipe, RelationKind,
    },
    authentication::permissions::ActionType,
    cache::cache::{cached_ingredient_search, cached_tags},
    constants::SHOPPING_LIST_FILENAME,
    error::ActionError,
    form::{LoginForm, RecipeForm, RegisterForm},
    jwt::SessionData,
    schema::{Id, UserProfile},
    shopping_list::ShoppingList,
};

use super::{rejection::OrReject, Context};

// Recipes

pub async fn create_recipe(
    session: SessionData,
    form: RecipeForm,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::CreateRecipes).or_reject()?;

    let recipe = save_recipe(form, session.user_id, None, &ctx.pool).await.or_reject()?;
    let detail = get_recipe_detail(recipe.id, Some(session.user_id), &ctx.pool)
        .await
        .or_reject()?;

    Ok(reply::with_status(reply::json(&detail), StatusCode::CREATED))
}

pub async fn update_recipe(
    id: Id,
    session: SessionData,
    form: RecipeForm,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = get_recipe_mut(id, &session, &ctx.pool).await.or_reject()?;

    save_recipe(form, recipe.author_id, Some(recipe.id), &ctx.pool)
        .await
        .or_reject()?;
    let detail = get_recipe_detail(recipe.id, Some(session.user_id), &ctx.pool)
        .await
        .or_reject()?;

    Ok(reply::json(&detail))
}

pub async fn recipe_detail(
    id: Id,
    session: Option<SessionData>,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let detail = get_recipe_detail(id, viewer, &ctx.pool).await.or_reject()?;

    Ok(reply::json(&detail))
}

pub async fn remove_recipe(
    id: Id,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = get_recipe_mut(id, &session, &ctx.pool).await.or_reject()?;
    delete_recipe(recipe.id, &ctx.pool).await.or_reject()?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart).or_reject()?;

    let list = aggregate_cart(session.user_id, &ctx.pool).await.or_reject()?;

    Ok(shopping_list_attachment(&list))
}

/// The rendered list as a plain text download.
pub fn shopping_list_attachment(list: &ShoppingList) -> impl Reply {
    reply::with_header(
        reply::with_header(list.render(), header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    )
}

// Favorites, cart and subscriptions

pub async fn add_relation(
    target_id: Id,
    session: SessionData,
    ctx: Context,
    kind: RelationKind,
) -> Result<impl Reply, Rejection> {
    session.authenticate(kind.action()).or_reject()?;

    let record = crate::actions::add_relation(kind, session.user_id, target_id, &ctx.pool)
        .await
        .or_reject()?;

    let body = match kind {
        RelationKind::Favorite | RelationKind::Cart => {
            let preview = get_recipe_preview(record.target_id, &ctx.pool)
                .await
                .or_reject()?
                .ok_or_else(|| ActionError::not_found("Recipe doesn't exist"))
                .or_reject()?;
            reply::json(&preview)
        }
        RelationKind::Subscription => {
            let author = get_user_by_id(&ctx.pool, record.target_id)
                .await
                .or_reject()?
                .ok_or_else(|| ActionError::not_found("User doesn't exist"))
                .or_reject()?;
            reply::json(&UserProfile::from_user(author, true))
        }
    };

    Ok(reply::with_status(body, StatusCode::CREATED))
}

pub async fn remove_relation(
    target_id: Id,
    session: SessionData,
    ctx: Context,
    kind: RelationKind,
) -> Result<impl Reply, Rejection> {
    session.authenticate(kind.action()).or_reject()?;

    crate::actions::remove_relation(kind, session.user_id, target_id, &ctx.pool)
        .await
        .or_reject()?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(session: SessionData, ctx: Context) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions).or_reject()?;

    let authors = list_subscriptions(session.user_id, &ctx.pool).await.or_reject()?;

    Ok(reply::json(&authors))
}

// Tags and ingredients

pub async fn tags(mut ctx: Context) -> Result<impl Reply, Rejection> {
    let tags = cached_tags(&ctx.pool, &mut ctx.cache).await.or_reject()?;

    Ok(reply::json(&tags))
}

pub async fn tag(id: Id, ctx: Context) -> Result<impl Reply, Rejection> {
    let tag = get_tag(id, &ctx.pool)
        .await
        .or_reject()?
        .ok_or_else(|| ActionError::NotFound(format!("Tag {id} doesn't exist")))
        .or_reject()?;

    Ok(reply::json(&tag))
}

pub async fn ingredients(
    query: IngredientQuery,
    mut ctx: Context,
) -> Result<impl Reply, Rejection> {
    let prefix = query.name.unwrap_or_default();
    let list = cached_ingredient_search(&prefix, &ctx.pool, &mut ctx.cache)
        .await
        .or_reject()?;

    Ok(reply::json(&list))
}

pub async fn ingredient(id: Id, ctx: Context) -> Result<impl Reply, Rejection> {
    let ingredient = get_ingredient(id, &ctx.pool)
        .await
        .or_reject()?
        .ok_or_else(|| ActionError::NotFound(format!("Ingredient {id} doesn't exist")))
        .or_reject()?;

    Ok(reply::json(&ingredient))
}

#[derive(serde::Deserialize, Debug, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

// Users

pub async fn login(form: LoginForm, ctx: Context) -> Result<impl Reply, Rejection> {
    let token = login_user(
        form,
        &ctx.secret,
        ctx.config.session_lifetime_hours,
        &ctx.pool,
    )
    .await
    .or_reject()?;

    Ok(reply::json(&serde_json::json!({ "auth_token": token })))
}

pub async fn register(form: RegisterForm, ctx: Context) -> Result<impl Reply, Rejection> {
    let user = register_user(form, &ctx.pool).await.or_reject()?;

    Ok(reply::with_status(
        reply::json(&UserProfile::from_user(user, false)),
        StatusCode::CREATED,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CartIngredient;

    #[tokio::test]
    async fn shopping_list_is_sent_as_attachment() {
        let list = ShoppingList::aggregate(vec![
            CartIngredient {
                name: "sugar".to_string(),
                measurement_unit: "g".to_string(),
                amount: 10,
            },
            CartIngredient {
                name: "sugar".to_string(),
                measurement_unit: "g".to_string(),
                amount: 5,
            },
        ]);

        let response = shopping_list_attachment(&list).into_response();
        let headers = response.headers();
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"shopping_list\""
        );
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");

        let body = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], "sugar (g) — 15\n".as_bytes());
    }
}
