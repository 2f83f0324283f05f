use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    error::ActionError,
    form::{LoginForm, RegisterForm},
    schema::{Id, User},
};

use sqlx::{Pool, Postgres};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, ActionError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(&*pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, ActionError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await?;

    Ok(row)
}

/// Creates a user; the password is stored as an argon2 hash.
pub async fn register_user(form: RegisterForm, pool: &Pool<Postgres>) -> Result<User, ActionError> {
    let form = form.validate()?;
    let password = hash_password(&form.password)?;

    let user: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(form.email)
    .bind(form.username)
    .bind(form.first_name)
    .bind(form.last_name)
    .bind(password)
    .fetch_optional(&*pool)
    .await?;

    let user = user.ok_or_else(|| ActionError::conflict("Email or username is already taken"))?;
    log::info!("Registered user {} ({})", user.id, user.username);

    Ok(user)
}

pub async fn login_user(
    form: LoginForm,
    secret: &[u8],
    lifetime_hours: i64,
    pool: &Pool<Postgres>,
) -> Result<String, ActionError> {
    let user = get_user_by_email(pool, &form.email)
        .await?
        .ok_or_else(|| ActionError::validation("Invalid credentials"))?;

    if !verify_password(&form.password, &user.password)? {
        return Err(ActionError::validation("Invalid credentials"));
    }

    generate_jwt_session(&user, secret, lifetime_hours)
}
