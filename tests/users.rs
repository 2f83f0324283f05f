mod common;

use recipebook_sdk::{
    actions::{login_user, register_user},
    error::ActionError,
    form::{LoginForm, RegisterForm},
};
use sqlx::PgPool;

use common::count;

fn register(email: &str, username: &str) -> RegisterForm {
    RegisterForm {
        email: email.to_string(),
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password: "correct horse".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn email_is_unique_regardless_of_case(pool: PgPool) {
    let first = register_user(register("Cook@example.com", "cook"), &pool)
        .await
        .unwrap();
    assert_eq!(first.email, "cook@example.com");

    let second = register_user(register("cook@EXAMPLE.com", "other"), &pool).await;
    assert!(matches!(second, Err(ActionError::Conflict(_))));
    assert_eq!(count(&pool, "users").await, 1);

    let token = login_user(
        LoginForm {
            email: "COOK@example.com".to_string(),
            password: "correct horse".to_string(),
        },
        b"secret",
        1,
        &pool,
    )
    .await;
    assert!(token.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn overlong_username_is_a_validation_error(pool: PgPool) {
    let result = register_user(register("cook@example.com", &"x".repeat(101)), &pool).await;
    assert!(matches!(result, Err(ActionError::Validation(_))));
    assert_eq!(count(&pool, "users").await, 0);
}
