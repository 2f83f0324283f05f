use std::collections::HashSet;

use serde::Deserialize;

use super::{error::ActionError, schema::Id};

/// Column widths from the schema, checked before anything reaches the store.
pub const MAX_RECIPE_NAME_CHARS: usize = 200;
pub const MAX_USER_FIELD_CHARS: usize = 100;

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ActionError> {
    if value.chars().count() > max {
        return Err(ActionError::Validation(format!(
            "{field} can't be longer than {max} characters"
        )));
    }
    Ok(())
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct IngredientAmount {
    pub id: Id,
    pub amount: i32,
}

/// Recipe body accepted by create and update.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmount>,
}

/// A `RecipeForm` that passed every check that does not need the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeForm {
    pub fn validate(self) -> Result<ValidatedRecipe, ActionError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ActionError::validation("Recipe name can't be empty"));
        }
        check_length("Recipe name", name, MAX_RECIPE_NAME_CHARS)?;
        if self.text.trim().is_empty() {
            return Err(ActionError::validation("Recipe text can't be empty"));
        }
        if self.cooking_time < 1 {
            return Err(ActionError::validation("Cooking time must be at least 1"));
        }
        if self.ingredients.is_empty() {
            return Err(ActionError::validation(
                "Recipe must contain at least one ingredient",
            ));
        }

        let mut seen = HashSet::new();
        for part in self.ingredients.iter() {
            if part.amount < 1 {
                return Err(ActionError::Validation(format!(
                    "Amount of ingredient {} must be at least 1",
                    part.id
                )));
            }
            if !seen.insert(part.id) {
                return Err(ActionError::Conflict(format!(
                    "Ingredient {} is listed more than once",
                    part.id
                )));
            }
        }

        let mut seen = HashSet::new();
        let tags = self
            .tags
            .into_iter()
            .filter(|tag| seen.insert(*tag))
            .collect();

        Ok(ValidatedRecipe {
            name: name.to_string(),
            text: self.text,
            cooking_time: self.cooking_time,
            image: self.image,
            tags,
            ingredients: self.ingredients,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

impl RegisterForm {
    /// Trims the identifiers and lowercases the email, which is unique
    /// regardless of case.
    pub fn validate(self) -> Result<Self, ActionError> {
        let email = self.email.trim().to_lowercase();
        let username = self.username.trim().to_string();

        if email.is_empty() || username.is_empty() {
            return Err(ActionError::validation("Email and username are required"));
        }
        if self.password.is_empty() {
            return Err(ActionError::validation("Password can't be empty"));
        }
        check_length("Email", &email, MAX_USER_FIELD_CHARS)?;
        check_length("Username", &username, MAX_USER_FIELD_CHARS)?;
        check_length("First name", &self.first_name, MAX_USER_FIELD_CHARS)?;
        check_length("Last name", &self.last_name, MAX_USER_FIELD_CHARS)?;

        Ok(Self {
            email,
            username,
            ..self
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
