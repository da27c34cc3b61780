use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{
    error::{ApiError, FieldErrors},
    schema::Id,
};
use crate::constants::{
    EMAIL_MAX_LENGTH, PERSON_NAME_MAX_LENGTH, RECIPE_NAME_MAX_LENGTH, USERNAME_MAX_LENGTH,
};

const REQUIRED: &str = "This field is required.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";

/// Numbers arrive either as JSON numbers or as numeric strings.
fn as_integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_length: usize,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => {
            errors.add(field, "This field may not be blank.");
            None
        }
        Some(v) if v.chars().count() > max_length => {
            errors.add(
                field,
                format!("Ensure this field has no more than {max_length} characters."),
            );
            None
        }
        Some(v) => Some(v),
        None => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

/// Accepts `data:image/<type>;base64,<payload>` URIs.
pub fn is_base64_image(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("data:image/") else {
        return false;
    };
    let Some((format, payload)) = rest.split_once(";base64,") else {
        return false;
    };

    !format.is_empty()
        && format.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        && !payload.is_empty()
        && payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '\n' | '\r'))
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientAmountForm {
    pub id: Option<Value>,
    pub amount: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub amount: i32,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RecipeForm {
    pub ingredients: Option<Vec<IngredientAmountForm>>,
    pub tags: Option<Vec<Value>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmount>,
}

/// A validated update. Tags and ingredients always replace the stored sets;
/// the scalar fields are only written when present.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeForm {
    pub fn validate_create(self) -> Result<NewRecipe, ApiError> {
        let mut errors = FieldErrors::new();
        let (tags, ingredients) = self.validate_relations(&mut errors);

        let name = required_text(&mut errors, "name", self.name, RECIPE_NAME_MAX_LENGTH);
        let text = required_text(&mut errors, "text", self.text, usize::MAX);
        let image = validate_image(&mut errors, self.image);
        let cooking_time = validate_cooking_time(&mut errors, self.cooking_time);

        if image.is_none() && errors.get("image").is_none() {
            errors.add("image", REQUIRED);
        }
        if cooking_time.is_none() && errors.get("cooking_time").is_none() {
            errors.add("cooking_time", REQUIRED);
        }

        match (name, text, image, cooking_time) {
            (Some(name), Some(text), Some(image), Some(cooking_time)) => errors.into_result(NewRecipe {
                name,
                text,
                image,
                cooking_time,
                tags,
                ingredients,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }

    pub fn validate_update(self) -> Result<RecipeChanges, ApiError> {
        let mut errors = FieldErrors::new();
        let (tags, ingredients) = self.validate_relations(&mut errors);

        let name = match self.name {
            Some(name) => required_text(&mut errors, "name", Some(name), RECIPE_NAME_MAX_LENGTH),
            None => None,
        };
        let text = match self.text {
            Some(text) => required_text(&mut errors, "text", Some(text), usize::MAX),
            None => None,
        };
        let image = validate_image(&mut errors, self.image);
        let cooking_time = validate_cooking_time(&mut errors, self.cooking_time);

        errors.into_result(RecipeChanges {
            name,
            text,
            image,
            cooking_time,
            tags,
            ingredients,
        })
    }

    fn validate_relations(&self, errors: &mut FieldErrors) -> (Vec<Id>, Vec<IngredientAmount>) {
        (
            validate_tags(errors, self.tags.as_deref()),
            validate_ingredients(errors, self.ingredients.as_deref()),
        )
    }
}

fn validate_tags(errors: &mut FieldErrors, tags: Option<&[Value]>) -> Vec<Id> {
    let Some(tags) = tags else {
        errors.add("tags", REQUIRED);
        return vec![];
    };
    if tags.is_empty() {
        errors.add("tags", "Specify at least one tag.");
        return vec![];
    }

    let mut ids = Vec::with_capacity(tags.len());
    for tag in tags {
        match as_integer(tag) {
            Some(id) => ids.push(id),
            None => {
                errors.add("tags", format!("Incorrect type. Expected pk value, received {tag}."));
                return vec![];
            }
        }
    }

    let unique: HashSet<&Id> = ids.iter().collect();
    if unique.len() != ids.len() {
        errors.add("tags", "Tags must not repeat.");
    }

    ids
}

fn validate_ingredients(
    errors: &mut FieldErrors,
    ingredients: Option<&[IngredientAmountForm]>,
) -> Vec<IngredientAmount> {
    let Some(ingredients) = ingredients else {
        errors.add("ingredients", REQUIRED);
        return vec![];
    };
    if ingredients.is_empty() {
        errors.add("ingredients", "Specify at least one ingredient.");
        return vec![];
    }

    let mut parts = Vec::with_capacity(ingredients.len());
    for ingredient in ingredients {
        let id = ingredient.id.as_ref().and_then(as_integer);
        let amount = ingredient.amount.as_ref().and_then(as_integer);

        match (id, amount) {
            (Some(id), Some(amount)) if amount >= 1 => parts.push(IngredientAmount { id, amount }),
            (Some(_), Some(_)) => {
                errors.add("ingredients", "Amount must be at least 1.");
                return vec![];
            }
            _ => {
                errors.add("ingredients", "Each ingredient needs an integer id and amount.");
                return vec![];
            }
        }
    }

    let unique: HashSet<Id> = parts.iter().map(|part| part.id).collect();
    if unique.len() != parts.len() {
        errors.add("ingredients", "Ingredients must not repeat.");
    }

    parts
}

fn validate_image(errors: &mut FieldErrors, image: Option<String>) -> Option<String> {
    match image {
        Some(image) if is_base64_image(&image) => Some(image),
        Some(_) => {
            errors.add("image", "Upload a valid base64 encoded image.");
            None
        }
        None => None,
    }
}

fn validate_cooking_time(errors: &mut FieldErrors, cooking_time: Option<Value>) -> Option<i32> {
    match cooking_time.as_ref().map(as_integer) {
        Some(Some(minutes)) if minutes >= 1 => Some(minutes),
        Some(Some(_)) => {
            errors.add("cooking_time", "Cooking time must be at least 1.");
            None
        }
        Some(None) => {
            errors.add("cooking_time", NOT_AN_INTEGER);
            None
        }
        None => None,
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"))
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"))
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(self) -> Result<NewUser, ApiError> {
        let mut errors = FieldErrors::new();

        let email = required_text(&mut errors, "email", self.email, EMAIL_MAX_LENGTH);
        if let Some(email) = &email {
            if !email_pattern().is_match(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }

        let username = required_text(&mut errors, "username", self.username, USERNAME_MAX_LENGTH);
        if let Some(username) = &username {
            if !username_pattern().is_match(username) {
                errors.add(
                    "username",
                    "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }

        let first_name = required_text(&mut errors, "first_name", self.first_name, PERSON_NAME_MAX_LENGTH);
        let last_name = required_text(&mut errors, "last_name", self.last_name, PERSON_NAME_MAX_LENGTH);

        let password = match self.password {
            Some(password) if !password.is_empty() => Some(password),
            Some(_) => {
                errors.add("password", "This field may not be blank.");
                None
            }
            None => {
                errors.add("password", REQUIRED);
                None
            }
        };

        match (email, username, first_name, last_name, password) {
            (Some(email), Some(username), Some(first_name), Some(last_name), Some(password)) => {
                errors.into_result(NewUser {
                    email: email.to_lowercase(),
                    username,
                    first_name,
                    last_name,
                    password,
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SetPasswordForm {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

impl SetPasswordForm {
    /// Returns `(current_password, new_password)`.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let current = self.current_password.filter(|p| !p.is_empty());
        let new = self.new_password.filter(|p| !p.is_empty());

        if current.is_none() {
            errors.add("current_password", REQUIRED);
        }
        if new.is_none() {
            errors.add("new_password", REQUIRED);
        }

        match (current, new) {
            (Some(current), Some(new)) => Ok((current, new)),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DeleteAccountForm {
    pub current_password: Option<String>,
}
