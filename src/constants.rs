pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_NUMBER: i64 = 1_000_000_000;

pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const RECIPE_NAME_MAX_LENGTH: usize = 256;
pub const EMAIL_MAX_LENGTH: usize = 250;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PERSON_NAME_MAX_LENGTH: usize = 150;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";

/// Postgres constraints mapped to the request field they guard and the
/// message reported on violation.
pub const CONSTRAINT_FIELDS: &[(&str, &str, &str)] = &[
    ("users_email_key", "email", "A user with that email already exists."),
    ("users_username_key", "username", "A user with that username already exists."),
    ("recipes_name_key", "name", "Recipe with this name already exists."),
    ("recipes_cooking_time_check", "cooking_time", "Cooking time must be at least 1."),
    ("recipe_ingredients_amount_check", "ingredients", "Amount must be at least 1."),
    ("recipe_ingredients_unique", "ingredients", "Ingredients must not repeat."),
    ("recipe_tags_pkey", "tags", "Tags must not repeat."),
    ("follows_unique", "errors", "You are already subscribed to this author."),
    ("follows_no_self_follow", "errors", "You cannot subscribe to yourself."),
];

/// Foreign keys from rows written on behalf of the session user.
pub const SESSION_USER_FOREIGN_KEYS: &[&str] = &[
    "recipes_author_id_fkey",
    "favorites_user_id_fkey",
    "shopping_carts_user_id_fkey",
    "follows_user_id_fkey",
];
