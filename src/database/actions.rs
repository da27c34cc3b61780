mod follows;
mod ingredients;
mod lists;
mod recipes;
mod shopping_list;
mod tags;
mod users;

pub use follows::*;
pub use ingredients::*;
pub use lists::*;
pub use recipes::*;
pub use shopping_list::*;
pub use tags::*;
pub use users::*;
