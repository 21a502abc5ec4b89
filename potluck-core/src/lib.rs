pub mod shopping_list;
pub mod short_link;

pub use shopping_list::{aggregate, IngredientLine, ShoppingListEntry};
pub use short_link::{generate_short_link, ShortLinkError};
