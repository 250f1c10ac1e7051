//! Domain logic for potion crafting economics lives here.

pub mod catalog;
pub mod crafting;
pub mod entities;
pub mod pricing;
mod report;

pub use catalog::{
    is_known_city, material_name, ItemValueTable, RecipeCatalog, BRECILIEN, CITIES,
    FALLBACK_CITY_ORDER,
};
pub use crafting::CraftCostEngine;
pub use entities::{
    CityQuotes, CraftBreakdown, CraftCostResult, CraftError, CraftRequest, CraftSettings,
    IngredientDetail, ItemId, PriceKind, PriceQuote, PriceSource, PriceTable, Recipe,
};
pub use pricing::{resolve_price, ResolvedPrice};
