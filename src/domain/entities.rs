use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier for items as used by the Albion Data Project (e.g. `T5_POTION_REVIVE`).
pub type ItemId = String;

/// Quotes for one item keyed by city name.
pub type CityQuotes = HashMap<String, PriceQuote>;

/// Latest market quotes: item id -> city -> quote.
pub type PriceTable = HashMap<ItemId, CityQuotes>;

/// Immutable alchemy recipe from the built-in catalog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recipe {
    pub id: ItemId,
    pub name: String,
    /// Potions produced per production run. Zero is read as "not set".
    pub yield_per_craft: u32,
    /// Ingredient id and per-run quantity, in recipe order.
    pub ingredients: Vec<(ItemId, u32)>,
}

impl Recipe {
    pub fn new(id: &str, name: &str, yield_per_craft: u32, ingredients: &[(&str, u32)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            yield_per_craft,
            ingredients: ingredients
                .iter()
                .map(|(item, quantity)| (item.to_string(), *quantity))
                .collect(),
        }
    }

    /// Yield per run, falling back to 1 when the recipe does not declare one.
    pub fn potion_yield(&self) -> u32 {
        if self.yield_per_craft == 0 {
            1
        } else {
            self.yield_per_craft
        }
    }
}

/// One city's order-book summary for an item. Zero means "no quote".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(default)]
    pub buy_price_max: f64,
    #[serde(default)]
    pub sell_price_min: f64,
    #[serde(default)]
    pub buy_price_min: f64,
    #[serde(default)]
    pub sell_price_max: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    #[default]
    SellPriceMin,
    BuyPriceMax,
    BuyPriceMin,
    SellPriceMax,
}

impl PriceKind {
    pub fn value(&self, quote: &PriceQuote) -> f64 {
        match self {
            PriceKind::SellPriceMin => quote.sell_price_min,
            PriceKind::BuyPriceMax => quote.buy_price_max,
            PriceKind::BuyPriceMin => quote.buy_price_min,
            PriceKind::SellPriceMax => quote.sell_price_max,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceKind::SellPriceMin => "sell_price_min",
            PriceKind::BuyPriceMax => "buy_price_max",
            PriceKind::BuyPriceMin => "buy_price_min",
            PriceKind::SellPriceMax => "sell_price_max",
        }
    }
}

/// Where a resolved price came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PriceSource {
    /// The requested city had a positive quote.
    Preferred,
    /// Borrowed from another city.
    Fallback { city: String },
    /// The item is absent from the price table.
    NoData,
    /// The item is listed but no city carries a positive quote.
    Unavailable,
}

/// Per-call inputs of the craft cost engine. Cities are fixed on the engine itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftRequest {
    pub potion_id: ItemId,
    /// Finished potions wanted (not runs).
    pub quantity: u32,
    /// Station fee per 100 nutrition.
    pub machine_cost_per_100: f64,
    pub focus: bool,
    /// Extra cost reduction in percent; `None` when the bonus is switched off.
    pub extra_bonus_pct: Option<f64>,
    /// Final fraction of ingredients returned by the station (0.0 - 1.0).
    pub return_rate: f64,
    /// Cost ingredients at buy orders (`buy_price_max`) instead of sell orders.
    pub use_buy_price: bool,
    pub premium: bool,
}

impl CraftRequest {
    pub fn new(potion_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            potion_id: potion_id.into(),
            quantity,
            machine_cost_per_100: 0.0,
            focus: false,
            extra_bonus_pct: None,
            return_rate: 0.0,
            use_buy_price: false,
            premium: false,
        }
    }

    pub fn extra_bonus_pct(&self) -> f64 {
        self.extra_bonus_pct.unwrap_or(0.0)
    }

    pub fn ingredient_price_kind(&self) -> PriceKind {
        if self.use_buy_price {
            PriceKind::BuyPriceMax
        } else {
            PriceKind::SellPriceMin
        }
    }

    /// Caller-side checks. The engine itself trusts its input.
    pub fn validate(&self) -> Result<(), CraftError> {
        if self.potion_id.trim().is_empty() {
            return Err(CraftError::invalid("potion id must not be empty"));
        }
        if self.quantity == 0 {
            return Err(CraftError::invalid("quantity must be greater than 0"));
        }
        if !self.machine_cost_per_100.is_finite() || self.machine_cost_per_100 < 0.0 {
            return Err(CraftError::invalid("machine cost cannot be negative"));
        }
        if !self.return_rate.is_finite() || !(0.0..=1.0).contains(&self.return_rate) {
            return Err(CraftError::invalid("return rate must be between 0 and 100%"));
        }
        if let Some(pct) = self.extra_bonus_pct {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(CraftError::invalid("extra bonus must be between 0 and 100%"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CraftError {
    #[error("potion {potion_id} was not found in the recipe catalog")]
    NotFound { potion_id: ItemId },
    #[error("no ItemValue configured for {potion_id}; cannot compute the station fee")]
    MissingData { potion_id: ItemId },
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl CraftError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        CraftError::InvalidInput {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngredientDetail {
    pub item_id: ItemId,
    pub name: String,
    /// Per-run requirement before resource return.
    pub quantity: u32,
    /// Per-run consumption after resource return.
    pub net_quantity: f64,
    /// Amount that must be held up front for all runs.
    pub required_total_quantity: u64,
    pub unit_price: f64,
    pub price_source: PriceSource,
    /// `unit_price * quantity`
    pub base_cost: f64,
    /// `unit_price * net_quantity`
    pub total_cost: f64,
    /// `unit_price * required_total_quantity`
    pub required_total_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CraftSettings {
    pub focus: bool,
    pub extra_bonus_pct: f64,
    pub return_rate: f64,
    pub use_buy_price: bool,
    pub brecilien_bonus: f64,
    pub market_tax: f64,
    pub listing_fee: f64,
    pub premium: bool,
}

/// Every figure produced by a successful calculation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CraftBreakdown {
    pub potion_name: String,
    pub potion_yield: u32,
    pub effective_yield: f64,
    pub crafts_needed: u32,
    pub actual_quantity: u64,
    pub effective_quantity: f64,

    pub ingredient_cost_per_craft_base: f64,
    pub ingredient_cost_per_craft: f64,
    pub nutrition_cost: f64,
    pub machine_cost_per_craft: f64,
    pub cost_per_craft: f64,
    pub cost_per_craft_with_bonuses: f64,
    /// Ingredient spend over all runs, after return.
    pub ingredient_cost: f64,
    /// Station spend over all runs.
    pub machine_cost: f64,
    pub total_cost: f64,
    pub cost_per_potion: f64,

    pub sell_price: f64,
    pub sell_price_source: PriceSource,
    pub sales_tax_per_potion: f64,
    pub listing_fee_per_potion: f64,
    pub sell_price_after_tax: f64,

    pub profit_per_potion: f64,
    pub total_profit: f64,
    pub roi_percent: f64,

    pub ingredient_details: Vec<IngredientDetail>,
    pub settings: CraftSettings,
}

/// Outcome of one calculation: the echoed context plus either a breakdown or an error.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CraftCostResult {
    pub potion_id: ItemId,
    pub craft_city: String,
    pub sell_city: String,
    pub quantity: u32,
    #[serde(flatten)]
    outcome: CraftOutcome,
    /// Price diagnostics gathered while resolving quotes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Serialized as a `breakdown` or an `error` key next to the context fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CraftOutcome {
    Breakdown(CraftBreakdown),
    Error(CraftError),
}

impl CraftCostResult {
    pub(crate) fn succeeded(
        request: &CraftRequest,
        craft_city: &str,
        sell_city: &str,
        breakdown: CraftBreakdown,
        notes: Vec<String>,
    ) -> Self {
        Self::with_outcome(request, craft_city, sell_city, CraftOutcome::Breakdown(breakdown), notes)
    }

    pub(crate) fn failed(
        request: &CraftRequest,
        craft_city: &str,
        sell_city: &str,
        error: CraftError,
        notes: Vec<String>,
    ) -> Self {
        Self::with_outcome(request, craft_city, sell_city, CraftOutcome::Error(error), notes)
    }

    fn with_outcome(
        request: &CraftRequest,
        craft_city: &str,
        sell_city: &str,
        outcome: CraftOutcome,
        notes: Vec<String>,
    ) -> Self {
        Self {
            potion_id: request.potion_id.clone(),
            craft_city: craft_city.to_string(),
            sell_city: sell_city.to_string(),
            quantity: request.quantity,
            outcome,
            notes,
        }
    }

    pub fn outcome(&self) -> Result<&CraftBreakdown, &CraftError> {
        match &self.outcome {
            CraftOutcome::Breakdown(breakdown) => Ok(breakdown),
            CraftOutcome::Error(error) => Err(error),
        }
    }

    pub fn breakdown(&self) -> Option<&CraftBreakdown> {
        self.outcome().ok()
    }

    pub fn error(&self) -> Option<&CraftError> {
        self.outcome().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome().is_ok()
    }

    /// Aggregate cost; zero for an error result.
    pub fn total_cost(&self) -> f64 {
        self.breakdown().map(|b| b.total_cost).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_without_yield_defaults_to_one() {
        let recipe = Recipe::new("T4_TEST", "Test", 0, &[("T4_BURDOCK", 2)]);
        assert_eq!(recipe.potion_yield(), 1);
    }

    #[test]
    fn ingredient_price_kind_follows_basis_flag() {
        let mut request = CraftRequest::new("T5_POTION_REVIVE", 5);
        assert_eq!(request.ingredient_price_kind(), PriceKind::SellPriceMin);
        request.use_buy_price = true;
        assert_eq!(request.ingredient_price_kind(), PriceKind::BuyPriceMax);
    }

    #[test]
    fn validate_rejects_out_of_range_input() {
        assert!(CraftRequest::new("T5_POTION_REVIVE", 1).validate().is_ok());

        let zero = CraftRequest::new("T5_POTION_REVIVE", 0);
        assert!(matches!(zero.validate(), Err(CraftError::InvalidInput { .. })));

        let mut rate = CraftRequest::new("T5_POTION_REVIVE", 1);
        rate.return_rate = 1.2;
        assert!(rate.validate().is_err());

        let mut bonus = CraftRequest::new("T5_POTION_REVIVE", 1);
        bonus.extra_bonus_pct = Some(150.0);
        assert!(bonus.validate().is_err());

        let mut machine = CraftRequest::new("T5_POTION_REVIVE", 1);
        machine.machine_cost_per_100 = -1.0;
        assert!(machine.validate().is_err());
    }

    #[test]
    fn craft_error_serializes_with_kind_tag() {
        let error = CraftError::NotFound {
            potion_id: "T9_NOPE".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["potion_id"], "T9_NOPE");
    }

    #[test]
    fn failed_result_serializes_error_beside_context() {
        let request = CraftRequest::new("T9_NOPE", 4);
        let result = CraftCostResult::failed(
            &request,
            "Martlock",
            "Caerleon",
            CraftError::NotFound {
                potion_id: "T9_NOPE".to_string(),
            },
            Vec::new(),
        );
        assert!(!result.is_ok());
        assert!(result.breakdown().is_none());
        assert_eq!(result.total_cost(), 0.0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["craft_city"], "Martlock");
        assert_eq!(json["quantity"], 4);
        assert_eq!(json["error"]["kind"], "not_found");
        assert!(json.get("breakdown").is_none());
        assert!(json.get("notes").is_none());
    }
}
