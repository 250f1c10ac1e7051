//! Craft cost engine: recipe + prices + bonuses -> cost, proceeds and profit.

use tracing::{debug, warn};

use super::catalog::{is_known_city, material_name, ItemValueTable, RecipeCatalog, BRECILIEN};
use super::entities::{
    CraftBreakdown, CraftCostResult, CraftError, CraftRequest, CraftSettings, IngredientDetail,
    PriceKind, PriceTable,
};
use super::pricing::{resolve_price, ResolvedPrice};

/// Nutrition per point of ItemValue, calibrated against the in-game station fee.
pub const NUTRITION_RATIO: f64 = 0.07125;
/// Market sales tax.
pub const SALES_TAX_RATE: f64 = 0.08;
/// Fee for placing a sell order.
pub const LISTING_FEE_RATE: f64 = 0.025;
/// Extra output per run when crafting in Brecilien.
pub const BRECILIEN_CRAFT_BONUS: f64 = 0.15;
pub const FOCUS_MULTIPLIER: f64 = 0.8;
/// Premium accounts pay half the sales tax.
pub const PREMIUM_TAX_FACTOR: f64 = 0.5;

/// Stateless apart from the city pair chosen at construction; every call is independent.
#[derive(Clone, Debug)]
pub struct CraftCostEngine<'a> {
    recipes: &'a RecipeCatalog,
    item_values: &'a ItemValueTable,
    prices: &'a PriceTable,
    craft_city: String,
    sell_city: String,
    brecilien_craft_bonus: f64,
    sales_tax: f64,
    listing_fee: f64,
}

impl<'a> CraftCostEngine<'a> {
    pub fn new(
        recipes: &'a RecipeCatalog,
        item_values: &'a ItemValueTable,
        prices: &'a PriceTable,
        craft_city: impl Into<String>,
        sell_city: impl Into<String>,
    ) -> Self {
        let craft_city = craft_city.into();
        let sell_city = sell_city.into();
        for city in [&craft_city, &sell_city] {
            if !is_known_city(city) {
                warn!("[craft] {city} is not a known market city; only fallback prices will apply");
            }
        }
        let brecilien_craft_bonus = if craft_city == BRECILIEN {
            BRECILIEN_CRAFT_BONUS
        } else {
            0.0
        };
        Self {
            recipes,
            item_values,
            prices,
            craft_city,
            sell_city,
            brecilien_craft_bonus,
            sales_tax: SALES_TAX_RATE,
            listing_fee: LISTING_FEE_RATE,
        }
    }

    pub fn craft_city(&self) -> &str {
        &self.craft_city
    }

    pub fn sell_city(&self) -> &str {
        &self.sell_city
    }

    pub fn brecilien_craft_bonus(&self) -> f64 {
        self.brecilien_craft_bonus
    }

    pub fn calculate(&self, request: &CraftRequest) -> CraftCostResult {
        let mut notes = Vec::new();

        let Some(recipe) = self.recipes.lookup(&request.potion_id) else {
            warn!(potion_id = %request.potion_id, "[craft] potion not in recipe catalog");
            return self.fail(
                request,
                CraftError::NotFound {
                    potion_id: request.potion_id.clone(),
                },
                notes,
            );
        };

        let potion_yield = recipe.potion_yield();
        let crafts_needed = request.quantity.div_ceil(potion_yield);
        let actual_quantity = u64::from(crafts_needed) * u64::from(potion_yield);
        let crafts = f64::from(crafts_needed);

        // Ingredients, first at full per-run requirement, then net of resource return.
        let consumed_fraction = 1.0 - request.return_rate;
        let price_kind = request.ingredient_price_kind();
        let mut ingredient_cost_per_craft_base = 0.0;
        let mut ingredient_details = Vec::with_capacity(recipe.ingredients.len());

        for (item_id, quantity) in &recipe.ingredients {
            let price = self.resolve(item_id, &self.craft_city, price_kind, &mut notes);
            let per_run = f64::from(*quantity);
            let base_cost = price.value * per_run;
            ingredient_cost_per_craft_base += base_cost;

            let net_quantity = per_run * consumed_fraction;
            let required_total_quantity = u64::from(*quantity) * u64::from(crafts_needed);
            ingredient_details.push(IngredientDetail {
                item_id: item_id.clone(),
                name: material_name(item_id).unwrap_or(item_id.as_str()).to_string(),
                quantity: *quantity,
                net_quantity,
                required_total_quantity,
                unit_price: price.value,
                price_source: price.source,
                base_cost,
                total_cost: price.value * net_quantity,
                required_total_cost: price.value * required_total_quantity as f64,
            });
        }
        let ingredient_cost_per_craft = ingredient_cost_per_craft_base * consumed_fraction;

        let item_value = match self.item_values.lookup(&recipe.id) {
            Some(value) if value > 0.0 => value,
            _ => {
                warn!(potion_id = %recipe.id, "[craft] no ItemValue, cannot price the station fee");
                return self.fail(
                    request,
                    CraftError::MissingData {
                        potion_id: recipe.id.clone(),
                    },
                    notes,
                );
            }
        };
        let nutrition_cost = item_value * NUTRITION_RATIO;
        let machine_cost_per_craft = (nutrition_cost / 100.0) * request.machine_cost_per_100;

        let cost_per_craft = ingredient_cost_per_craft + machine_cost_per_craft;
        let focus_multiplier = if request.focus { FOCUS_MULTIPLIER } else { 1.0 };
        let extra_bonus_multiplier = (1.0 - request.extra_bonus_pct() / 100.0).max(0.0);
        let cost_per_craft_with_bonuses = cost_per_craft * focus_multiplier * extra_bonus_multiplier;
        let total_cost = cost_per_craft_with_bonuses * crafts;

        // The city bonus adds output per run instead of discounting the run.
        let effective_yield = f64::from(potion_yield) * (1.0 + self.brecilien_craft_bonus);
        let effective_quantity = crafts * effective_yield;
        let cost_per_potion = if effective_quantity > 0.0 {
            total_cost / effective_quantity
        } else {
            0.0
        };

        let sell = self.resolve(&recipe.id, &self.sell_city, PriceKind::SellPriceMin, &mut notes);
        let effective_sales_tax = self.sales_tax
            * if request.premium {
                PREMIUM_TAX_FACTOR
            } else {
                1.0
            };
        let listing_fee_per_potion = sell.value * self.listing_fee;
        let sales_tax_per_potion = sell.value * effective_sales_tax;
        let sell_price_after_tax = sell.value - sales_tax_per_potion - listing_fee_per_potion;

        let profit_per_potion = sell_price_after_tax - cost_per_potion;
        // Surplus potions from rounding up to whole runs are not counted as profit.
        let total_profit = profit_per_potion * f64::from(request.quantity);
        let roi_percent = if cost_per_potion > 0.0 {
            profit_per_potion / cost_per_potion * 100.0
        } else {
            0.0
        };

        debug!(
            potion_id = %recipe.id,
            crafts_needed,
            total_cost,
            profit_per_potion,
            "[craft] calculation finished"
        );

        let breakdown = CraftBreakdown {
            potion_name: recipe.name.clone(),
            potion_yield,
            effective_yield,
            crafts_needed,
            actual_quantity,
            effective_quantity,
            ingredient_cost_per_craft_base,
            ingredient_cost_per_craft,
            nutrition_cost,
            machine_cost_per_craft,
            cost_per_craft,
            cost_per_craft_with_bonuses,
            ingredient_cost: ingredient_cost_per_craft * crafts,
            machine_cost: machine_cost_per_craft * crafts,
            total_cost,
            cost_per_potion,
            sell_price: sell.value,
            sell_price_source: sell.source,
            sales_tax_per_potion,
            listing_fee_per_potion,
            sell_price_after_tax,
            profit_per_potion,
            total_profit,
            roi_percent,
            ingredient_details,
            settings: CraftSettings {
                focus: request.focus,
                extra_bonus_pct: request.extra_bonus_pct(),
                return_rate: request.return_rate,
                use_buy_price: request.use_buy_price,
                brecilien_bonus: self.brecilien_craft_bonus,
                market_tax: effective_sales_tax,
                listing_fee: self.listing_fee,
                premium: request.premium,
            },
        };

        CraftCostResult::succeeded(request, &self.craft_city, &self.sell_city, breakdown, notes)
    }

    fn resolve(
        &self,
        item_id: &str,
        city: &str,
        kind: PriceKind,
        notes: &mut Vec<String>,
    ) -> ResolvedPrice {
        let price = resolve_price(item_id, self.prices, city, kind);
        if let Some(note) = price.diagnostic(item_id, city, kind) {
            warn!("[prices] {note}");
            notes.push(note);
        }
        price
    }

    fn fail(&self, request: &CraftRequest, error: CraftError, notes: Vec<String>) -> CraftCostResult {
        CraftCostResult::failed(request, &self.craft_city, &self.sell_city, error, notes)
    }
}
