//! Plain-text rendering of a calculation.

use std::fmt;

use super::entities::{CraftBreakdown, CraftCostResult, PriceSource};

const RULE_WIDTH: usize = 60;

impl fmt::Display for CraftCostResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            Ok(breakdown) => write_report(f, self, breakdown)?,
            Err(error) => writeln!(f, "Error: {error}")?,
        }

        if !self.notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Price notes:")?;
            for note in &self.notes {
                writeln!(f, "  ! {note}")?;
            }
        }
        Ok(())
    }
}

fn write_report(f: &mut fmt::Formatter<'_>, result: &CraftCostResult, b: &CraftBreakdown) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(f, "{rule}")?;
    writeln!(f, "Calculation for: {} ({})", b.potion_name, result.potion_id)?;
    writeln!(f, "{rule}")?;

    writeln!(f, "Requested quantity: {} potions", result.quantity)?;
    writeln!(f, "Base yield per craft: {} potions", b.potion_yield)?;
    if b.effective_yield > f64::from(b.potion_yield) {
        writeln!(f, "Effective yield (city bonus): {:.2} potions", b.effective_yield)?;
    }
    writeln!(f, "Crafts needed: {}", b.crafts_needed)?;
    if b.actual_quantity > u64::from(result.quantity) {
        writeln!(
            f,
            "Actually produced: {} potions ({} surplus)",
            b.actual_quantity,
            b.actual_quantity - u64::from(result.quantity)
        )?;
    }
    writeln!(f)?;

    writeln!(f, "--- Crafting cost ---")?;
    writeln!(f, "Ingredients: {:.2} silver", b.ingredient_cost)?;
    writeln!(f, "Station: {:.2} silver", b.machine_cost)?;
    writeln!(f, "Total cost: {:.2} silver", b.total_cost)?;
    writeln!(f, "Cost per potion: {:.2} silver", b.cost_per_potion)?;
    writeln!(f)?;

    writeln!(f, "--- Ingredients (per craft) ---")?;
    for detail in &b.ingredient_details {
        let fallback = match &detail.price_source {
            PriceSource::Fallback { city } => format!(" [{city}]"),
            PriceSource::NoData | PriceSource::Unavailable => " [no price]".to_string(),
            PriceSource::Preferred => String::new(),
        };
        if (detail.net_quantity - f64::from(detail.quantity)).abs() > f64::EPSILON {
            writeln!(
                f,
                "  {}: {} -> {:.2} (after return) x {:.2}{} = {:.2} silver; hold {}",
                detail.name,
                detail.quantity,
                detail.net_quantity,
                detail.unit_price,
                fallback,
                detail.total_cost,
                detail.required_total_quantity
            )?;
        } else {
            writeln!(
                f,
                "  {}: {} x {:.2}{} = {:.2} silver; hold {}",
                detail.name,
                detail.quantity,
                detail.unit_price,
                fallback,
                detail.total_cost,
                detail.required_total_quantity
            )?;
        }
    }
    writeln!(f)?;

    writeln!(f, "--- Sale ---")?;
    writeln!(f, "Sell price: {:.2} silver", b.sell_price)?;
    writeln!(
        f,
        "Fees: tax {:.2} + listing {:.2} silver",
        b.sales_tax_per_potion, b.listing_fee_per_potion
    )?;
    writeln!(f, "After all fees: {:.2} silver", b.sell_price_after_tax)?;
    writeln!(f)?;

    let mark = if b.profit_per_potion > 0.0 { "+" } else { "-" };
    writeln!(f, "--- Profit ---")?;
    writeln!(f, "Profit per potion: {mark} {:.2} silver", b.profit_per_potion)?;
    writeln!(f, "Total profit: {mark} {:.2} silver", b.total_profit)?;
    writeln!(f, "ROI: {:.2}%", b.roi_percent)?;
    writeln!(f)?;

    let s = &b.settings;
    writeln!(f, "--- Settings ---")?;
    writeln!(f, "Craft city: {}", result.craft_city)?;
    if s.brecilien_bonus > 0.0 {
        writeln!(f, "  -> city bonus: +{:.0}% potion yield", s.brecilien_bonus * 100.0)?;
    }
    writeln!(f, "Sell city: {}", result.sell_city)?;
    writeln!(f, "Focus: {}", yes_no(s.focus))?;
    writeln!(f, "Extra bonus: {:.1}%", s.extra_bonus_pct)?;
    writeln!(f, "Resource return (final): {:.1}%", s.return_rate * 100.0)?;
    writeln!(
        f,
        "Ingredient prices: {}",
        if s.use_buy_price { "buy orders" } else { "sell orders" }
    )?;
    writeln!(
        f,
        "Premium: {} (sales tax {:.1}%, listing fee {:.1}%)",
        yes_no(s.premium),
        s.market_tax * 100.0,
        s.listing_fee * 100.0
    )?;
    writeln!(f, "{rule}")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::catalog::{ItemValueTable, RecipeCatalog};
    use crate::domain::crafting::CraftCostEngine;
    use crate::domain::entities::{CraftRequest, PriceQuote, PriceTable};

    #[test]
    fn report_lists_surplus_and_notes() {
        let recipes = RecipeCatalog::builtin();
        let values = ItemValueTable::builtin();
        let mut prices = PriceTable::new();
        prices.entry("T5_POTION_REVIVE".to_string()).or_default().insert(
            "Caerleon".to_string(),
            PriceQuote {
                sell_price_min: 1200.0,
                ..PriceQuote::default()
            },
        );

        let engine = CraftCostEngine::new(&recipes, &values, &prices, "Brecilien", "Caerleon");
        let result = engine.calculate(&CraftRequest::new("T5_POTION_REVIVE", 7));
        let text = result.to_string();

        assert!(text.contains("Gigantify Potion T5"));
        assert!(text.contains("Crafts needed: 2"));
        assert!(text.contains("(3 surplus)"));
        assert!(text.contains("city bonus: +15%"));
        assert!(text.contains("Price notes:"));
        assert!(text.contains("T5_TEASEL not found in price data"));
    }

    #[test]
    fn error_report_is_a_single_line() {
        let recipes = RecipeCatalog::builtin();
        let values = ItemValueTable::builtin();
        let prices = PriceTable::new();
        let engine = CraftCostEngine::new(&recipes, &values, &prices, "Martlock", "Martlock");
        let text = engine
            .calculate(&CraftRequest::new("T9_UNKNOWN", 1))
            .to_string();
        assert_eq!(
            text.trim(),
            "Error: potion T9_UNKNOWN was not found in the recipe catalog"
        );
    }
}
