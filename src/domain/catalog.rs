//! Built-in alchemy data: recipes, ItemValues, display names and the market cities.
//!
//! Everything here is loaded once and only ever read afterwards.

use std::collections::{HashMap, HashSet};

use super::entities::{ItemId, Recipe};

/// Market cities in menu order.
pub const CITIES: [&str; 7] = [
    "Caerleon",
    "Bridgewatch",
    "Lymhurst",
    "Martlock",
    "FortSterling",
    "Thetford",
    "Brecilien",
];

/// Order in which other cities are consulted when the preferred one has no quote.
/// Caerleon is the central market and always goes first.
pub const FALLBACK_CITY_ORDER: [&str; 7] = [
    "Caerleon",
    "Thetford",
    "Bridgewatch",
    "Lymhurst",
    "Martlock",
    "FortSterling",
    "Brecilien",
];

/// The only city with an alchemy production bonus.
pub const BRECILIEN: &str = "Brecilien";

pub fn is_known_city(name: &str) -> bool {
    CITIES.contains(&name)
}

type RecipeRow = (&'static str, &'static str, u32, &'static [(&'static str, u32)]);

const BUILTIN_RECIPES: &[RecipeRow] = &[
    (
        "T3_POTION_MOB_RESET@1",
        "Minor Calming Potion T3.1",
        10,
        &[
            ("T3_ALCHEMY_RARE_PANTHER", 1),
            ("T3_COMFREY", 16),
            ("T1_ALCHEMY_EXTRACT_LEVEL1", 10),
        ],
    ),
    (
        "T5_POTION_REVIVE",
        "Gigantify Potion T5",
        5,
        &[("T5_TEASEL", 24), ("T4_BURDOCK", 12), ("T5_EGG", 6)],
    ),
    (
        "T5_POTION_STONESKIN",
        "Resistance Potion T5",
        5,
        &[("T5_TEASEL", 24), ("T4_BURDOCK", 12), ("T4_MILK", 6)],
    ),
    (
        "T5_POTION_SLOWFIELD",
        "Sticky Potion T5",
        5,
        &[("T5_TEASEL", 24), ("T4_BURDOCK", 12), ("T5_EGG", 6)],
    ),
    (
        "T5_POTION_MOB_RESET",
        "Calming Potion T5",
        10,
        &[
            ("T5_ALCHEMY_RARE_PANTHER", 1),
            ("T5_TEASEL", 48),
            ("T4_BURDOCK", 24),
            ("T2_AGARIC", 12),
        ],
    ),
    (
        "T6_POTION_COOLDOWN",
        "Poison Potion T6",
        5,
        &[
            ("T6_FOXGLOVE", 24),
            ("T5_TEASEL", 12),
            ("T3_COMFREY", 12),
            ("T6_MILK", 6),
        ],
    ),
    (
        "T6_POTION_LAVA",
        "Hellfire Potion T6",
        10,
        &[
            ("T5_ALCHEMY_RARE_IMP", 1),
            ("T6_MILK", 48),
            ("T6_FOXGLOVE", 24),
            ("T3_EGG", 12),
        ],
    ),
    (
        "T6_POTION_GATHER",
        "Gathering Potion T6",
        10,
        &[
            ("T5_ALCHEMY_RARE_ELEMENTAL", 1),
            ("T6_BUTTER", 48),
            ("T6_FOXGLOVE", 24),
            ("T5_TEASEL", 12),
        ],
    ),
    (
        "T6_POTION_HEAL",
        "Major Healing Potion T6",
        5,
        &[("T6_FOXGLOVE", 72), ("T5_EGG", 18), ("T6_ALCOHOL", 18)],
    ),
    (
        "T6_POTION_TORNADO",
        "Tornado in a Bottle T6",
        10,
        &[
            ("T5_ALCHEMY_RARE_EAGLE", 1),
            ("T6_FOXGLOVE", 48),
            ("T5_TEASEL", 24),
            ("T3_EGG", 12),
        ],
    ),
    (
        "T7_POTION_REVIVE",
        "Major Gigantify Potion T7",
        5,
        &[
            ("T7_MULLEIN", 72),
            ("T6_FOXGLOVE", 36),
            ("T5_EGG", 18),
            ("T7_ALCOHOL", 18),
        ],
    ),
    (
        "T7_POTION_STONESKIN",
        "Major Resistance Potion T7",
        5,
        &[
            ("T7_MULLEIN", 72),
            ("T6_FOXGLOVE", 36),
            ("T6_MILK", 18),
            ("T7_ALCOHOL", 18),
        ],
    ),
    (
        "T7_POTION_SLOWFIELD",
        "Major Sticky Potion T7",
        5,
        &[
            ("T7_MULLEIN", 72),
            ("T6_FOXGLOVE", 36),
            ("T4_BURDOCK", 36),
            ("T5_EGG", 36),
            ("T7_ALCOHOL", 18),
        ],
    ),
    (
        "T8_POTION_COOLDOWN",
        "Major Poison Potion T8",
        5,
        &[
            ("T8_YARROW", 72),
            ("T7_MULLEIN", 36),
            ("T5_TEASEL", 36),
            ("T8_MILK", 18),
            ("T8_ALCOHOL", 18),
        ],
    ),
    (
        "T8_POTION_CLEANSE",
        "Invisibility Potion T8",
        5,
        &[
            ("T8_YARROW", 72),
            ("T7_MULLEIN", 36),
            ("T5_TEASEL", 36),
            ("T8_MILK", 18),
            ("T8_ALCOHOL", 18),
        ],
    ),
    (
        "T8_POTION_LAVA",
        "Major Hellfire Potion T8",
        10,
        &[
            ("T7_ALCHEMY_RARE_IMP", 1),
            ("T8_MILK", 144),
            ("T8_YARROW", 72),
            ("T7_MULLEIN", 72),
            ("T5_EGG", 36),
            ("T8_ALCOHOL", 36),
        ],
    ),
    (
        "T8_POTION_GATHER",
        "Major Gathering Potion T8",
        10,
        &[
            ("T7_ALCHEMY_RARE_ELEMENTAL", 1),
            ("T8_BUTTER", 144),
            ("T8_YARROW", 72),
            ("T7_MULLEIN", 72),
            ("T6_FOXGLOVE", 36),
            ("T8_ALCOHOL", 36),
        ],
    ),
];

// ItemValue from the game's item data; drives the nutrition (station fee) cost.
const BUILTIN_ITEM_VALUES: &[(&str, f64)] = &[
    ("T3_POTION_MOB_RESET@1", 497.78),
    ("T5_POTION_REVIVE", 2613.33),
    ("T5_POTION_STONESKIN", 2613.33),
    ("T5_POTION_SLOWFIELD", 2613.33),
    ("T5_POTION_MOB_RESET", 2613.33),
    ("T6_POTION_COOLDOWN", 3360.0),
    ("T6_POTION_LAVA", 2613.33),
    ("T6_POTION_GATHER", 2755.56),
    ("T6_POTION_HEAL", 6826.67),
    ("T6_POTION_TORNADO", 2613.33),
    ("T7_POTION_REVIVE", 9066.67),
    ("T7_POTION_STONESKIN", 11306.67),
    ("T7_POTION_SLOWFIELD", 11306.67),
    ("T8_POTION_COOLDOWN", 11306.67),
    ("T8_POTION_CLEANSE", 11306.67),
    ("T8_POTION_LAVA", 11306.67),
    ("T8_POTION_GATHER", 11724.44),
];

const MATERIAL_NAMES: &[(&str, &str)] = &[
    ("T1_ALCHEMY_EXTRACT_LEVEL1", "Basic Arcane Extract"),
    ("T2_AGARIC", "Arcane Agaric"),
    ("T3_COMFREY", "Brightleaf Comfrey"),
    ("T4_BURDOCK", "Crenellated Burdock"),
    ("T5_TEASEL", "Dragon Teasel"),
    ("T6_FOXGLOVE", "Elusive Foxglove"),
    ("T7_MULLEIN", "Firetouched Mullein"),
    ("T8_YARROW", "Ghoul Yarrow"),
    ("T3_EGG", "Hen Eggs"),
    ("T5_EGG", "Goose Eggs"),
    ("T4_MILK", "Goat's Milk"),
    ("T6_MILK", "Sheep's Milk"),
    ("T8_MILK", "Cow's Milk"),
    ("T6_BUTTER", "Sheep's Butter"),
    ("T8_BUTTER", "Cow's Butter"),
    ("T6_ALCOHOL", "Potato Schnapps"),
    ("T7_ALCOHOL", "Corn Hooch"),
    ("T8_ALCOHOL", "Pumpkin Moonshine"),
    ("T3_ALCHEMY_RARE_PANTHER", "Rugged Spirit Paws"),
    ("T5_ALCHEMY_RARE_PANTHER", "Fine Spirit Paws"),
    ("T5_ALCHEMY_RARE_IMP", "Fine Imp's Horn"),
    ("T7_ALCHEMY_RARE_IMP", "Excellent Imp's Horn"),
    ("T5_ALCHEMY_RARE_ELEMENTAL", "Fine Runestone Tooth"),
    ("T7_ALCHEMY_RARE_ELEMENTAL", "Excellent Runestone Tooth"),
    ("T5_ALCHEMY_RARE_EAGLE", "Fine Dawnfeather"),
];

/// Display name for an ingredient id, if known.
pub fn material_name(item_id: &str) -> Option<&'static str> {
    MATERIAL_NAMES
        .iter()
        .find(|(id, _)| *id == item_id)
        .map(|(_, name)| *name)
}

/// Read-only recipe lookup, preserving catalog order for listings.
#[derive(Clone, Debug, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    index: HashMap<ItemId, usize>,
}

impl RecipeCatalog {
    pub fn builtin() -> Self {
        Self::from_recipes(
            BUILTIN_RECIPES
                .iter()
                .map(|(id, name, yield_per_craft, ingredients)| {
                    Recipe::new(id, name, *yield_per_craft, ingredients)
                })
                .collect(),
        )
    }

    /// Later duplicates of an id replace earlier ones.
    pub fn from_recipes(recipes: Vec<Recipe>) -> Self {
        let mut unique: Vec<Recipe> = Vec::with_capacity(recipes.len());
        let mut index = HashMap::with_capacity(recipes.len());
        for recipe in recipes {
            match index.get(&recipe.id) {
                Some(&slot) => unique[slot] = recipe,
                None => {
                    index.insert(recipe.id.clone(), unique.len());
                    unique.push(recipe);
                }
            }
        }
        Self {
            recipes: unique,
            index,
        }
    }

    pub fn lookup(&self, potion_id: &str) -> Option<&Recipe> {
        self.index.get(potion_id).map(|&slot| &self.recipes[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    /// Potion ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|recipe| recipe.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Every potion and ingredient id, each once: the set the price feed has to cover.
    pub fn all_item_ids(&self) -> Vec<ItemId> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let ingredients = self
            .recipes
            .iter()
            .flat_map(|r| r.ingredients.iter().map(|(id, _)| id.as_str()));
        for id in self.ids().chain(ingredients) {
            if seen.insert(id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// Fixed per-potion ItemValue constants.
#[derive(Clone, Debug, Default)]
pub struct ItemValueTable {
    values: HashMap<ItemId, f64>,
}

impl ItemValueTable {
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ITEM_VALUES
                .iter()
                .map(|(id, value)| (id.to_string(), *value)),
        )
    }

    pub fn new(entries: impl IntoIterator<Item = (ItemId, f64)>) -> Self {
        Self {
            values: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, potion_id: &str) -> Option<f64> {
        self.values.get(potion_id).copied()
    }
}
