//! Command-line front end.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{builder::PossibleValuesParser, Args, Parser, Subcommand};
use tracing::info;

use crate::domain::{CraftCostEngine, CraftRequest, ItemValueTable, RecipeCatalog, CITIES};
use crate::infra::albion::{load_prices, AlbionClient, CacheStatus, PricesPayload};
use crate::infra::cache::{cache_status, default_cache_path};
use crate::util::config::{load_config, save_config, AppConfig};
use crate::util::version::{version_label, APP_NAME};

#[derive(Parser, Debug)]
#[command(name = "potion-craft", version)]
#[command(about = "Potion crafting cost and profit calculator for Albion Online")]
pub struct Cli {
    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the price cache file
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calculate crafting cost and profit for a potion
    Calc(CalcArgs),

    /// List all craftable potions
    Potions,

    /// Force a price refresh from the API
    Refresh,

    /// Show how fresh the price cache is
    CacheStatus,

    /// Write a config file with the default settings
    InitConfig,
}

#[derive(Args, Debug)]
pub struct CalcArgs {
    /// Potion item id (e.g. "T5_POTION_REVIVE")
    pub potion_id: String,

    /// City where the potions are crafted
    #[arg(long, value_parser = PossibleValuesParser::new(CITIES))]
    pub craft_city: String,

    /// City where the potions are sold
    #[arg(long, value_parser = PossibleValuesParser::new(CITIES))]
    pub sell_city: String,

    /// Number of finished potions wanted
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub quantity: u32,

    /// Station fee per 100 nutrition
    #[arg(long, default_value_t = 0.0)]
    pub machine_cost: f64,

    /// Craft with focus (-20% cost)
    #[arg(long)]
    pub focus: bool,

    /// Additional cost reduction in percent (0-100)
    #[arg(long, value_name = "PCT")]
    pub extra_bonus: Option<f64>,

    /// Final resource return in percent as shown at the station (defaults by craft city)
    #[arg(long, value_name = "PCT")]
    pub return_rate: Option<f64>,

    /// Price ingredients at buy orders instead of sell orders
    #[arg(long)]
    pub buy_price: bool,

    /// Premium account (halved sales tax)
    #[arg(long)]
    pub premium: bool,

    /// Ignore the price cache and fetch fresh prices
    #[arg(long)]
    pub refresh: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl CalcArgs {
    pub fn to_request(&self, config: &AppConfig) -> CraftRequest {
        let return_rate = self
            .return_rate
            .map(|pct| pct / 100.0)
            .unwrap_or_else(|| config.return_rate_for(&self.craft_city));
        CraftRequest {
            machine_cost_per_100: self.machine_cost,
            focus: self.focus,
            extra_bonus_pct: self.extra_bonus,
            return_rate,
            use_buy_price: self.buy_price,
            premium: self.premium,
            ..CraftRequest::new(self.potion_id.clone(), self.quantity)
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());
    let cache_path = cli.cache.clone().unwrap_or_else(default_cache_path);
    let recipes = RecipeCatalog::builtin();

    match cli.command {
        Commands::Calc(args) => {
            let request = args.to_request(&config);
            request.validate()?;

            let payload = fetch_prices(&config, &cache_path, &recipes, args.refresh).await?;
            let item_values = ItemValueTable::builtin();
            let engine = CraftCostEngine::new(
                &recipes,
                &item_values,
                &payload.prices,
                args.craft_city.as_str(),
                args.sell_city.as_str(),
            );
            let result = engine.calculate(&request);

            if args.json {
                info!("[prices] {}", payload.freshness());
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            if let Some(error) = result.error() {
                return Err(error.clone().into());
            }
            print!("{result}");
            println!("{}", payload.freshness());
        }

        Commands::Potions => {
            println!("{:<24} {:<32} {:>5}", "Id", "Potion", "Yield");
            println!("{}", "-".repeat(63));
            for recipe in recipes.iter() {
                println!(
                    "{:<24} {:<32} {:>5}",
                    recipe.id,
                    recipe.name,
                    recipe.potion_yield()
                );
            }
        }

        Commands::Refresh => {
            let payload = fetch_prices(&config, &cache_path, &recipes, true).await?;
            if payload.status == CacheStatus::Stale {
                println!(
                    "Refresh failed; keeping cached prices for {} items.",
                    payload.prices.len()
                );
            } else {
                println!("Updated prices for {} items.", payload.prices.len());
            }
            println!("{}", payload.freshness());
        }

        Commands::CacheStatus => {
            println!("{}", cache_status(&cache_path, config.cache_max_age()));
        }

        Commands::InitConfig => {
            let path = save_config(cli.config.as_deref(), &config)?;
            println!("{} {}: wrote {}", APP_NAME, version_label(), path.display());
        }
    }

    Ok(())
}

async fn fetch_prices(
    config: &AppConfig,
    cache_path: &Path,
    recipes: &RecipeCatalog,
    force_refresh: bool,
) -> Result<PricesPayload> {
    let client = AlbionClient::new(config)?;
    let payload = load_prices(
        &client,
        cache_path,
        &recipes.all_item_ids(),
        config.cache_max_age(),
        force_refresh,
    )
    .await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calc_arguments_build_a_request() {
        let cli = Cli::try_parse_from([
            "potion-craft",
            "calc",
            "T6_POTION_HEAL",
            "--craft-city",
            "Brecilien",
            "--sell-city",
            "Caerleon",
            "-q",
            "12",
            "--focus",
            "--extra-bonus",
            "10",
            "--premium",
        ])
        .unwrap();
        let Commands::Calc(args) = cli.command else {
            panic!("expected calc");
        };

        let request = args.to_request(&AppConfig::default());
        assert_eq!(request.potion_id, "T6_POTION_HEAL");
        assert_eq!(request.quantity, 12);
        assert!(request.focus && request.premium && !request.use_buy_price);
        assert_eq!(request.extra_bonus_pct, Some(10.0));
        assert!((request.return_rate - 0.248).abs() < 1e-12);
    }

    #[test]
    fn explicit_return_rate_is_a_percentage() {
        let cli = Cli::try_parse_from([
            "potion-craft",
            "calc",
            "T5_POTION_REVIVE",
            "--craft-city",
            "Martlock",
            "--sell-city",
            "Martlock",
            "--return-rate",
            "36.7",
        ])
        .unwrap();
        let Commands::Calc(args) = cli.command else {
            panic!("expected calc");
        };
        assert!((args.to_request(&AppConfig::default()).return_rate - 0.367).abs() < 1e-12);
    }

    #[test]
    fn unknown_city_and_zero_quantity_are_rejected() {
        assert!(Cli::try_parse_from([
            "potion-craft",
            "calc",
            "T5_POTION_REVIVE",
            "--craft-city",
            "Atlantis",
            "--sell-city",
            "Martlock",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "potion-craft",
            "calc",
            "T5_POTION_REVIVE",
            "--craft-city",
            "Martlock",
            "--sell-city",
            "Martlock",
            "-q",
            "0",
        ])
        .is_err());
    }
}
