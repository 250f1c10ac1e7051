//! Potion crafting economics for Albion Online: recipe costs, market fees and profit.

pub mod cli;
pub mod domain;
pub mod infra;
pub mod util;
