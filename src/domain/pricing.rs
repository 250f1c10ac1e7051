//! Turns a price table into one usable quote per item.
//!
//! The preferred city wins when it has a positive quote. Otherwise the fixed
//! city order is walked (skipping the preferred city), then any other city in
//! the table. A missing quote is never an error: it resolves to `0.0` with a
//! [`PriceSource`] that says why.

use super::catalog::FALLBACK_CITY_ORDER;
use super::entities::{PriceKind, PriceQuote, PriceSource, PriceTable};

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPrice {
    pub value: f64,
    pub source: PriceSource,
}

impl ResolvedPrice {
    fn found(value: f64, source: PriceSource) -> Self {
        Self { value, source }
    }

    fn missing(source: PriceSource) -> Self {
        Self { value: 0.0, source }
    }

    pub fn is_available(&self) -> bool {
        self.value > 0.0
    }

    /// Human-readable note for anything other than a direct hit.
    pub fn diagnostic(&self, item_id: &str, preferred_city: &str, kind: PriceKind) -> Option<String> {
        match &self.source {
            PriceSource::Preferred => None,
            PriceSource::Fallback { city } => Some(format!(
                "no {} for {item_id} in {preferred_city}, using {city}: {}",
                kind.as_str(),
                self.value
            )),
            PriceSource::NoData => Some(format!("{item_id} not found in price data")),
            PriceSource::Unavailable => Some(format!(
                "no positive {} for {item_id} in any city",
                kind.as_str()
            )),
        }
    }
}

pub fn resolve_price(
    item_id: &str,
    prices: &PriceTable,
    preferred_city: &str,
    kind: PriceKind,
) -> ResolvedPrice {
    let Some(quotes) = prices.get(item_id) else {
        return ResolvedPrice::missing(PriceSource::NoData);
    };

    if let Some(value) = positive(quotes.get(preferred_city), kind) {
        return ResolvedPrice::found(value, PriceSource::Preferred);
    }

    for city in FALLBACK_CITY_ORDER
        .iter()
        .copied()
        .filter(|city| *city != preferred_city)
    {
        if let Some(value) = positive(quotes.get(city), kind) {
            return ResolvedPrice::found(
                value,
                PriceSource::Fallback {
                    city: city.to_string(),
                },
            );
        }
    }

    // Cities outside the fixed order (e.g. the Black Market); sorted so the pick is stable.
    let mut others: Vec<_> = quotes
        .iter()
        .filter(|(city, _)| {
            city.as_str() != preferred_city && !FALLBACK_CITY_ORDER.contains(&city.as_str())
        })
        .collect();
    others.sort_by(|a, b| a.0.cmp(b.0));

    for (city, quote) in others {
        if let Some(value) = positive(Some(quote), kind) {
            return ResolvedPrice::found(value, PriceSource::Fallback { city: city.clone() });
        }
    }

    ResolvedPrice::missing(PriceSource::Unavailable)
}

fn positive(quote: Option<&PriceQuote>, kind: PriceKind) -> Option<f64> {
    quote
        .map(|quote| kind.value(quote))
        .filter(|value| value.is_finite() && *value > 0.0)
}
