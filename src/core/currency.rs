//! Currencies, conversion and the exchange-rate quote source abstraction

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The two currencies a trip is tracked in.
///
/// USD is the reporting currency: normalized amounts, plan summaries and
/// grand totals are all expressed in it. Rates are quoted as ARS per USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Ars,
}

impl Currency {
    pub const REPORTING: Currency = Currency::Usd;
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Ars];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ars => "ARS",
        }
    }

    /// Decimal places kept when an amount is converted into this currency.
    pub fn decimals(&self) -> u32 {
        match self {
            Currency::Usd => 2,
            Currency::Ars => 0,
        }
    }

    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimals(), RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn format(&self, amount: Decimal) -> String {
        let precision = self.decimals() as usize;
        format!("{} {:.precision$}", self.code(), self.round(amount))
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "ARS" => Ok(Currency::Ars),
            _ => Err(anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// Converts an ARS amount into USD, rounded to cents.
///
/// A non-positive rate cannot convert anything and yields zero.
pub fn normalize(amount: Decimal, rate: Decimal) -> Decimal {
    convert(amount, Currency::Ars, Currency::Usd, rate)
}

/// Converts `amount` between currencies using a rate quoted as ARS per USD.
///
/// Results too large for a `Decimal` saturate at its bounds.
pub fn convert(amount: Decimal, from: Currency, to: Currency, rate: Decimal) -> Decimal {
    if from == to {
        return amount;
    }
    if rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let converted = match (from, to) {
        (Currency::Ars, Currency::Usd) => amount.checked_div(rate),
        (Currency::Usd, Currency::Ars) => amount.checked_mul(rate),
        _ => Some(amount),
    };
    let saturated = if amount.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    };
    to.round(converted.unwrap_or(saturated))
}

/// A quote from the exchange-rate source. Conversions use the sell price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub buy: Decimal,
    pub sell: Decimal,
    pub as_of: DateTime<Utc>,
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn fetch_quote(&self) -> Result<RateQuote>;
}
