use super::{done, ui};
use crate::App;
use crate::core::currency::Currency;
use crate::core::error::ValidationError;
use crate::core::rate::{CachedRate, RateSource};
use anyhow::Result;
use clap::Subcommand;
use rust_decimal::Decimal;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RateCommand {
    /// Show the rate in use and where it came from
    Show,
    /// Pin a manual ARS per USD rate
    Set { rate: Decimal },
    /// Forget the cached rate so the next read fetches a fresh quote
    Clear,
}

pub fn describe(rate: Decimal, cached: Option<&CachedRate>) -> String {
    let mut output = format!(
        "{} {} per USD",
        ui::style_text("Exchange rate:", ui::StyleType::TotalLabel),
        ui::style_text(&Currency::Ars.format(rate), ui::StyleType::TotalValue)
    );
    let origin = match cached {
        Some(entry) if entry.rate == rate => {
            let source = match entry.source {
                RateSource::Api => "dolar blue quote",
                RateSource::Manual => "manual override",
            };
            format!("{source}, set {}", entry.timestamp.format("%Y-%m-%d %H:%M UTC"))
        }
        _ => "configured default".to_string(),
    };
    output.push_str(&format!("\n{}", ui::style_text(&origin, ui::StyleType::Subtle)));
    output
}

pub async fn run(app: &App, command: RateCommand) -> Result<()> {
    match command {
        RateCommand::Show => {
            let spinner = ui::new_spinner("Fetching exchange rate...");
            let rate = app.current_rate().await;
            let cached = app.rates.cached().await;
            spinner.finish_and_clear();
            println!("{}", describe(rate, cached.as_ref()));
        }
        RateCommand::Set { rate } => {
            if rate <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveRate(rate).into());
            }
            done(app.rates.set_manual_rate(rate).await, "Setting the rate")?;
            println!("Exchange rate pinned at {}", Currency::Ars.format(rate));
        }
        RateCommand::Clear => {
            app.rates.clear_rate().await;
            println!("Exchange rate cache cleared");
        }
    }
    Ok(())
}
