use super::ui;
use crate::core::balance::{Balance, CurrencyBalance};
use crate::core::currency::Currency;
use crate::core::roster::Roster;
use crate::{App, TripBalance};
use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::Decimal;

pub fn render_currency(balance: &CurrencyBalance, roster: &Roster) -> String {
    let currency = balance.currency;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Participant"),
        ui::header_cell("Paid"),
        ui::header_cell("Share"),
        ui::header_cell("Net"),
    ]);
    for (id, paid) in &balance.totals {
        let net = balance.net.get(id).copied().unwrap_or_default();
        table.add_row(vec![
            Cell::new(roster.name_of(id)),
            ui::money_cell(*paid, currency),
            ui::money_cell(balance.share, currency),
            ui::net_cell(net, currency),
        ]);
    }

    let mut output = format!(
        "{}\n{}\nTotal: {}",
        ui::style_text(currency.code(), ui::StyleType::Title),
        table,
        ui::style_text(&currency.format(balance.total), ui::StyleType::TotalValue)
    );

    if let Some(pair) = &balance.pair {
        match (&pair.debtor, &pair.creditor) {
            (Some(debtor), Some(creditor)) if currency.round(pair.difference) > Decimal::ZERO => {
                output.push_str(&format!(
                    "\n{} owes {} {}",
                    roster.name_of(debtor),
                    roster.name_of(creditor),
                    currency.format(pair.difference)
                ));
            }
            _ => output.push_str("\nAll square"),
        }
        return output;
    }

    if balance.transfers.is_empty() {
        output.push_str("\nAll square");
    }
    for transfer in &balance.transfers {
        output.push_str(&format!(
            "\n{} → {}: {}",
            roster.name_of(&transfer.from),
            roster.name_of(&transfer.to),
            currency.format(transfer.amount)
        ));
    }
    output
}

pub fn render_grand_total(balance: &Balance, roster: &Roster, rate: Decimal) -> String {
    let usd = Currency::REPORTING;
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Participant"), ui::header_cell("Paid (USD)")]);
    for (id, paid) in &balance.grand_total.totals {
        table.add_row(vec![Cell::new(roster.name_of(id)), ui::money_cell(*paid, usd)]);
    }
    format!(
        "{}\n{}\n{} {}\n{}",
        ui::style_text("Grand total", ui::StyleType::Title),
        table,
        ui::style_text("Total:", ui::StyleType::TotalLabel),
        ui::style_text(&usd.format(balance.grand_total.total), ui::StyleType::TotalValue),
        ui::style_text(
            &format!("Exchange rate: {} ARS per USD", Currency::Ars.format(rate)),
            ui::StyleType::Subtle
        )
    )
}

pub fn render(trip_balance: &TripBalance, roster: &Roster) -> String {
    let mut sections: Vec<String> = trip_balance
        .balance
        .by_currency
        .values()
        .map(|b| render_currency(b, roster))
        .collect();
    sections.push(render_grand_total(&trip_balance.balance, roster, trip_balance.rate));
    sections.join("\n\n")
}

pub async fn run(app: &App) -> Result<()> {
    let (_, session) = app.session().await?;
    let spinner = ui::new_spinner("Computing balance...");
    let trip_balance = app.balance(&session).await;
    spinner.finish_and_clear();

    println!("{}", render(&trip_balance, &session.roster));
    Ok(())
}
