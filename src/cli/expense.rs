use super::{done, submitted, today, ui};
use crate::App;
use crate::core::currency::Currency;
use crate::core::expense::{ExpenseCategory, ExpenseDraft, ExpenseView};
use crate::core::obligation::PaymentDraft;
use crate::core::roster::{ParticipantId, Roster};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use comfy_table::Cell;
use rust_decimal::Decimal;

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PaymentArgs {
    pub amount: Decimal,
    /// Who paid this installment
    #[arg(short, long)]
    pub payer: String,
    /// Installment number, defaults to the next one
    #[arg(short, long)]
    pub number: Option<u32>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl PaymentArgs {
    pub fn into_draft(self, parent_id: String, installments_paid: usize) -> PaymentDraft {
        let next = u32::try_from(installments_paid).unwrap_or(u32::MAX).saturating_add(1);
        PaymentDraft {
            parent_id,
            installment_number: self.number.unwrap_or(next),
            amount: self.amount,
            payer: ParticipantId::new(self.payer),
            payment_date: self.date.unwrap_or_else(today),
            notes: self.notes,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ExpenseCommand {
    /// List expenses of the current trip
    List,
    /// Record an expense
    Add {
        description: String,
        amount: Decimal,
        #[arg(long, default_value = "USD")]
        currency: Currency,
        #[arg(short = 'k', long, default_value = "other")]
        category: ExpenseCategory,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Number of installments; more than one means payments are
        /// registered separately
        #[arg(short, long, default_value_t = 1)]
        installments: u32,
        /// Who paid, required for single payments
        #[arg(short, long)]
        payer: Option<String>,
    },
    /// Change an expense, keeping unspecified fields
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        currency: Option<Currency>,
        #[arg(short = 'k', long)]
        category: Option<ExpenseCategory>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        installments: Option<u32>,
        #[arg(short, long)]
        payer: Option<String>,
    },
    /// Delete an expense and its installment payments
    Remove { id: String },
    /// Register an installment payment
    Pay {
        expense_id: String,
        #[command(flatten)]
        payment: PaymentArgs,
    },
    /// Delete an installment payment
    Unpay { payment_id: String },
}

pub fn payer_label(view: &ExpenseView, roster: &Roster) -> String {
    match &view.expense.payer {
        Some(payer) if view.expense.is_single_payment() => roster.name_of(payer).to_string(),
        _ => {
            let payers: Vec<&str> = view
                .contributions()
                .keys()
                .map(|id| roster.name_of(id))
                .collect();
            if payers.is_empty() {
                "-".to_string()
            } else {
                payers.join(", ")
            }
        }
    }
}

pub fn render_expenses(views: &[ExpenseView], roster: &Roster) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Description"),
        ui::header_cell("Category"),
        ui::header_cell("Amount"),
        ui::header_cell("USD"),
        ui::header_cell("Paid by"),
        ui::header_cell("Installments"),
        ui::header_cell("Progress"),
        ui::header_cell("Id"),
    ]);
    for view in views {
        let expense = &view.expense;
        let installments = if expense.is_single_payment() {
            "-".to_string()
        } else {
            format!("{}/{}", view.progress.installments_paid, expense.installments)
        };
        table.add_row(vec![
            Cell::new(expense.date),
            Cell::new(&expense.description),
            Cell::new(expense.category),
            ui::money_cell(expense.amount, expense.currency),
            ui::money_cell(expense.amount_usd, Currency::Usd),
            Cell::new(payer_label(view, roster)),
            Cell::new(installments),
            ui::progress_cell(view.progress.percent),
            Cell::new(&expense.id),
        ]);
    }
    table.to_string()
}

pub fn render_payments(view: &ExpenseView, roster: &Roster) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Date"),
        ui::header_cell("Amount"),
        ui::header_cell("Payer"),
        ui::header_cell("Notes"),
        ui::header_cell("Id"),
    ]);
    for payment in &view.payments {
        table.add_row(vec![
            Cell::new(payment.installment_number),
            Cell::new(payment.payment_date),
            ui::money_cell(payment.amount, view.expense.currency),
            Cell::new(roster.name_of(&payment.payer)),
            ui::format_optional_cell(payment.notes.as_deref(), str::to_string),
            Cell::new(&payment.id),
        ]);
    }
    format!(
        "{}\n{}\nRemaining: {}",
        ui::style_text(&view.expense.description, ui::StyleType::Title),
        table,
        view.expense.currency.format(view.progress.remaining)
    )
}

pub async fn run(app: &App, command: ExpenseCommand) -> Result<()> {
    let (_, session) = app.session().await?;
    match command {
        ExpenseCommand::List => {
            let spinner = ui::new_spinner("Loading expenses...");
            let rate = app.current_rate().await;
            let views = app.expenses.list(&session, rate).await;
            spinner.finish_and_clear();

            if views.is_empty() {
                println!("No expenses yet.");
                return Ok(());
            }
            println!("{}", render_expenses(&views, &session.roster));
            for view in views.iter().filter(|v| !v.payments.is_empty()) {
                ui::print_separator();
                println!("{}", render_payments(view, &session.roster));
            }
        }
        ExpenseCommand::Add {
            description,
            amount,
            currency,
            category,
            date,
            installments,
            payer,
        } => {
            let draft = ExpenseDraft {
                date: date.unwrap_or_else(today),
                description,
                category,
                currency,
                amount,
                installments,
                payer: payer.map(ParticipantId::new),
            };
            draft.validate(&session.roster)?;
            let expense = submitted(app.expenses.add(&session, draft).await, "Expense")?;
            println!(
                "Added {} ({}) as {}",
                expense.currency.format(expense.amount),
                Currency::Usd.format(expense.amount_usd),
                expense.id
            );
        }
        ExpenseCommand::Edit {
            id,
            description,
            amount,
            currency,
            category,
            date,
            installments,
            payer,
        } => {
            let rate = app.current_rate().await;
            let existing = app
                .expenses
                .list(&session, rate)
                .await
                .into_iter()
                .find(|v| v.expense.id == id)
                .ok_or_else(|| anyhow!("No expense with id {id} in this trip"))?
                .expense;
            let draft = ExpenseDraft {
                date: date.unwrap_or(existing.date),
                description: description.unwrap_or(existing.description),
                category: category.unwrap_or(existing.category),
                currency: currency.unwrap_or(existing.currency),
                amount: amount.unwrap_or(existing.amount),
                installments: installments.unwrap_or(existing.installments),
                payer: payer.map(ParticipantId::new).or(existing.payer),
            };
            draft.validate(&session.roster)?;
            let expense = submitted(app.expenses.edit(&session, &id, draft).await, "Expense")?;
            println!("Updated expense {}", expense.id);
        }
        ExpenseCommand::Remove { id } => {
            done(app.expenses.remove(&session, &id).await, "Removing the expense")?;
            println!("Removed expense {id}");
        }
        ExpenseCommand::Pay {
            expense_id,
            payment,
        } => {
            let rate = app.current_rate().await;
            let paid = app
                .expenses
                .list(&session, rate)
                .await
                .into_iter()
                .find(|v| v.expense.id == expense_id)
                .map_or(0, |v| v.progress.installments_paid);
            let draft = payment.into_draft(expense_id, paid);
            draft.validate(&session.roster)?;
            let payment = submitted(
                app.expenses.add_payment(&session, draft).await,
                "Installment payment",
            )?;
            println!(
                "Registered installment {} as {}",
                payment.installment_number, payment.id
            );
        }
        ExpenseCommand::Unpay { payment_id } => {
            done(
                app.expenses.remove_payment(&session, &payment_id).await,
                "Removing the payment",
            )?;
            println!("Removed payment {payment_id}");
        }
    }
    Ok(())
}
