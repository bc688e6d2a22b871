use super::expense::PaymentArgs;
use super::{done, submitted, ui};
use crate::App;
use crate::core::currency::Currency;
use crate::core::plan::{PlanCategory, PlanDraft, PlanSummary, PlanView};
use crate::core::roster::Roster;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::Subcommand;
use comfy_table::Cell;
use rust_decimal::Decimal;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PlanCommand {
    /// List payment plans of the current trip with a summary
    List,
    /// Commit to a payment plan
    Add {
        name: String,
        total: Decimal,
        #[arg(long, default_value = "USD")]
        currency: Currency,
        #[arg(short = 'k', long, default_value = "other")]
        category: PlanCategory,
        #[arg(short, long, default_value_t = 1)]
        installments: u32,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change a plan, keeping unspecified fields
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        total: Option<Decimal>,
        #[arg(long)]
        currency: Option<Currency>,
        #[arg(short = 'k', long)]
        category: Option<PlanCategory>,
        #[arg(short, long)]
        installments: Option<u32>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a plan and its payments
    Remove { id: String },
    /// Register a payment toward a plan
    Pay {
        plan_id: String,
        #[command(flatten)]
        payment: PaymentArgs,
    },
    /// Delete a plan payment
    Unpay { payment_id: String },
}

pub fn render_plans(views: &[PlanView], summary: &PlanSummary, roster: &Roster) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Category"),
        ui::header_cell("Total"),
        ui::header_cell("Paid"),
        ui::header_cell("Remaining"),
        ui::header_cell("Installments"),
        ui::header_cell("Progress"),
        ui::header_cell("Id"),
    ]);
    for view in views {
        let plan = &view.plan;
        table.add_row(vec![
            Cell::new(&plan.name),
            Cell::new(plan.category),
            ui::money_cell(plan.total, plan.currency),
            ui::money_cell(view.progress.paid, plan.currency),
            ui::money_cell(view.progress.remaining, plan.currency),
            Cell::new(format!("{}/{}", view.progress.installments_paid, plan.installments)),
            ui::progress_cell(view.progress.percent),
            Cell::new(&plan.id),
        ]);
    }

    let usd = Currency::REPORTING;
    let mut output = table.to_string();
    output.push_str(&format!(
        "\n\n{} {} committed, {} paid, {} remaining ({}%)",
        ui::style_text("Plans:", ui::StyleType::TotalLabel),
        usd.format(summary.committed),
        ui::style_text(&usd.format(summary.paid), ui::StyleType::TotalValue),
        usd.format(summary.remaining),
        summary.percent
    ));
    for (id, amount) in &summary.paid_by {
        output.push_str(&format!("\n  {}: {}", roster.name_of(id), usd.format(*amount)));
    }
    output
}

pub async fn run(app: &App, command: PlanCommand) -> Result<()> {
    let (_, session) = app.session().await?;
    match command {
        PlanCommand::List => {
            let spinner = ui::new_spinner("Loading payment plans...");
            let rate = app.current_rate().await;
            let views = app.plans.list(&session, rate).await;
            spinner.finish_and_clear();

            if views.is_empty() {
                println!("No payment plans yet.");
                return Ok(());
            }
            let summary = PlanSummary::from_views(&views, rate);
            println!("{}", render_plans(&views, &summary, &session.roster));
        }
        PlanCommand::Add {
            name,
            total,
            currency,
            category,
            installments,
            start,
            description,
            notes,
        } => {
            let draft = PlanDraft {
                name,
                description,
                category,
                currency,
                total,
                installments,
                start_date: start,
                notes,
            };
            draft.validate()?;
            let plan = submitted(app.plans.add(&session, draft).await, "Payment plan")?;
            println!(
                "Added plan {} for {} as {}",
                plan.name,
                plan.currency.format(plan.total),
                plan.id
            );
        }
        PlanCommand::Edit {
            id,
            name,
            total,
            currency,
            category,
            installments,
            start,
            description,
            notes,
        } => {
            let existing = app
                .plans
                .list(&session, Decimal::ONE)
                .await
                .into_iter()
                .find(|v| v.plan.id == id)
                .ok_or_else(|| anyhow!("No payment plan with id {id} in this trip"))?
                .plan;
            let draft = PlanDraft {
                name: name.unwrap_or(existing.name),
                description: description.or(existing.description),
                category: category.unwrap_or(existing.category),
                currency: currency.unwrap_or(existing.currency),
                total: total.unwrap_or(existing.total),
                installments: installments.unwrap_or(existing.installments),
                start_date: start.or(existing.start_date),
                notes: notes.or(existing.notes),
            };
            draft.validate()?;
            let plan = submitted(app.plans.edit(&session, &id, draft).await, "Payment plan")?;
            println!("Updated plan {}", plan.id);
        }
        PlanCommand::Remove { id } => {
            done(app.plans.remove(&session, &id).await, "Removing the plan")?;
            println!("Removed plan {id}");
        }
        PlanCommand::Pay { plan_id, payment } => {
            let paid = app
                .plans
                .list(&session, Decimal::ONE)
                .await
                .into_iter()
                .find(|v| v.plan.id == plan_id)
                .map_or(0, |v| v.progress.installments_paid);
            let draft = payment.into_draft(plan_id, paid);
            draft.validate(&session.roster)?;
            let payment = submitted(app.plans.add_payment(&session, draft).await, "Plan payment")?;
            println!(
                "Registered installment {} as {}",
                payment.installment_number, payment.id
            );
        }
        PlanCommand::Unpay { payment_id } => {
            done(app.plans.remove_payment(&session, &payment_id).await, "Removing the payment")?;
            println!("Removed payment {payment_id}");
        }
    }
    Ok(())
}
