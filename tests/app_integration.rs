use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use tripsplit::cli::expense::ExpenseCommand;
use tripsplit::cli::itinerary::{NoteCommand, PlaceCommand};
use tripsplit::cli::plan::PlanCommand;
use tripsplit::cli::rate::RateCommand;
use tripsplit::cli::trip::TripCommand;
use tripsplit::config::AppConfig;
use tripsplit::core::currency::Currency;
use tripsplit::core::expense::ExpenseCategory;
use tripsplit::core::itinerary::PlaceCategory;
use tripsplit::core::plan::PlanCategory;
use tripsplit::{App, AppCommand};

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_dolar_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/dolares/blue"))
            .respond_with(response)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub fn blue_quote(compra: u32, venta: u32) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(format!(
            r#"{{
                "moneda": "USD",
                "casa": "blue",
                "nombre": "Blue",
                "compra": {compra},
                "venta": {venta},
                "fechaActualizacion": "2026-03-01T14:00:00.000Z"
            }}"#
        ))
    }
}

fn write_config(dir: &Path, base_url: &str, default_rate: u32) -> String {
    let config_path = dir.join("config.yaml");
    let content = format!(
        r#"
        exchange:
          provider:
            base_url: "{}"
          default_rate: {}
        data_path: "{}"
    "#,
        base_url,
        default_rate,
        dir.join("data").display()
    );
    fs::write(&config_path, content).expect("Failed to write config file");
    config_path.to_string_lossy().into_owned()
}

async fn run(command: AppCommand, config_path: &str) {
    let result = tripsplit::run_command(command.clone(), Some(config_path)).await;
    assert!(
        result.is_ok(),
        "{command:?} failed with: {:?}",
        result.err()
    );
}

async fn create_trip(config_path: &str) {
    run(
        AppCommand::Trip(TripCommand::Create {
            name: "Bariloche".to_string(),
            participants: vec!["juan:Juan".to_string(), "vale:Vale".to_string()],
            destination: Some("Bariloche, Río Negro".to_string()),
            start: "2026-07-10".parse().ok(),
            end: "2026-07-19".parse().ok(),
        }),
        config_path,
    )
    .await;
}

fn add_expense(description: &str, amount: i64, currency: Currency, payer: &str) -> AppCommand {
    AppCommand::Expense(ExpenseCommand::Add {
        description: description.to_string(),
        amount: Decimal::from(amount),
        currency,
        category: ExpenseCategory::Food,
        date: "2026-07-12".parse().ok(),
        installments: 1,
        payer: Some(payer.to_string()),
    })
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_dolar_mock_server(test_utils::blue_quote(1180, 1200)).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), 1000);

    create_trip(&config_path).await;
    run(add_expense("Cena", 100, Currency::Usd, "juan"), &config_path).await;
    run(add_expense("Taxi", 12_000, Currency::Ars, "vale"), &config_path).await;
    run(
        AppCommand::Plan(PlanCommand::Add {
            name: "Vuelos".to_string(),
            total: Decimal::from(800),
            currency: Currency::Usd,
            category: PlanCategory::Flights,
            installments: 4,
            start: None,
            description: None,
            notes: None,
        }),
        &config_path,
    )
    .await;
    run(
        AppCommand::Place(PlaceCommand::Add {
            name: "Cerro Otto".to_string(),
            category: PlaceCategory::Nature,
            address: None,
            url: None,
            notes: None,
        }),
        &config_path,
    )
    .await;
    run(
        AppCommand::Note(NoteCommand::Add {
            title: "Cambio".to_string(),
            content: "Llevar billetes chicos".to_string(),
            pinned: true,
        }),
        &config_path,
    )
    .await;
    for command in [
        AppCommand::Balance,
        AppCommand::Stats,
        AppCommand::Rate(RateCommand::Show),
        AppCommand::Expense(ExpenseCommand::List),
        AppCommand::Plan(PlanCommand::List),
        AppCommand::Place(PlaceCommand::List {
            category: None,
            visited: false,
            pending: true,
        }),
        AppCommand::Note(NoteCommand::List),
    ] {
        run(command, &config_path).await;
    }

    let plan_id = {
        let app = App::from_config(AppConfig::load_from_path(&config_path).unwrap()).unwrap();
        let (_, session) = app.session().await.unwrap();
        let rate = app.current_rate().await;
        assert_eq!(rate, Decimal::from(1200));

        let trip_balance = app.balance(&session).await;
        let taxi = trip_balance
            .expenses
            .iter()
            .find(|v| v.expense.description == "Taxi")
            .unwrap();
        assert_eq!(taxi.expense.amount_usd, Decimal::from(10));

        let usd = trip_balance.balance.currency(Currency::Usd).unwrap();
        let pair = usd.pair.as_ref().unwrap();
        assert_eq!(pair.difference, Decimal::from(50));
        assert_eq!(pair.debtor, Some("vale".into()));

        let ars = trip_balance.balance.currency(Currency::Ars).unwrap();
        assert_eq!(ars.pair.as_ref().unwrap().debtor, Some("juan".into()));
        assert_eq!(trip_balance.balance.grand_total.total, Decimal::from(110));

        app.plans.list(&session, rate).await[0].plan.id.clone()
    };

    run(
        AppCommand::Plan(PlanCommand::Pay {
            plan_id,
            payment: tripsplit::cli::expense::PaymentArgs {
                amount: Decimal::from(200),
                payer: "vale".to_string(),
                number: None,
                date: "2026-03-01".parse().ok(),
                notes: None,
            },
        }),
        &config_path,
    )
    .await;

    let app = App::from_config(AppConfig::load_from_path(&config_path).unwrap()).unwrap();
    let (_, session) = app.session().await.unwrap();
    let trip_balance = app.balance(&session).await;
    assert_eq!(trip_balance.plans.paid, Decimal::from(200));
    assert_eq!(trip_balance.plans.percent, 25);
    let usd = trip_balance.balance.currency(Currency::Usd).unwrap();
    assert_eq!(usd.paid_by(&"vale".into()), Decimal::from(200));
    assert_eq!(app.notes.sorted(&session).await.len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_rate_falls_back_when_quote_source_fails() {
    let mock_server =
        test_utils::create_dolar_mock_server(wiremock::ResponseTemplate::new(503)).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), 1000);

    create_trip(&config_path).await;
    run(add_expense("Alfajores", 5_000, Currency::Ars, "juan"), &config_path).await;

    let app = App::from_config(AppConfig::load_from_path(&config_path).unwrap()).unwrap();
    let (_, session) = app.session().await.unwrap();
    let views = app.expenses.list(&session, Decimal::from(1000)).await;
    assert_eq!(views[0].expense.amount_usd, Decimal::from(5));
    assert!(app.rates.cached().await.is_none());
}

#[test_log::test(tokio::test)]
async fn test_manual_rate_survives_restarts() {
    let mock_server = test_utils::create_dolar_mock_server(test_utils::blue_quote(1480, 1500)).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), 1000);

    run(
        AppCommand::Rate(RateCommand::Set {
            rate: Decimal::from(1250),
        }),
        &config_path,
    )
    .await;

    let app = App::from_config(AppConfig::load_from_path(&config_path).unwrap()).unwrap();
    assert_eq!(app.current_rate().await, Decimal::from(1250));
    drop(app);

    run(AppCommand::Rate(RateCommand::Clear), &config_path).await;
    let app = App::from_config(AppConfig::load_from_path(&config_path).unwrap()).unwrap();
    assert_eq!(app.current_rate().await, Decimal::from(1500));
}

#[test_log::test(tokio::test)]
async fn test_commands_need_a_selected_trip() {
    let mock_server = test_utils::create_dolar_mock_server(test_utils::blue_quote(1180, 1200)).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), 1000);

    let result = tripsplit::run_command(AppCommand::Balance, Some(&config_path)).await;
    let error = result.expect_err("balance without a trip should fail");
    assert!(error.to_string().contains("No trip selected"));
}

#[test_log::test(tokio::test)]
async fn test_unusable_data_path_fails_instead_of_dropping_writes() {
    let mock_server = test_utils::create_dolar_mock_server(test_utils::blue_quote(1180, 1200)).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), 1000);
    // The data path is taken by a regular file
    fs::write(temp_dir.path().join("data"), "not a directory").expect("Failed to write file");

    let result = tripsplit::run_command(
        AppCommand::Trip(TripCommand::Create {
            name: "Bariloche".to_string(),
            participants: vec!["juan:Juan".to_string()],
            destination: None,
            start: None,
            end: None,
        }),
        Some(&config_path),
    )
    .await;
    let error = result.expect_err("creating a trip without a usable store should fail");
    assert!(format!("{error:#}").contains("Cannot use the data directory"));

    let result = tripsplit::run_command(AppCommand::Trip(TripCommand::List), Some(&config_path)).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_invalid_expense_is_reported() {
    let mock_server = test_utils::create_dolar_mock_server(test_utils::blue_quote(1180, 1200)).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), 1000);
    create_trip(&config_path).await;

    // Single payment by someone outside the roster
    let result =
        tripsplit::run_command(add_expense("Cena", 10, Currency::Usd, "pedro"), Some(&config_path))
            .await;
    assert!(result.is_err());
}
