// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{arg, ArgMatches, Command};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Use library instead of local modules
use expense_ledger::{
    format_amount, settings::CLIENT_NAME, Category, ExpenseInput, ExpenseRecord, Ledger, LedgerError,
    LocalStorage, Persistence, Settings, SqliteStore, VERSION,
};

type AppLedger = Ledger<LocalStorage<SqliteStore>>;

fn cli() -> Command<'static> {
    Command::new(CLIENT_NAME)
        .about("Record expenses, see the running total and a per-category breakdown.")
        .version(VERSION)
        .arg(arg!(CONFIG: -c --config [FILE] "Sets a custom config file"))
        .arg(arg!(verbose: -v --verbose "Writes logs (to the log file in UI mode, stderr otherwise)"))
        .subcommand(Command::new("ui").about("Opens the interactive ledger (default)."))
        .subcommand(Command::new("add")
            .about("Adds an expense dated today.")
            .arg(arg!(description: -d --description <TEXT> "What the money was spent on."))
            .arg(arg!(amount: -a --amount <AMOUNT> "Amount spent, e.g. 4.50."))
            .arg(arg!(category: -k --category [CATEGORY] "Food, Transport, Entertainment, Bills, Shopping or Other. Defaults to Food.")))
        .subcommand(Command::new("list").about("Prints the summary and every expense, newest first."))
        .subcommand(Command::new("delete")
            .about("Deletes an expense by id. Unknown ids are ignored.")
            .arg(arg!(id: <ID> "The id shown by `list`.")))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let settings = Settings::new(matches.value_of("CONFIG")).context("Failed to read configuration")?;
    let tui_mode = matches!(matches.subcommand(), None | Some(("ui", _)));

    if matches.is_present("verbose") {
        init_logging(&settings, tui_mode)?;
    }

    let mut ledger = open_ledger(&settings)?;

    match matches.subcommand() {
        Some(("add", add_matches)) => run_add(&mut ledger, add_matches),
        Some(("list", _)) => {
            print_ledger(&ledger, &settings.currency_symbol);
            Ok(())
        }
        Some(("delete", delete_matches)) => {
            let id = delete_matches.value_of("id").unwrap_or_default();
            ledger.delete_expense(id).context("Failed to save expenses")?;
            Ok(())
        }
        _ => run_ui_mode(ledger, &settings),
    }
}

fn init_logging(settings: &Settings, tui_mode: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if tui_mode {
        // The terminal belongs to the UI, so logs go to a file
        ensure_parent_dir(Path::new(&settings.log_file))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)
            .with_context(|| format!("Failed to open log file {}", settings.log_file))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn open_ledger(settings: &Settings) -> Result<AppLedger> {
    let path = Path::new(&settings.store_file);
    ensure_parent_dir(path)?;

    let store = SqliteStore::open(path)
        .with_context(|| format!("Failed to open expense store {}", path.display()))?;
    let storage = LocalStorage::with_policy(store, settings.save_policy);

    Ledger::open(storage).context("Failed to load saved expenses")
}

fn run_add(ledger: &mut AppLedger, matches: &ArgMatches) -> Result<()> {
    match add_from_args(ledger, matches) {
        Ok(record) => {
            println!("Added {} ({})", record.description, record.id);
            Ok(())
        }
        Err(LedgerError::Input(reason)) => {
            eprintln!("Expense not added: {}", reason);
            std::process::exit(2);
        }
        Err(err) => Err(anyhow::Error::from(err).context("Failed to save expenses")),
    }
}

/// Every rejected value, the category included, comes back as `LedgerError::Input`.
fn add_from_args<P: Persistence>(
    ledger: &mut Ledger<P>,
    matches: &ArgMatches,
) -> std::result::Result<ExpenseRecord, LedgerError> {
    let category: Category = match matches.value_of("category") {
        Some(label) => label.parse()?,
        None => Category::default(),
    };
    let input = ExpenseInput::new(
        matches.value_of("description").unwrap_or_default(),
        matches.value_of("amount").unwrap_or_default(),
        category,
    );

    ledger.add_expense(&input).cloned()
}

fn print_ledger(ledger: &AppLedger, currency: &str) {
    println!("Total Expenses  {}", format_amount(ledger.total(), currency));
    for (category, amount) in ledger.totals_by_category().iter() {
        println!("  {:<15} {}", category, format_amount(amount, currency));
    }
    println!();

    if ledger.is_empty() {
        println!("No expenses yet. Add one above!");
        return;
    }

    for record in ledger.records() {
        println!(
            "{:<36}  {:<24}  {:<13}  {}  {:>10}",
            record.id,
            record.description,
            record.category,
            record.date,
            format_amount(record.amount, currency)
        );
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(ledger: AppLedger, settings: &Settings) -> Result<()> {
    let mut app = ui::App::new(ledger, settings.currency_symbol.clone());
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_ledger: AppLedger, _settings: &Settings) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the add / list / delete subcommands.");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use expense_ledger::InputError;

    #[test]
    fn test_cli_parses_add() {
        let matches = cli()
            .try_get_matches_from(["expense-ledger", "add", "-d", "Coffee", "-a", "4.50", "-k", "food"])
            .unwrap();
        let (name, add) = matches.subcommand().unwrap();

        assert_eq!(name, "add");
        assert_eq!(add.value_of("description"), Some("Coffee"));
        assert_eq!(add.value_of("amount"), Some("4.50"));
        assert_eq!(add.value_of("category"), Some("food"));
    }

    #[test]
    fn test_cli_defaults_to_ui() {
        let matches = cli().try_get_matches_from(["expense-ledger", "-v"]).unwrap();
        assert!(matches.subcommand().is_none());
        assert!(matches.is_present("verbose"));
    }

    fn add_args(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["expense-ledger", "add"];
        argv.extend_from_slice(args);
        let matches = cli().try_get_matches_from(argv).unwrap();
        matches.subcommand_matches("add").unwrap().clone()
    }

    #[test]
    fn test_add_rejects_unknown_category_as_input() {
        let storage = LocalStorage::new(SqliteStore::open_in_memory().unwrap());
        let mut ledger = Ledger::open(storage).unwrap();

        let result = add_from_args(&mut ledger, &add_args(&["-d", "Coffee", "-a", "4.50", "-k", "Snacks"]));

        assert!(
            matches!(result, Err(LedgerError::Input(InputError::UnknownCategory(ref c))) if c == "Snacks"),
            "Unknown category should be an input rejection, got {:?}",
            result
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_from_args_records_expense() {
        let storage = LocalStorage::new(SqliteStore::open_in_memory().unwrap());
        let mut ledger = Ledger::open(storage).unwrap();

        let record = add_from_args(&mut ledger, &add_args(&["-d", "Bus", "-a", "2", "-k", "transport"])).unwrap();

        assert_eq!(record.category, Category::Transport);
        assert_eq!(ledger.records()[0], record);

        let result = add_from_args(&mut ledger, &add_args(&["-d", "Bus", "-a", "two"]));
        assert!(matches!(result, Err(LedgerError::Input(InputError::InvalidAmount(_)))));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_cli_add_requires_amount() {
        assert!(cli()
            .try_get_matches_from(["expense-ledger", "add", "-d", "Coffee"])
            .is_err());
    }
}
