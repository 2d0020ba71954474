use cashbook::{AppConfig, CodePolicy, Field, LedgerStore, LedgerTable, NewExpense, Summary,
    config::DEFAULT_CONFIG_FILE,
    record::DATE_FORMAT,
    table::by_code};

use std::{fs, io::{self, Write}, path::PathBuf, process::ExitCode};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Ledger file to operate on, instead of the one in the config file
    #[clap(short, long, value_parser)]
    file: Option<PathBuf>,

    /// Config file to read settings from
    #[clap(short, long, value_parser, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Code rule: any, alphanumeric or numeric
    #[clap(short, long, value_parser)]
    policy: Option<CodePolicy>,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// List all expenses with their row index
    List,
    /// Record a new expense
    Add(Add),
    /// Change the code of a row
    SetCode {
        #[clap(value_parser)]
        index: usize,
        #[clap(value_parser)]
        code: String
    },
    /// Change one field of a row
    Edit {
        #[clap(value_parser)]
        index: usize,
        #[clap(value_parser)]
        field: Field,
        #[clap(value_parser)]
        value: String
    },
    /// Delete a row; later rows move up by one
    Delete {
        #[clap(value_parser)]
        index: usize
    },
    /// List expenses with the given code
    Search {
        #[clap(value_parser)]
        code: String
    },
    /// Show totals, average and spending per month
    Summary {
        /// Print as JSON
        #[clap(long)]
        json: bool
    },
    /// Write the ledger as CSV
    Export {
        /// File to write to, stdout if not given
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|err| format!("expected DD-MM-YYYY: {}", err))
}

#[derive(Args, Debug)]
struct Add {
    /// Day of the expense as DD-MM-YYYY, today if not given
    #[clap(short='t', long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[clap(short='k', long, value_parser)]
    code: String,

    #[clap(short='d', long, value_parser, default_value_t = String::new())]
    description: String,

    #[clap(short='q', long, value_parser, default_value_t = 1)]
    quantity: u32,

    /// Price of a single item
    #[clap(short='p', long, value_parser)]
    price: u64
}

impl Add {
    fn into_expense(self) -> NewExpense {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        NewExpense::new(date, &self.code, &self.description, self.quantity, self.price)
    }
}

/// Formats an amount the way the dashboard shows it, e.g. `Rp 1,250,000`.
fn rupiah(amount: u128) -> String {
    let digits = amount.to_string();
    let mut grouped = String::new();
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("Rp {}", grouped)
}

fn print_table(table: &LedgerTable) {
    if table.is_empty() {
        println!("{}", "No expenses recorded yet.".yellow());
        return;
    }
    println!("{}", format!("{:>5}  {:<10}  {:<6}  {:<30}  {:>6}  {:>12}  {:>14}",
        "#", "date", "code", "description", "qty", "unit price", "total").bold());
    for (index, record) in table.rows().iter().enumerate() {
        println!("{:>5}  {:<10}  {:<6}  {:<30}  {:>6}  {:>12}  {:>14}",
            index, record.date, record.code, record.description,
            record.quantity, record.unit_price, rupiah(u128::from(record.total)));
    }
}

fn print_summary(summary: &Summary) {
    if summary.count == 0 {
        println!("{}", "No expenses to summarise yet.".yellow());
        return;
    }
    println!("{}: {}", "Total spending".bold(), rupiah(summary.total));
    if let Some(average) = summary.average {
        println!("{}: Rp {:.2}", "Average spending".bold(), average);
    }
    println!("{}: {}", "Transactions".bold(), summary.count);
    for (month, total) in &summary.monthly_totals {
        println!("  {}: {}", month, rupiah(*total).green());
    }
}

fn run(args: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::read_or_default(&args.config)?;
    if let Some(path) = args.file {
        config.ledger_path = path;
    }
    if let Some(policy) = args.policy {
        config.code_policy = policy;
    }
    let store: LedgerStore = config.open_store();

    match args.action {
        Subcommands::List => {
            print_table(&store.load()?);
        },
        Subcommands::Add(add) => {
            let table = store.append(add.into_expense())?;
            println!("{}", "Expense saved.".green());
            print_table(&table);
        },
        Subcommands::SetCode { index, code } => {
            print_table(&store.update_field(index, Field::Code, &code)?);
        },
        Subcommands::Edit { index, field, value } => {
            print_table(&store.update_field(index, field, &value)?);
        },
        Subcommands::Delete { index } => {
            let table = store.delete(index)?;
            println!("{}", format!("Row {} deleted, later rows moved up.", index).green());
            print_table(&table);
        },
        Subcommands::Search { code } => {
            let found = LedgerTable::from_rows(store.search(by_code(code))?);
            print_table(&found);
        },
        Subcommands::Summary { json } => {
            let summary = store.summary()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        },
        Subcommands::Export { output } => {
            let bytes = store.export()?;
            match output {
                Some(path) => fs::write(&path, &bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => io::stdout().write_all(&bytes)?
            }
        }
    }
    return Ok(());
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Cli::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {:#}", "error".bright_red().bold(), err);
            ExitCode::FAILURE
        }
    }
}


#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use chrono::NaiveDate;

    use super::{rupiah, Cli, Subcommands};
    use cashbook::{CodePolicy, Field};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_add() {
        let cli = Cli::try_parse_from([
            "cashbook-cli", "--policy", "alphanumeric", "add",
            "--date", "17-08-2024", "--code", "ab123", "--price", "2500", "-q", "3"
        ]).unwrap();

        assert_eq!(cli.policy, Some(CodePolicy::Alphanumeric));
        match cli.action {
            Subcommands::Add(add) => {
                let expense = add.into_expense();
                assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 8, 17).unwrap());
                assert_eq!(expense.quantity, 3);
                assert_eq!(expense.unit_price, 2500);
            },
            other => panic!("unexpected {:?}", other)
        }
    }

    #[test]
    fn parse_edit_field() {
        let cli = Cli::try_parse_from(["cashbook-cli", "edit", "2", "code", "00009"]).unwrap();
        assert!(matches!(cli.action, Subcommands::Edit { index: 2, field: Field::Code, .. }));
    }

    #[test]
    fn reject_iso_date() {
        let res = Cli::try_parse_from(["cashbook-cli", "add", "--date", "2024-08-17", "--code", "1", "--price", "1"]);
        assert!(res.is_err());
    }

    #[test]
    fn rupiah_grouping() {
        assert_eq!(rupiah(0), "Rp 0");
        assert_eq!(rupiah(999), "Rp 999");
        assert_eq!(rupiah(3500), "Rp 3,500");
        assert_eq!(rupiah(1250000), "Rp 1,250,000");
        assert_eq!(rupiah(u128::from(u64::MAX) * 2), "Rp 36,893,488,147,419,103,230");
    }
}
