use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::{parse_amount, parse_date, LedgerService, MovementResult};
use crate::directory::HttpOwnerDirectory;
use crate::domain::format_cents;

/// Saldo - Account Movement Ledger
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "A small account ledger tracking movements, balances, and statements")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "saldo.db")]
    pub database: String,

    /// Base URL of the owner directory service
    #[arg(long, default_value = "http://localhost:8080")]
    pub directory_url: String,

    /// Owner directory request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub directory_timeout: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Apply a movement to an account
    Apply {
        /// Account number to post against
        account_number: String,

        /// Signed amount: positive credits, negative debits (e.g. "-200.00")
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Movement label (e.g. "deposit", "withdrawal")
        #[arg(short, long)]
        kind: String,

        /// Date of the movement (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Movement management commands
    #[command(subcommand)]
    Movement(MovementCommands),

    /// Build a statement over accounts and a date range
    Report {
        /// Account ID to include (repeat for several accounts, kept in order)
        #[arg(long = "account", required = true)]
        accounts: Vec<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account number (must be globally unique)
        number: String,

        /// Account type (e.g. "savings", "checking")
        #[arg(short = 't', long = "type")]
        account_type: String,

        /// Opening balance, signed (e.g. "1000.00")
        #[arg(short, long, allow_hyphen_values = true)]
        opening_balance: String,

        /// Owner ID in the external directory
        #[arg(long)]
        owner: i64,

        /// Create the account as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// List all accounts
    List,

    /// Show detailed account information
    Show {
        /// Account ID
        id: String,
    },

    /// Update an account's type and active flag
    Update {
        /// Account ID
        id: String,

        /// New account type
        #[arg(short = 't', long = "type")]
        account_type: String,

        /// New active flag
        #[arg(long, action = ArgAction::Set)]
        active: bool,
    },

    /// Delete an account and its movements
    Delete {
        /// Account ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum MovementCommands {
    /// Show detailed movement information
    Show {
        /// Movement ID
        id: String,
    },

    /// Revise a movement's date, kind, and value
    Revise {
        /// Movement ID
        id: String,

        /// New signed amount
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// New movement label
        #[arg(short, long)]
        kind: String,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Remove a movement, rolling its value out of the account balance
    Remove {
        /// Movement ID
        id: String,
    },

    /// List an owner's movements within a date range
    List {
        /// Owner ID
        #[arg(long)]
        owner: i64,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
}

impl Cli {
    fn init_tracing(&self) {
        let default = if self.verbose { "saldo=debug" } else { "saldo=warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    fn directory(&self) -> Result<HttpOwnerDirectory> {
        HttpOwnerDirectory::new(
            &self.directory_url,
            Duration::from_secs(self.directory_timeout),
        )
    }

    async fn service(&self) -> Result<LedgerService<HttpOwnerDirectory>> {
        Ok(LedgerService::connect(&self.database, self.directory()?).await?)
    }

    pub async fn run(self) -> Result<()> {
        self.init_tracing();

        match &self.command {
            Commands::Init => {
                LedgerService::init(&self.database, self.directory()?).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = self.service().await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Apply {
                account_number,
                value,
                kind,
                date,
            } => {
                let service = self.service().await?;
                let value_cents = parse_amount(value)?;
                let date = match date {
                    Some(date_str) => parse_date(date_str)?,
                    None => Utc::now().date_naive(),
                };

                let result = service
                    .apply_movement(account_number, date, kind.clone(), value_cents)
                    .await?;
                println!(
                    "Applied {} to {} ({})",
                    format_cents(result.movement.value_cents),
                    result.account.account_number,
                    result.movement.id
                );
                println!("New balance: {}", format_cents(result.account.current_balance_cents));
            }

            Commands::Movement(movement_cmd) => {
                let service = self.service().await?;
                run_movement_command(&service, movement_cmd).await?;
            }

            Commands::Report {
                accounts,
                from,
                to,
                json,
            } => {
                let service = self.service().await?;
                let account_ids = accounts
                    .iter()
                    .map(|id| {
                        Uuid::parse_str(id)
                            .with_context(|| format!("Invalid account ID format: {}", id))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let from = parse_date(from)?;
                let to = parse_date(to)?;

                let report = service.build_statement(&account_ids, from, to).await?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report);
                }
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService<HttpOwnerDirectory>,
    cmd: &AccountCommands,
) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            number,
            account_type,
            opening_balance,
            owner,
            inactive,
        } => {
            let opening_cents = parse_amount(opening_balance)?;
            let account = service
                .create_account(
                    number.clone(),
                    account_type.clone(),
                    opening_cents,
                    !inactive,
                    *owner,
                )
                .await?;
            println!(
                "Created account: {} ({}) opening at {}",
                account.account_number,
                account.account_type,
                format_cents(account.opening_balance_cents)
            );
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<12} {:<12} {:>12} {:>12} {:<8}",
                    "NUMBER", "TYPE", "OPENING", "BALANCE", "ACTIVE"
                );
                println!("{}", "-".repeat(60));
                for account in accounts {
                    println!(
                        "{:<12} {:<12} {:>12} {:>12} {:<8}",
                        account.account_number,
                        account.account_type,
                        format_cents(account.opening_balance_cents),
                        format_cents(account.current_balance_cents),
                        if account.active { "yes" } else { "no" }
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account_id =
                Uuid::parse_str(id).context("Invalid account ID format (expected UUID)")?;
            let account = service.get_account(account_id).await?;

            println!("Account: {}", account.account_number);
            println!("  ID:              {}", account.id);
            println!("  Type:            {}", account.account_type);
            println!(
                "  Opening balance: {}",
                format_cents(account.opening_balance_cents)
            );
            println!(
                "  Current balance: {}",
                format_cents(account.current_balance_cents)
            );
            println!("  Active:          {}", if account.active { "yes" } else { "no" });
            println!("  Owner ID:        {}", account.owner_id);
            println!(
                "  Created:         {}",
                account.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }

        AccountCommands::Update {
            id,
            account_type,
            active,
        } => {
            let account_id =
                Uuid::parse_str(id).context("Invalid account ID format (expected UUID)")?;
            let account = service
                .update_account(account_id, account_type.clone(), *active)
                .await?;
            println!(
                "Updated account: {} ({}, {})",
                account.account_number,
                account.account_type,
                if account.active { "active" } else { "inactive" }
            );
        }

        AccountCommands::Delete { id } => {
            let account_id =
                Uuid::parse_str(id).context("Invalid account ID format (expected UUID)")?;
            service.delete_account(account_id).await?;
            println!("Deleted account: {}", id);
        }
    }
    Ok(())
}

async fn run_movement_command(
    service: &LedgerService<HttpOwnerDirectory>,
    cmd: &MovementCommands,
) -> Result<()> {
    match cmd {
        MovementCommands::Show { id } => {
            let movement_id =
                Uuid::parse_str(id).context("Invalid movement ID format (expected UUID)")?;
            let result = service.get_movement(movement_id).await?;
            print_movement(&result);
        }

        MovementCommands::Revise {
            id,
            value,
            kind,
            date,
        } => {
            let movement_id =
                Uuid::parse_str(id).context("Invalid movement ID format (expected UUID)")?;
            let value_cents = parse_amount(value)?;
            let date = parse_date(date)?;

            let result = service
                .revise_movement(movement_id, date, kind.clone(), value_cents)
                .await?;
            println!(
                "Revised movement {} to {}",
                result.movement.id,
                format_cents(result.movement.value_cents)
            );
            println!("New balance: {}", format_cents(result.account.current_balance_cents));
        }

        MovementCommands::Remove { id } => {
            let movement_id =
                Uuid::parse_str(id).context("Invalid movement ID format (expected UUID)")?;
            service.remove_movement(movement_id).await?;
            println!("Removed movement: {}", id);
        }

        MovementCommands::List { owner, from, to } => {
            let from = parse_date(from)?;
            let to = parse_date(to)?;
            let movements = service.list_movements_for_owner(*owner, from, to).await?;

            if movements.is_empty() {
                println!("No movements found.");
            } else {
                println!("Owner: {}", movements[0].owner_name);
                println!(
                    "{:<12} {:<14} {:>12} {:>12}",
                    "DATE", "KIND", "VALUE", "BALANCE"
                );
                println!("{}", "-".repeat(54));
                for entry in &movements {
                    println!(
                        "{:<12} {:<14} {:>12} {:>12}",
                        entry.movement.date,
                        entry.movement.kind,
                        format_cents(entry.movement.value_cents),
                        format_cents(entry.movement.balance_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_movement(result: &MovementResult) {
    println!("Movement: {}", result.movement.id);
    println!("  Date:    {}", result.movement.date);
    println!("  Kind:    {}", result.movement.kind);
    println!("  Value:   {}", format_cents(result.movement.value_cents));
    println!("  Balance: {}", format_cents(result.movement.balance_cents));
    println!();
    println!("  Account:         {}", result.account.account_number);
    println!(
        "  Current balance: {}",
        format_cents(result.account.current_balance_cents)
    );
}

fn print_report(report: &crate::application::StatementReport) {
    println!("Owner: {}", report.owner);
    for section in &report.accounts {
        println!();
        println!(
            "Account {} ({}, {}) opening at {}",
            section.account_number,
            section.account_type,
            if section.active { "active" } else { "inactive" },
            format_cents(section.opening_balance_cents)
        );
        if section.movements.is_empty() {
            println!("  No movements in range.");
            continue;
        }
        println!(
            "  {:<12} {:<14} {:>12} {:>12}",
            "DATE", "KIND", "VALUE", "BALANCE"
        );
        println!("  {}", "-".repeat(54));
        for line in &section.movements {
            println!(
                "  {:<12} {:<14} {:>12} {:>12}",
                line.date,
                line.kind,
                format_cents(line.value_cents),
                format_cents(line.balance_cents)
            );
        }
    }
}
