use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use engine::{Engine, users};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "claimsheets_admin")]
#[command(about = "Admin utilities for the claim sheet tracker")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./claimsheets.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the accounts allowed to use the API.
    User(User),
    /// Inspect and repair claim sheets.
    ClaimSheet(ClaimSheet),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user; the password is prompted for.
    Create {
        #[arg(long)]
        username: String,
    },
}

#[derive(Args, Debug)]
struct ClaimSheet {
    #[command(subcommand)]
    command: ClaimSheetCommand,
}

#[derive(Subcommand, Debug)]
enum ClaimSheetCommand {
    /// List the claim sheets of a user.
    List {
        #[arg(long)]
        owner: String,
    },
    /// Renumber the expenses of a claim sheet 1..N keeping their order,
    /// closing the gaps left by deletions.
    Compact {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        id: Uuid,
    },
}

/// Restores cooked mode even when the prompt bails out early.
struct RawMode;

impl RawMode {
    fn enable() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn message(out: &mut impl Write, text: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(text)
    )?;
    out.flush()?;
    Ok(())
}

/// Read a line without echoing it, printing `*` per character.
fn read_secret(prompt: &str) -> CliResult<String> {
    let _raw = RawMode::enable()?;
    let mut out = std::io::stderr();
    message(&mut out, prompt)?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        let control = modifiers.contains(KeyModifiers::CONTROL);

        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if control => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !control => {
                secret.push(ch);
                execute!(out, Print("*"))?;
            }
            KeyCode::Backspace if secret.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    out.flush()?;
    Ok(secret)
}

fn ask_new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = read_secret("Password: ")?;
        if first.is_empty() {
            message(&mut out, "Password must not be empty.\r\n")?;
            continue;
        }
        if read_secret("Confirm password: ")? == first {
            return Ok(first);
        }
        message(&mut out, "Passwords do not match. Try again.\r\n")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn create_user(db: &DatabaseConnection, username: String) -> CliResult<()> {
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err("username must not be empty".into());
    }
    if users::Entity::find_by_id(username.clone())
        .one(db)
        .await?
        .is_some()
    {
        return Err(format!("user already exists: {username}").into());
    }

    let password = ask_new_password()?;
    users::Entity::insert(users::ActiveModel {
        username: Set(username.clone()),
        password: Set(password),
    })
    .exec(db)
    .await?;

    println!("created user: {username}");
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create { username },
        }) => create_user(&db, username).await?,
        Command::ClaimSheet(ClaimSheet { command }) => {
            let engine = Engine::builder().database(db).build().await?;
            match command {
                ClaimSheetCommand::List { owner } => {
                    for sheet in engine.list_claim_sheets(&owner).await? {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            sheet.id, sheet.claim_number, sheet.status, sheet.total, sheet.name
                        );
                    }
                }
                ClaimSheetCommand::Compact { owner, id } => {
                    let sheet = engine.claim_sheet(id, &owner).await?;
                    let current = engine.list_expenses(id, &owner).await?;
                    if current.is_empty() {
                        println!("claim sheet {} has no expenses", sheet.claim_number);
                        return Ok(());
                    }
                    let order: Vec<Uuid> = current.iter().map(|expense| expense.id).collect();
                    let renumbered = engine
                        .reorder_expenses(id, &order, Some(sheet.revision), &owner)
                        .await?;
                    println!(
                        "renumbered {} expense(s) of {}",
                        renumbered.len(),
                        sheet.claim_number
                    );
                }
            }
        }
    }

    Ok(())
}
