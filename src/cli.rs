// File: ./src/cli.rs
//! Command-line parsing, help text and plain-text rendering for the `daybook` binary.
use crate::calendar::{self, MonthView};
use crate::model::{EntryId, JournalEntry};
use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, TimeZone};
use std::path::PathBuf;
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum CommandName {
    Login,
    Register,
    Logout,
    Status,
    Profile,
    List,
    Calendar,
    Week,
    Create,
    Delete,
    Refresh,
    DeleteAccount,
    Help,
}

impl CommandName {
    fn usage(&self) -> &'static str {
        match self {
            CommandName::Login => "login <email> <password>",
            CommandName::Register => "register <username> <email> <phone> <password> <confirm>",
            CommandName::Logout => "logout",
            CommandName::Status => "status",
            CommandName::Profile => "profile",
            CommandName::List => "list [--date YYYY-MM-DD] [--limit N]",
            CommandName::Calendar => "calendar [YYYY-MM]",
            CommandName::Week => "week",
            CommandName::Create => "create <title> <content...>",
            CommandName::Delete => "delete <id>",
            CommandName::Refresh => "refresh",
            CommandName::DeleteAccount => "delete-account",
            CommandName::Help => "help",
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            CommandName::Login => "Log in and store the session token",
            CommandName::Register => "Create an account",
            CommandName::Logout => "End the session and forget cached entries",
            CommandName::Status => "Show whether the stored session is valid",
            CommandName::Profile => "Show name, email and phone",
            CommandName::List => "List entries, newest first",
            CommandName::Calendar => "Month grid; days with entries are marked *",
            CommandName::Week => "This week's entries, Monday first",
            CommandName::Create => "Write a new entry",
            CommandName::Delete => "Delete an entry by id",
            CommandName::Refresh => "Force a fetch from the server",
            CommandName::DeleteAccount => "Permanently delete the account",
            CommandName::Help => "Show this help message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        phone: String,
        password: String,
        confirm: String,
    },
    Logout,
    Status,
    Profile,
    List {
        date: Option<NaiveDate>,
        limit: Option<usize>,
    },
    Calendar {
        month: Option<MonthView>,
    },
    Week,
    Create {
        title: String,
        content: String,
    },
    Delete {
        id: EntryId,
    },
    Refresh,
    DeleteAccount,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub command: Command,
}

fn take(args: &[String], idx: usize, what: &str) -> Result<String> {
    args.get(idx)
        .cloned()
        .ok_or_else(|| anyhow!("missing <{}>", what))
}

/// Parses `args` without the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-r" | "--root" => {
                let path = iter.next().ok_or_else(|| anyhow!("--root needs a path"))?;
                root = Some(PathBuf::from(path));
            }
            "-h" | "--help" => rest.push("help".to_string()),
            _ => rest.push(arg.clone()),
        }
    }

    let Some(name) = rest.first() else {
        return Ok(Invocation {
            root,
            command: Command::Help,
        });
    };
    let name = CommandName::from_str(name).map_err(|_| anyhow!("unknown command '{}'", name))?;
    let args = &rest[1..];

    let command = match name {
        CommandName::Login => Command::Login {
            email: take(args, 0, "email")?,
            password: take(args, 1, "password")?,
        },
        CommandName::Register => Command::Register {
            username: take(args, 0, "username")?,
            email: take(args, 1, "email")?,
            phone: take(args, 2, "phone")?,
            password: take(args, 3, "password")?,
            confirm: take(args, 4, "confirm")?,
        },
        CommandName::Logout => Command::Logout,
        CommandName::Status => Command::Status,
        CommandName::Profile => Command::Profile,
        CommandName::List => {
            let mut date = None;
            let mut limit = None;
            let mut i = 0;
            while i < args.len() {
                match args[i].as_str() {
                    "--date" => {
                        let raw = take(args, i + 1, "date")?;
                        date = Some(
                            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                                .map_err(|e| anyhow!("bad date '{}': {}", raw, e))?,
                        );
                        i += 2;
                    }
                    "--limit" => {
                        let raw = take(args, i + 1, "limit")?;
                        limit = Some(raw.parse().map_err(|_| anyhow!("bad limit '{}'", raw))?);
                        i += 2;
                    }
                    other => bail!("unexpected argument '{}'", other),
                }
            }
            Command::List { date, limit }
        }
        CommandName::Calendar => {
            let month = match args.first() {
                Some(raw) => Some(
                    MonthView::parse(raw).ok_or_else(|| anyhow!("bad month '{}', use YYYY-MM", raw))?,
                ),
                None => None,
            };
            Command::Calendar { month }
        }
        CommandName::Week => Command::Week,
        CommandName::Create => Command::Create {
            title: take(args, 0, "title")?,
            content: args.get(1..).map(|c| c.join(" ")).unwrap_or_default(),
        },
        CommandName::Delete => {
            let Ok(id) = EntryId::from_str(&take(args, 0, "id")?);
            Command::Delete { id }
        }
        CommandName::Refresh => Command::Refresh,
        CommandName::DeleteAccount => Command::DeleteAccount,
        CommandName::Help => Command::Help,
    };

    Ok(Invocation { root, command })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Daybook v{} - your journal from the command line",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] <command> [args]", binary_name);
    println!();
    println!("COMMANDS:");
    for cmd in CommandName::iter() {
        println!("    {:<58} {}", cmd.usage(), cmd.summary());
    }
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("Entries are cached locally; when the server is unreachable the last");
    println!("successfully fetched copy is shown.");
}

fn preview(content: &str, max: usize) -> String {
    let line = content.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

pub fn render_entries<Tz: TimeZone>(entries: &[JournalEntry], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if entries.is_empty() {
        return "No entries.\n".to_string();
    }
    let mut out = String::new();
    for e in entries {
        let when = e
            .created_at_utc()
            .map(|dt| dt.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "????-??-?? ??:??".to_string());
        let title = if e.title.is_empty() { "(untitled)" } else { &e.title };
        out.push_str(&format!("[{}] {}  {}\n", e.id, when, title));
        let body = preview(&e.content, 72);
        if !body.is_empty() {
            out.push_str(&format!("      {}\n", body));
        }
    }
    out
}

pub fn render_month<Tz: TimeZone>(view: &MonthView, entries: &[JournalEntry], tz: &Tz) -> String {
    let marked = view.days_with_entries(entries, tz);
    let mut out = format!("{:04}-{:02}\n", view.year(), view.month());
    out.push_str(" Su  Mo  Tu  We  Th  Fr  Sa\n");
    for row in view.cells().chunks(7) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Some(day) if marked.contains(day) => format!("{:>3}*", day),
                Some(day) => format!("{:>3} ", day),
                None => "    ".to_string(),
            })
            .collect();
        out.push_str(line.join("").trim_end());
        out.push('\n');
    }
    out
}

pub fn render_week<Tz: TimeZone>(today: NaiveDate, entries: &[JournalEntry], tz: &Tz) -> String {
    let mut out = String::new();
    for day in calendar::week_of(today) {
        let marker = if day == today { ">" } else { " " };
        let count = calendar::entries_on(entries, day, tz).len();
        out.push_str(&format!("{} {}  {} entries\n", marker, day.format("%a %d %b"), count));
    }
    out
}
