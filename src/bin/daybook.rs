use anyhow::{Result, anyhow};
use chrono::Local;
use daybook::auth::{AuthState, RegisterForm};
use daybook::calendar::{self, MonthView};
use daybook::cli::{self, Command};
use daybook::config::Config;
use daybook::context::{AppContext, StandardContext};
use daybook::controller::JournalController;
use daybook::notify;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = cli::parse_args(&args)?;

    if invocation.command == Command::Help {
        cli::print_help("daybook");
        return Ok(());
    }

    let ctx = StandardContext::new(invocation.root.clone());
    let config = Config::load_or_default(&ctx)?;
    if !ctx.get_config_file_path()?.exists() {
        // First run: leave an editable copy of the defaults behind.
        if let Err(e) = config.save(&ctx) {
            eprintln!("Could not write default config: {}", e);
        }
    }
    if let Err(e) = daybook::logging::init(&ctx, &config.log_level) {
        eprintln!("Logging disabled: {}", e);
    }

    let controller = JournalController::open(&ctx, &config, notify::from_kind(config.notifications))?;
    run(&controller, invocation.command).await
}

async fn run(app: &JournalController, command: Command) -> Result<()> {
    let today = Local::now().date_naive();

    match command {
        Command::Login { email, password } => {
            app.login(&email, &password).await?;
            app.cache.refresh().await;
            println!("Logged in. {} entries available.", app.entries().len());
        }
        Command::Register {
            username,
            email,
            phone,
            password,
            confirm,
        } => {
            let form = RegisterForm {
                username,
                email,
                phone,
                password,
                confirm_password: confirm,
            };
            app.register(&form).await?;
            println!("Account created.");
        }
        Command::Logout => {
            app.logout().await;
            println!("Logged out.");
        }
        Command::Status => match app.gate.validate().await {
            AuthState::Authenticated => println!("Logged in ({}).", app.gate.api().base_url()),
            _ => println!("Not logged in."),
        },
        Command::Profile => {
            let profile = app.gate.profile().await?;
            println!("Name:  {}", profile.name);
            println!("Email: {}", profile.email);
            println!("Phone: {}", profile.phone);
        }
        Command::List { date, limit } => {
            require_session(app).await?;
            let entries = app.entries();
            let entries = match date {
                Some(d) => calendar::entries_on(&entries, d, &Local),
                None => entries,
            };
            let shown = calendar::recent(&entries, limit.unwrap_or(usize::MAX));
            print!("{}", cli::render_entries(&shown, &Local));
        }
        Command::Calendar { month } => {
            require_session(app).await?;
            let view = month
                .or_else(|| MonthView::containing(today))
                .ok_or_else(|| anyhow!("Today's month cannot be displayed"))?;
            print!("{}", cli::render_month(&view, &app.entries(), &Local));
        }
        Command::Week => {
            require_session(app).await?;
            print!("{}", cli::render_week(today, &app.entries(), &Local));
        }
        Command::Create { title, content } => {
            require_session(app).await?;
            match app.create_entry(&title, &content).await? {
                Some(entry) => println!("Saved entry {}.", entry.id),
                None => println!("Saved."),
            }
        }
        Command::Delete { id } => {
            require_session(app).await?;
            app.delete_entry(&id).await?;
            println!("Deleted entry {}.", id);
        }
        Command::Refresh => {
            require_session(app).await?;
            app.cache.refresh().await;
            println!("{} entries.", app.entries().len());
        }
        Command::DeleteAccount => {
            require_session(app).await?;
            app.delete_account().await?;
            println!("Account deleted.");
        }
        Command::Help => cli::print_help("daybook"),
    }
    Ok(())
}

/// Startup gate: validates the token and loads entries (cache first).
async fn require_session(app: &JournalController) -> Result<()> {
    match app.start().await {
        AuthState::Authenticated => Ok(()),
        _ if !app.entries().is_empty() => {
            eprintln!("Offline or logged out: showing cached entries.");
            Ok(())
        }
        _ => Err(anyhow!("Not logged in. Run 'daybook login <email> <password>'.")),
    }
}
