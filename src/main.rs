//! accountkit CLI - drive the account-service session from a terminal.
//!
//! Commands map one-to-one onto the session manager and Account API
//! operations: login, logout, whoami, profile display/update, register,
//! and password reset.

use std::io::{self, Write};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use accountkit::models::ProfileTextUpdate;
use accountkit::{ApiClient, Config, CredentialStore, SessionManager};

const USAGE: &str = "\
Usage: accountkit <command>

Commands:
  login [username]            Log in and persist the session
  logout                      Clear the session and invalidate the refresh token
  whoami                      Show the authenticated identity
  profile                     Show the full profile
  profile set <field> <value> Update a profile text field
                              (first-name, last-name, about, phone, country)
  profile avatar <path>       Upload a new avatar image
  register <first> <last> <email>
                              Register a new account
  reset-request <email>       Request a password reset email
  reset-confirm <token>       Confirm a password reset
";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn build_manager(config: &Config) -> Result<SessionManager> {
    let client = ApiClient::new(config.api_url())?;
    let store = CredentialStore::new(Config::state_dir()?);
    Ok(SessionManager::new(client, store))
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut config = Config::load()?;
    let manager = build_manager(&config)?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("");

    match command {
        "login" => {
            let username = match args.get(2) {
                Some(u) => u.clone(),
                None => {
                    let default = config.last_username.clone().unwrap_or_default();
                    let label = if default.is_empty() {
                        "Username: ".to_string()
                    } else {
                        format!("Username [{}]: ", default)
                    };
                    let entered = prompt_line(&label)?;
                    if entered.is_empty() { default } else { entered }
                }
            };
            if username.is_empty() {
                eprintln!("Username required");
                std::process::exit(1);
            }
            let password = rpassword::prompt_password("Password: ")?;

            if manager.login(&username, &password).await? {
                config.last_username = Some(username);
                config.save()?;
                if let Some(identity) = manager.identity().await {
                    println!("Logged in as {}", identity.display_name());
                }
            } else {
                let message = manager
                    .take_last_error()
                    .await
                    .unwrap_or_else(|| "Login failed".to_string());
                eprintln!("{}", message);
                std::process::exit(1);
            }
        }

        "logout" => {
            manager.initialize().await?;
            manager.logout().await;
            println!("Logged out");
        }

        "whoami" => {
            manager.initialize().await?;
            match manager.identity().await {
                Some(identity) => {
                    println!("{} <{}>", identity.display_name(), identity.email);
                }
                None => {
                    println!("Not logged in");
                    std::process::exit(1);
                }
            }
        }

        "profile" => match args.get(2).map(String::as_str) {
            None => {
                manager.initialize().await?;
                require_auth(&manager).await;
                match manager.profile().await {
                    Some(profile) => print_profile(&profile),
                    None => println!("No profile available"),
                }
            }
            Some("set") => {
                let (field, value) = match (args.get(3), args.get(4)) {
                    (Some(f), Some(v)) => (f.as_str(), v.clone()),
                    _ => {
                        eprintln!("{}", USAGE);
                        std::process::exit(1);
                    }
                };
                let mut update = ProfileTextUpdate::default();
                match field {
                    "first-name" => update.first_name = Some(value),
                    "last-name" => update.last_name = Some(value),
                    "about" => update.about = Some(value),
                    "phone" => update.phone_number = Some(value),
                    "country" => update.countries = Some(value),
                    other => {
                        eprintln!("Unknown profile field: {}", other);
                        std::process::exit(1);
                    }
                }
                manager.initialize().await?;
                require_auth(&manager).await;
                let profile = manager.update_profile_text(&update).await?;
                print_profile(&profile);
            }
            Some("avatar") => {
                let path = match args.get(3) {
                    Some(p) => p.clone(),
                    None => {
                        eprintln!("{}", USAGE);
                        std::process::exit(1);
                    }
                };
                let bytes = std::fs::read(&path)?;
                let filename = std::path::Path::new(&path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("avatar")
                    .to_string();
                manager.initialize().await?;
                require_auth(&manager).await;
                let profile = manager.update_profile_avatar(&filename, bytes).await?;
                println!("Avatar updated");
                print_profile(&profile);
            }
            Some(other) => {
                eprintln!("Unknown profile subcommand: {}", other);
                std::process::exit(1);
            }
        },

        "register" => {
            let (first, last, email) = match (args.get(2), args.get(3), args.get(4)) {
                (Some(f), Some(l), Some(e)) => (f.clone(), l.clone(), e.clone()),
                _ => {
                    eprintln!("{}", USAGE);
                    std::process::exit(1);
                }
            };
            let password = rpassword::prompt_password("Password: ")?;

            if manager.register(&first, &last, &email, &password).await? {
                println!("Registered. You can now log in with `accountkit login {}`", email);
            } else {
                let message = manager
                    .take_last_error()
                    .await
                    .unwrap_or_else(|| "Registration failed".to_string());
                eprintln!("{}", message);
                std::process::exit(1);
            }
        }

        "reset-request" => {
            let email = match args.get(2) {
                Some(e) => e.clone(),
                None => {
                    eprintln!("{}", USAGE);
                    std::process::exit(1);
                }
            };
            let message = manager.request_password_reset(&email).await?;
            println!("{}", message);
        }

        "reset-confirm" => {
            let token = match args.get(2) {
                Some(t) => t.clone(),
                None => {
                    eprintln!("{}", USAGE);
                    std::process::exit(1);
                }
            };
            let password = rpassword::prompt_password("New password: ")?;
            let message = manager.confirm_password_reset(&token, &password).await?;
            println!("{}", message);
        }

        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    info!("Done");
    Ok(())
}

async fn require_auth(manager: &SessionManager) {
    if !manager.is_authenticated().await {
        eprintln!("Not logged in. Run `accountkit login` first.");
        std::process::exit(1);
    }
}

fn print_profile(profile: &accountkit::Profile) {
    let show = |label: &str, value: &Option<String>| {
        println!("{:<12} {}", label, value.as_deref().unwrap_or("-"));
    };
    show("Username:", &profile.username);
    show("First name:", &profile.first_name);
    show("Last name:", &profile.last_name);
    show("Email:", &profile.email);
    show("About:", &profile.about);
    show("Phone:", &profile.phone_number);
    println!(
        "{:<12} {}",
        "Country:",
        profile.country_name().unwrap_or("-")
    );
    show("Avatar:", &profile.avatar);
}
