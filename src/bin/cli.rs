use clap::{Parser, Subcommand};
use darkroom::{
    config::AppConfig,
    db,
    repositories::Repositories,
    seed,
    services::{
        user_service::{SignupRequest, UserService},
        MockEmailService, VerificationService,
    },
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "darkroom-cli")]
#[command(about = "CLI tool for managing Darkroom data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Load a demo user and project from a directory of concept folders
    Seed {
        /// Directory holding one subdirectory per concept
        #[arg(long, default_value = "public/images")]
        images_dir: PathBuf,

        /// Delete all existing users, projects and images first
        #[arg(long)]
        reset: bool,
    },

    /// Verification code maintenance
    Codes {
        #[command(subcommand)]
        command: CodeCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user with a password
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List,

    /// Delete a user with its projects and images
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CodeCommands {
    /// Delete expired verification codes
    Cleanup,
}

fn get_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let Some(database_url) = config.database_url.as_deref() else {
        eprintln!("❌ DATABASE_URL must be set");
        std::process::exit(1);
    };
    let repositories = db::open_repositories(Some(database_url)).await?;

    let user_service = UserService::new(
        repositories.users.clone(),
        repositories.projects.clone(),
        repositories.images.clone(),
    );

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                name,
                password,
            } => {
                let password = match password {
                    Some(pw) => pw,
                    None => {
                        let password = get_password("Password")?;
                        if password != get_password("Confirm password")? {
                            eprintln!("❌ Passwords do not match");
                            std::process::exit(1);
                        }
                        password
                    }
                };

                let request = SignupRequest {
                    email: Some(email),
                    password: Some(password),
                    name,
                };

                match user_service.signup(request).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Email: {}", user.email);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to create user: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::List => match user_service.list_users().await {
                Ok(users) => {
                    if users.is_empty() {
                        println!("No users found.");
                    } else {
                        println!("{:<38} {:<40} {:<20}", "ID", "Email", "Created");
                        println!("{}", "-".repeat(98));
                        for user in users {
                            println!(
                                "{:<38} {:<40} {:<20}",
                                user.id,
                                user.email,
                                user.created_at.format("%Y-%m-%d %H:%M:%S")
                            );
                        }
                    }
                }
                Err(err) => {
                    eprintln!("❌ Failed to list users: {}", err);
                    std::process::exit(1);
                }
            },

            UserCommands::Delete { email } => {
                match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => match user_service.delete_user(&user.id).await {
                        Ok(()) => {
                            println!("✅ User '{}' deleted successfully!", email);
                        }
                        Err(err) => {
                            eprintln!("❌ Failed to delete user: {}", err);
                            std::process::exit(1);
                        }
                    },
                    Ok(None) => {
                        eprintln!("❌ User '{}' not found", email);
                        std::process::exit(1);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to find user: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        },

        Commands::Seed { images_dir, reset } => {
            match seed::seed_demo(&repositories, &images_dir, reset).await {
                Ok(summary) => {
                    println!("✅ Seeded demo data");
                    println!("  User: {}", summary.user_id);
                    println!("  Project: {}", summary.project_id);
                    println!("  Images: {}", summary.images);
                }
                Err(err) => {
                    eprintln!("❌ Seeding failed: {:#}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Codes { command } => match command {
            CodeCommands::Cleanup => {
                let Repositories { users, codes, .. } = repositories;
                let verification =
                    VerificationService::new(codes, users, Box::new(MockEmailService::new()));

                match verification.cleanup_expired().await {
                    Ok(removed) => println!("✅ Removed {} expired codes", removed),
                    Err(err) => {
                        eprintln!("❌ Failed to clean up codes: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        },
    }

    Ok(())
}
