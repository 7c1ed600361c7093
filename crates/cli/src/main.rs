use anyhow::Context;
use bookshop_app::modules::auth::models::RegisterRequest;
use bookshop_app::App;
use bookshop_authz::Role;
use bookshop_kernel::settings::Settings;
use clap::{Parser, Subcommand};
use validator::Validate;

#[derive(Debug, Parser)]
#[command(name = "bookshop-cli", version, about = "Bookshop server and maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create a user with the USER and ADMIN roles
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BOOKSHOP_ADMIN_PASSWORD")]
        password: String,
        #[arg(long, default_value = "Shop")]
        first_name: String,
        #[arg(long, default_value = "Admin")]
        last_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshop settings")?;

    match cli.command {
        Command::Serve => bookshop_app::app::run(settings).await,
        Command::Migrate => {
            bookshop_telemetry::init(&settings.telemetry);
            bookshop_app::app::migrate(&settings).await
        }
        Command::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => {
            bookshop_telemetry::init(&settings.telemetry);
            create_admin(&settings, email, password, first_name, last_name).await
        }
    }
}

async fn create_admin(
    settings: &Settings,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
) -> anyhow::Result<()> {
    let request = RegisterRequest {
        email,
        confirm_password: password.clone(),
        password,
        first_name,
        last_name,
        shipping_address: None,
    };
    request
        .validate()
        .map_err(|errors| anyhow::anyhow!("invalid admin account: {errors}"))?;

    let app = App::bootstrap(settings).await?;
    let user = app
        .state
        .users()
        .create_account(request, &[Role::User, Role::Admin])
        .await
        .map_err(|err| anyhow::anyhow!("failed to create admin: {err}"))?;
    app.state.db.close().await;

    tracing::info!(user_id = user.id, email = %user.email, "admin account created");
    println!("created admin {} (id {})", user.email, user.id);
    Ok(())
}
