use anyhow::Context;
use clap::{Parser, Subcommand};
use seat_core::domain::{Catalog, ErrorState, TextField};
use seat_core::storage::{FileTokenStore, TokenStore};
use seat_registrar::app::catalog_use_case::CatalogUseCase;
use seat_registrar::config::{CatalogSource, Config};
use seat_registrar::infra::http_client::ReqwestRegistrationApi;
use seat_registrar::logging;
use seat_registrar::pipeline::{OtpRequestOutcome, OtpVerifyOutcome, RegistrationPipeline, SubmitOutcome};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "seat_registrar")]
#[command(about = "Register for an event seat: pick a slot, verify your email, submit")]
#[command(version = "0.1.0")]
struct Cli {
    /// Catalog loading mode (bundled or granular); overrides config
    #[arg(long, global = true)]
    catalog_source: Option<CatalogSource>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full city / location / slot tree
    Catalog,
    /// Show the options available for a partial selection
    Options {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Send an OTP to an email address and verify the code read from stdin
    Verify {
        #[arg(long)]
        email: String,
    },
    /// Submit a registration using the stored auth token
    Register {
        #[arg(long)]
        full_name: String,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        contact_number: String,
        #[arg(long)]
        institution: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        slot: String,
    },
    /// Forget the stored auth token
    Logout,
}

fn print_errors(errors: &ErrorState) {
    for (field, message) in errors.iter() {
        println!("   - {}: {}", field, message);
    }
}

fn print_catalog(catalog: &Catalog) {
    for city in catalog.cities() {
        println!("🏙️  {} [{}]", city.name, city.id);
        for location in &city.locations {
            println!("   📍 {} [{}]", location.name, location.id);
            for slot in &location.slots {
                println!("      🕒 {} [{}]", slot.name, slot.id);
            }
        }
    }
}

async fn load_catalog(api: Arc<ReqwestRegistrationApi>, source: CatalogSource) -> anyhow::Result<Catalog> {
    let catalog = CatalogUseCase::new(api)
        .load(source)
        .await
        .context("failed to load the appointment catalog")?;
    if catalog.is_empty() {
        println!("⚠️  The backend returned no cities");
    }
    Ok(catalog)
}

async fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    Ok(lines.next_line().await?.unwrap_or_default())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(source) = cli.catalog_source {
        config.catalog.source = source;
    }
    debug!(base_url = %config.api.base_url, "configuration loaded");

    let api = Arc::new(ReqwestRegistrationApi::new(&config.api, &config.endpoints)?);
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.storage.token_path));

    match cli.command {
        Commands::Catalog => {
            println!("🔄 Loading catalog...");
            let catalog = load_catalog(api, config.catalog.source).await?;
            print_catalog(&catalog);
        }
        Commands::Options { city, location } => {
            let catalog = load_catalog(api.clone(), config.catalog.source).await?;
            let pipeline = RegistrationPipeline::new(catalog, api, tokens);
            if let Some(city) = city.as_deref() {
                pipeline.select_city(city);
            }
            if let Some(location) = location.as_deref() {
                pipeline.select_location(location);
            }

            let snapshot = pipeline.snapshot();
            let (label, options) = if snapshot.selection.location.is_some() {
                ("Slots", snapshot.slots)
            } else if snapshot.selection.city.is_some() {
                ("Locations", snapshot.locations)
            } else {
                ("Cities", snapshot.cities)
            };
            println!("📋 {}:", label);
            if options.is_empty() {
                println!("   (none)");
            }
            for option in options {
                println!("   {} [{}]", option.name, option.id);
            }
        }
        Commands::Verify { email } => {
            let pipeline = RegistrationPipeline::new(Catalog::default(), api, tokens);
            pipeline.set_field(TextField::Email, email);

            println!("📧 Requesting OTP...");
            if pipeline.request_otp().await != OtpRequestOutcome::Sent {
                println!("❌ Could not send OTP:");
                print_errors(&pipeline.errors());
                return Ok(());
            }

            let code = read_line("🔑 Enter the OTP sent to your email: ").await?;
            pipeline.set_otp_code(code);
            match pipeline.verify_otp().await {
                OtpVerifyOutcome::Verified => println!("✅ Email verified, you can now register"),
                _ => {
                    println!("❌ Verification failed:");
                    print_errors(&pipeline.errors());
                }
            }
        }
        Commands::Register {
            full_name,
            dob,
            email,
            contact_number,
            institution,
            city,
            location,
            slot,
        } => {
            let catalog = load_catalog(api.clone(), config.catalog.source).await?;
            let pipeline = RegistrationPipeline::new(catalog, api, tokens);
            pipeline.set_field(TextField::FullName, full_name);
            pipeline.set_field(TextField::Dob, dob);
            pipeline.set_field(TextField::Email, email);
            pipeline.set_field(TextField::ContactNumber, contact_number);
            pipeline.set_field(TextField::Institution, institution);
            pipeline.select_city(&city);
            pipeline.select_location(&location);
            pipeline.select_slot(&slot);

            println!("🚀 Submitting registration...");
            match pipeline.submit().await {
                SubmitOutcome::Registered(receipt) => {
                    println!("✅ Registration successful!");
                    if let Some(id) = receipt.registration_id {
                        println!("   Registration id: {}", id);
                    }
                }
                SubmitOutcome::Busy => println!("⏳ A submission is already in progress"),
                outcome => {
                    error!(?outcome, "registration not completed");
                    println!("❌ Registration not completed:");
                    print_errors(&pipeline.errors());
                }
            }
        }
        Commands::Logout => {
            tokens.clear()?;
            println!("👋 Stored auth token removed");
        }
    }

    Ok(())
}
