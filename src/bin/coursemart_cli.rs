use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use coursemart_checkout::{
    auth::{AccessToken, AuthSession},
    client::{ApiConnector, HttpCouponApi},
    config::{self, ClientConfig},
    events::{self, EventSender},
    models::{format_amount, CheckoutType, Coupon, Course},
    notifications::TracingNotifier,
    services::{CouponInput, PricingBreakdown},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

const TOKEN_ENV: &str = "COURSEMART_TOKEN";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config().context("failed to load client config")?;
    config::init_tracing(config.log_level(), config.log_json);

    match cli.command {
        Commands::Quote(args) => handle_quote(&config, args, cli.json)?,
        Commands::Coupons(args) => handle_coupons(&config, args, cli.json).await?,
        Commands::Apply(args) => handle_apply(&config, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "coursemart", about = "CourseMart checkout tools", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a bundle from a JSON file of courses
    Quote(QuoteArgs),
    /// List coupons offered for a checkout type
    Coupons(CouponsArgs),
    /// Validate and apply a coupon code
    Apply(ApplyArgs),
}

#[derive(Args)]
struct QuoteArgs {
    /// Path to a JSON array of courses
    #[arg(long)]
    courses: PathBuf,
}

#[derive(Args)]
struct CouponsArgs {
    #[arg(long = "type", default_value = "course")]
    checkout_type: CheckoutType,
}

#[derive(Args)]
struct ApplyArgs {
    #[arg(long)]
    code: String,
    /// Amount the coupon is applied against
    #[arg(long)]
    total: Decimal,
    #[arg(long = "type", default_value = "course")]
    checkout_type: CheckoutType,
    /// Access token; falls back to COURSEMART_TOKEN
    #[arg(long)]
    token: Option<String>,
}

fn handle_quote(config: &ClientConfig, args: QuoteArgs, json: bool) -> Result<()> {
    let raw = fs::read_to_string(&args.courses)
        .with_context(|| format!("failed to read {}", args.courses.display()))?;
    let courses: Vec<Course> =
        serde_json::from_str(&raw).context("courses file is not a JSON course list")?;
    let breakdown = PricingBreakdown::for_bundle(&courses);

    if json {
        return print_json(&breakdown);
    }

    let symbol = &config.currency_symbol;
    for course in &courses {
        let price = if course.is_free() {
            "Free".to_string()
        } else {
            format_amount(symbol, course.payable_price())
        };
        println!("- {} • {}", course.course_name, price);
    }
    println!("Original price: {}", format_amount(symbol, breakdown.original_price));
    println!(
        "Bundle discount: {}% (you save {})",
        breakdown.discount_percent(),
        format_amount(symbol, breakdown.savings)
    );
    println!("Bundle price: {}", format_amount(symbol, breakdown.bundle_price));
    Ok(())
}

async fn handle_coupons(config: &ClientConfig, args: CouponsArgs, json: bool) -> Result<()> {
    let input = coupon_input(config, args.checkout_type)?;
    let coupons = input
        .load_available_coupons()
        .await
        .map_err(|e| anyhow!("failed to load coupons: {}", e))?;

    if json {
        return print_json(&coupons);
    }
    if coupons.is_empty() {
        println!("No coupons available for {} checkout", args.checkout_type);
    }
    for coupon in &coupons {
        render_coupon(coupon, &config.currency_symbol);
    }
    Ok(())
}

async fn handle_apply(config: &ClientConfig, args: ApplyArgs, json: bool) -> Result<()> {
    let raw_token = match args.token {
        Some(token) => token,
        None => std::env::var(TOKEN_ENV)
            .with_context(|| format!("pass --token or set {}", TOKEN_ENV))?,
    };
    let token = AccessToken::new(raw_token).ok_or_else(|| anyhow!("access token is empty"))?;
    let session = AuthSession::authenticated(token, None);

    let (sender, receiver) = EventSender::channel(16);
    let event_task = tokio::spawn(events::process_events(receiver));

    let input = coupon_input(config, args.checkout_type)?.with_events(sender);
    input
        .set_code(&args.code)
        .map_err(|e| anyhow!("invalid coupon code: {}", e))?;
    let result = input.apply(&session, args.total).await;
    drop(input);
    if let Err(e) = event_task.await {
        debug!(error = %e, "event task ended abnormally");
    }

    let applied = result.map_err(|e| anyhow!("{}", e.user_message()))?;
    if json {
        return print_json(&applied);
    }
    let symbol = &config.currency_symbol;
    println!(
        "Coupon {} applied: -{} (pay {})",
        applied.code,
        format_amount(symbol, applied.discount_amount),
        format_amount(symbol, applied.final_amount)
    );
    Ok(())
}

fn coupon_input(config: &ClientConfig, checkout_type: CheckoutType) -> Result<CouponInput> {
    let connector = ApiConnector::new(config).context("failed to build api connector")?;
    let api = Arc::new(HttpCouponApi::new(connector));
    Ok(
        CouponInput::new(api, checkout_type, Arc::new(TracingNotifier))
            .with_currency_symbol(config.currency_symbol.clone()),
    )
}

fn render_coupon(coupon: &Coupon, symbol: &str) {
    println!(
        "- {} [{}] • {}",
        coupon.code,
        coupon.status(Utc::now()),
        coupon.summary(symbol)
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
