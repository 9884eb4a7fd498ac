//! Tajine House CLI - Browse the menu, keep a cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse the menu
//! th-cli menu
//! th-cli menu --category 2
//!
//! # Build a cart (kept in the data directory between runs)
//! th-cli cart add 3 -q 2
//! th-cli cart show
//!
//! # Check out
//! th-cli checkout --first-name Amina --last-name Benali \
//!     --email amina@example.com --phone 0612345678 \
//!     --address "12 Rue des Oliviers" --city Lyon --zip-code 69001
//!
//! # Look up an order
//! th-cli order 42
//!
//! # Hash an admin password for ADMIN_PASSWORD_HASH
//! th-cli admin hash-password
//! ```
//!
//! # Environment Variables
//!
//! - `TAJINE_API_URL` - Base URL of the storefront API
//! - `TAJINE_DATA_DIR` - Where the cart is stored

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tajine_house_core::cart::Cart;
use tajine_house_core::checkout::{CustomerForm, DELIVERY_TIME_ASAP};
use tajine_house_core::{CategoryId, DeliveryOption, MenuItemId, OrderId, PaymentMethod};

mod api;
mod commands;
mod error;
mod storage;

use api::HttpOrderApi;
use commands::cart::CartEdit;
use commands::checkout::CheckoutOutcome;
use error::CliError;
use storage::JsonFileCartStorage;

#[derive(Parser)]
#[command(name = "th-cli")]
#[command(author, version, about = "Tajine House ordering client")]
struct Cli {
    /// Storefront API base URL
    #[arg(long, env = "TAJINE_API_URL", default_value = "http://127.0.0.1:3000")]
    api_url: String,

    /// Directory holding the saved cart
    #[arg(long, env = "TAJINE_DATA_DIR", default_value = ".tajine-house")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List dishes
    Menu {
        /// Only dishes in this category
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the current cart
    Checkout(CheckoutArgs),
    /// Show an order and its items
    Order { id: OrderId },
    /// Admin helpers
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add a dish
    Add {
        id: MenuItemId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a dish
    Remove { id: MenuItemId },
    /// Set the quantity of a dish
    Update { id: MenuItemId, quantity: u32 },
    /// Add one of a dish
    Increment { id: MenuItemId },
    /// Take one of a dish off (never below one)
    Decrement { id: MenuItemId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Read a password from stdin and print its argon2 hash
    HashPassword,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeliveryArg {
    Delivery,
    Pickup,
}

impl From<DeliveryArg> for DeliveryOption {
    fn from(arg: DeliveryArg) -> Self {
        match arg {
            DeliveryArg::Delivery => Self::Delivery,
            DeliveryArg::Pickup => Self::Pickup,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PaymentArg {
    CreditCard,
    Cash,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::CreditCard => Self::CreditCard,
            PaymentArg::Cash => Self::Cash,
        }
    }
}

#[derive(clap::Args)]
struct CheckoutArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    zip_code: String,
    #[arg(long, value_enum, default_value = "delivery")]
    delivery_option: DeliveryArg,
    /// `asap` or HH:MM
    #[arg(long, default_value = DELIVERY_TIME_ASAP)]
    delivery_time: String,
    #[arg(long, value_enum, default_value = "credit-card")]
    payment_method: PaymentArg,
    /// Special instructions for the kitchen or driver
    #[arg(long)]
    notes: Option<String>,
    /// Place the order without asking for confirmation
    #[arg(short, long)]
    yes: bool,
}

impl From<CheckoutArgs> for CustomerForm {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            address: args.address,
            city: args.city,
            zip_code: args.zip_code,
            delivery_option: args.delivery_option.into(),
            delivery_time: args.delivery_time,
            payment_method: args.payment_method.into(),
            special_instructions: args.notes,
        }
    }
}

fn confirm_on_stdin() -> io::Result<bool> {
    let mut prompt = io::stderr().lock();
    write!(prompt, "Place this order? [y/N] ")?;
    prompt.flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Menu { category } => {
            let api = HttpOrderApi::new(&cli.api_url)?;
            commands::menu::list(&api, category, &mut out).await?;
        }
        Commands::Cart { action } => {
            let mut cart = Cart::load(JsonFileCartStorage::new(&cli.data_dir));
            let change = match action {
                CartAction::Show => return commands::cart::show(&cart, &mut out),
                CartAction::Add { id, quantity } => {
                    let api = HttpOrderApi::new(&cli.api_url)?;
                    return commands::cart::add(&api, &mut cart, id, quantity, &mut out).await;
                }
                CartAction::Remove { id } => CartEdit::Remove(id),
                CartAction::Update { id, quantity } => CartEdit::Update(id, quantity),
                CartAction::Increment { id } => CartEdit::Increment(id),
                CartAction::Decrement { id } => CartEdit::Decrement(id),
                CartAction::Clear => CartEdit::Clear,
            };
            commands::cart::edit(&mut cart, change, &mut out)?;
        }
        Commands::Checkout(args) => {
            let api = HttpOrderApi::new(&cli.api_url)?;
            let mut cart = Cart::load(JsonFileCartStorage::new(&cli.data_dir));
            let skip_prompt = args.yes;
            let confirm = || if skip_prompt { Ok(true) } else { confirm_on_stdin() };

            let outcome =
                commands::checkout::run(&api, &mut cart, args.into(), confirm, &mut out).await?;
            if outcome == CheckoutOutcome::Failed {
                std::process::exit(1);
            }
        }
        Commands::Order { id } => {
            let api = HttpOrderApi::new(&cli.api_url)?;
            commands::order::show(&api, id, &mut out).await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::HashPassword => {
                commands::admin::hash_password(&mut io::stdin().lock(), &mut out)?;
            }
        },
    }
    Ok(())
}
