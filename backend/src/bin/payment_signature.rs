//! Operator tool for gateway callbacks: sign or verify confirmation tuples
//! and open test orders against the configured gateway.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use clap::{Parser, Subcommand};
use course_backend::domain::ports::{OrderRequest, PaymentGateway};
use course_backend::domain::{PaymentConfirmation, format_minor_units, generate_receipt};
use course_backend::outbound::razorpay::RazorpayHttpGateway;
use course_backend::settings::MarketplaceSettings;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `payment-signature` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "payment-signature",
    about = "Sign, verify and open payment gateway orders using MARKETPLACE_* settings",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Print the signature the gateway should send for an order/payment pair.
    Sign {
        #[arg(long = "order-id", value_name = "id")]
        order_id: String,
        #[arg(long = "payment-id", value_name = "id")]
        payment_id: String,
    },
    /// Check a signature received from the gateway.
    Verify {
        #[arg(long = "order-id", value_name = "id")]
        order_id: String,
        #[arg(long = "payment-id", value_name = "id")]
        payment_id: String,
        #[arg(long, value_name = "hex")]
        signature: String,
    },
    /// Open an order for `amount` minor units.
    CreateOrder {
        #[arg(long, value_name = "minor-units")]
        amount: u64,
    },
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        eprintln!("tracing init failed: {error}");
    }

    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = MarketplaceSettings::load_from_iter([OsString::from("payment-signature")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    match args.command {
        Command::Sign {
            order_id,
            payment_id,
        } => {
            let verifier = settings.signature_verifier().map_err(io::Error::other)?;
            println!("{}", verifier.expected_signature(&order_id, &payment_id));
            Ok(())
        }
        Command::Verify {
            order_id,
            payment_id,
            signature,
        } => {
            let verifier = settings.signature_verifier().map_err(io::Error::other)?;
            let confirmation = PaymentConfirmation {
                order_id,
                payment_id,
                signature,
            };
            confirmation.validate().map_err(io::Error::other)?;
            if verifier.verify(&confirmation) {
                info!(order_id = %confirmation.order_id, "signature verified");
                println!("valid");
                Ok(())
            } else {
                warn!(order_id = %confirmation.order_id, "signature mismatch");
                Err(io::Error::other("signature does not match"))
            }
        }
        Command::CreateOrder { amount } => {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
            runtime.block_on(create_order(&settings, amount))
        }
    }
}

async fn create_order(settings: &MarketplaceSettings, amount: u64) -> io::Result<()> {
    let gateway = RazorpayHttpGateway::new(
        settings.gateway_base_url(),
        settings.payment_key_id().map_err(io::Error::other)?,
        settings.payment_key_secret().map_err(io::Error::other)?,
        settings.gateway_timeout(),
    )
    .map_err(io::Error::other)?;

    let request = OrderRequest {
        amount_minor_units: amount,
        currency: settings.currency().map_err(io::Error::other)?,
        receipt: generate_receipt(),
    };
    let order = gateway
        .create_order(&request)
        .await
        .map_err(|error| io::Error::other(format!("create order: {error}")))?;

    println!("order_id={}", order.id);
    println!("amount={} {}", format_minor_units(order.amount_minor_units), order.currency);
    println!("receipt={}", order.receipt);
    println!("status={}", order.status);
    Ok(())
}
