//! Run an order through checkout and payment.

use anyhow::{Context as _, Result};
use curio_commerce::checkout::{CheckoutError, PaymentStatus};
use curio_commerce::ids::{PaymentToken, ShippingTierId};
use dialoguer::Confirm;
use tracing::info;

use super::CheckoutArgs;
use crate::context::Context;
use crate::order::OrderFile;
use crate::output::state_badge;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store_config()?;
    let order = OrderFile::load(&ctx.resolve_path(&args.order))?;
    let gateway = ctx.gateway(args.stub)?;

    ctx.output.header("Checkout");

    // Step 1: Addresses and shipping
    ctx.output.step(1, 4, "Calculating shipping");
    let mut checkout = order.start_checkout(&store, gateway)?;
    checkout.calculate_shipping()?;
    if let Some(tier) = &args.tier {
        checkout
            .select_shipping(&ShippingTierId::new(tier.as_str()))
            .with_context(|| format!("Cannot ship with tier '{}'", tier))?;
    }

    let session = checkout.session();
    let option = session
        .selected_option()
        .context("No shipping option selected")?;
    let total = session
        .total_payable()
        .context("Order total is not available")?;

    ctx.output.kv("Email", &session.email);
    ctx.output
        .kv("Ship to", &session.effective_shipping_address().one_line());
    ctx.output.kv("Subtotal", &session.subtotal.display());
    ctx.output.kv(
        "Shipping",
        &format!("{} ({}, {})", option.cost.display(), option.description, option.estimated_days),
    );
    ctx.output.kv("Tax", &session.tax_amount().display());
    ctx.output.kv("Total", &total.display());

    // Step 2: Confirmation
    if !args.yes && !ctx.output.is_json() {
        println!();
        let confirmed = Confirm::new()
            .with_prompt(format!("Charge {}?", total.display()))
            .default(true)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Checkout cancelled");
            return Ok(());
        }
    }

    // Step 3: Remote order
    ctx.output.step(2, 4, "Creating order");
    let spinner = ctx.output.spinner("Contacting payment gateway...");
    let created = checkout.continue_to_payment().await;
    spinner.finish_and_clear();
    let order_id = created?;
    ctx.output.kv("Order", order_id.as_str());

    // Step 4: Payment
    ctx.output.step(3, 4, "Submitting payment");
    let spinner = ctx.output.spinner("Capturing payment...");
    let paid = checkout
        .submit_payment(PaymentToken::new(args.token.as_str()))
        .await;
    spinner.finish_and_clear();

    match paid {
        Ok(receipt) => {
            ctx.output.step(4, 4, "Done");
            info!(order_id = %order_id, receipt_id = %receipt.id, "Checkout completed");

            if ctx.output.is_json() {
                ctx.output.json(checkout.session());
                return Ok(());
            }
            ctx.output.kv("Receipt", receipt.id.as_str());
            ctx.output
                .kv("Paid at", &receipt.created_at.to_rfc3339());
            ctx.output.kv("State", &state_badge(checkout.state()));
            ctx.output
                .success(&format!("Payment of {} captured", total.display()));
            Ok(())
        }
        Err(err @ CheckoutError::Payment(_)) => {
            if ctx.output.is_json() {
                ctx.output.json(checkout.session());
            } else {
                ctx.output.kv("State", &state_badge(checkout.state()));
                if let PaymentStatus::Failed { message } = &checkout.session().payment_status {
                    ctx.output.kv("Reason", message);
                }
                ctx.output.info(&format!(
                    "Order {} is kept; retry with another payment token",
                    order_id
                ));
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
