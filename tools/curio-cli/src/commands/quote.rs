//! Price an order for every shipping tier without placing it.

use std::sync::Arc;

use anyhow::Result;
use curio_commerce::checkout::StubGateway;
use curio_commerce::Money;
use rust_decimal::Decimal;
use serde::Serialize;

use super::QuoteArgs;
use crate::context::Context;
use crate::order::OrderFile;
use crate::output::format_rate;

#[derive(Serialize)]
struct QuoteRow {
    tier: String,
    description: String,
    delivery: String,
    shipping: i64,
    tax: i64,
    tax_rate: String,
    total: i64,
    currency: &'static str,
}

/// Run the quote command.
pub async fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store_config()?;
    let order = OrderFile::load(&ctx.resolve_path(&args.order))?;

    // Quoting never reaches the gateway.
    let mut checkout = order.start_checkout(&store, Arc::new(StubGateway::new()))?;
    let options = checkout.calculate_shipping()?.to_vec();

    let mut rows = Vec::with_capacity(options.len());
    for option in &options {
        checkout.select_shipping(&option.tier)?;
        let session = checkout.session();
        let (tax, rate) = match &session.tax {
            Some(t) => (t.amount.minor_units, t.rate),
            None => (0, Decimal::ZERO),
        };
        let total = session
            .total_payable()
            .map(|m| m.minor_units)
            .unwrap_or_default();
        rows.push(QuoteRow {
            tier: option.tier.to_string(),
            description: option.description.clone(),
            delivery: option.estimated_days.to_string(),
            shipping: option.cost.minor_units,
            tax,
            tax_rate: format_rate(rate),
            total,
            currency: store.currency.code(),
        });
    }

    if ctx.output.is_json() {
        ctx.output.json(&rows);
        return Ok(());
    }

    let cart = checkout.cart().snapshot();
    let destination = checkout.session().effective_shipping_address().one_line();
    ctx.output.header("Quote");
    ctx.output.kv("Items", &cart.total_items().to_string());
    ctx.output.kv("Subtotal", &cart.total_price().display());
    ctx.output.kv("Ship to", &destination);
    println!();

    let widths = [12, 22, 18, 10, 16, 10];
    ctx.output.table_row(
        &["TIER", "SERVICE", "DELIVERY", "SHIPPING", "TAX", "TOTAL"],
        &widths,
    );
    for (row, option) in rows.iter().zip(&options) {
        let tax = Money::new(row.tax, store.currency);
        let total = Money::new(row.total, store.currency);
        let shipping = if option.is_free() {
            "Free".to_string()
        } else {
            option.cost.display()
        };
        ctx.output.table_row(
            &[
                &row.tier,
                &row.description,
                &row.delivery,
                &shipping,
                &format!("{} ({})", tax.display(), row.tax_rate),
                &total.display(),
            ],
            &widths,
        );
    }

    Ok(())
}
