//! Checkout commands: totals, submit.

use clap::Subcommand;
use storekeep_core::{AddressId, CardId};
use storekeep_storefront::services::{AccountService, CheckoutService};

use super::{CliError, Context};

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Show totals for the selected cart lines
    Totals,
    /// Place an order for the selected cart lines
    Submit {
        /// Shipping address id
        #[arg(long)]
        address: AddressId,
        /// Saved card id
        #[arg(long)]
        card: CardId,
        /// Card security code
        #[arg(long, env = "STOREKEEP_CVV", hide_env_values = true)]
        cvv: String,
    },
}

pub async fn run(ctx: &Context, command: CheckoutCommand) -> Result<(), CliError> {
    let checkout = CheckoutService::new(&ctx.state, &ctx.api);
    match command {
        CheckoutCommand::Totals => {
            let totals = checkout.totals();
            println!("Subtotal:    {}", totals.subtotal);
            println!("Shipping:    {}", totals.shipping);
            println!("Grand total: {}", totals.grand_total);
        }
        CheckoutCommand::Submit { address, card, cvv } => {
            let account = AccountService::new(&ctx.state, &ctx.api);
            let addresses = account.load_addresses().await?;
            if !addresses.iter().any(|a| a.id == address) {
                return Err(CliError::Usage(format!("No saved address with id {address}")));
            }
            let cards = account.load_cards().await?;
            if !cards.iter().any(|c| c.id == card) {
                return Err(CliError::Usage(format!("No saved card with id {card}")));
            }

            checkout.select_address(Some(address));
            checkout.select_card(Some(card));

            let order = checkout.submit(&cvv).await?;
            match order.order_id {
                Some(id) => println!("Order #{id} placed, total {}", order.total),
                None => println!("Order placed, total {}", order.total),
            }
        }
    }
    Ok(())
}
