//! Address book, card wallet and order history commands.

use clap::{Args, Subcommand};
use storekeep_core::{AddressId, CardId, CardNumber};
use storekeep_storefront::ClientError;
use storekeep_storefront::api::{AddressInput, CardInput};
use storekeep_storefront::services::AccountService;

use super::{CliError, Context};

#[derive(Subcommand)]
pub enum AddressCommand {
    /// Show saved addresses
    List,
    /// Save a new address
    Add(AddressArgs),
    /// Delete a saved address
    Delete { id: AddressId },
}

#[derive(Args)]
pub struct AddressArgs {
    /// Label such as "Home"
    #[arg(long)]
    title: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    surname: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    district: String,
    #[arg(long)]
    neighborhood: String,
}

impl From<AddressArgs> for AddressInput {
    fn from(args: AddressArgs) -> Self {
        Self {
            title: args.title,
            name: args.name,
            surname: args.surname,
            phone: args.phone,
            city: args.city,
            district: args.district,
            neighborhood: args.neighborhood,
        }
    }
}

#[derive(Subcommand)]
pub enum CardCommand {
    /// Show saved cards
    List,
    /// Save a new card
    Add(CardArgs),
    /// Delete a saved card
    Delete { id: CardId },
}

#[derive(Args)]
pub struct CardArgs {
    /// 16-digit card number; spaces and hyphens are ignored
    #[arg(long, env = "STOREKEEP_CARD_NUMBER", hide_env_values = true)]
    number: String,
    /// Expiry month (1-12)
    #[arg(long)]
    month: u32,
    /// Expiry year (four digits)
    #[arg(long)]
    year: i32,
    /// Name as printed on the card
    #[arg(long)]
    name: String,
}

pub async fn run_address(ctx: &Context, command: AddressCommand) -> Result<(), CliError> {
    let service = AccountService::new(&ctx.state, &ctx.api);
    let addresses = match command {
        AddressCommand::List => service.load_addresses().await?,
        AddressCommand::Add(args) => service.add_address(&args.into()).await?,
        AddressCommand::Delete { id } => service.delete_address(id).await?,
    };

    if addresses.is_empty() {
        println!("No saved addresses");
    }
    for address in &addresses {
        let a = &address.fields;
        println!(
            "{:>5}  {:<12}  {} {}, {} {}/{}  {}",
            address.id, a.title, a.name, a.surname, a.neighborhood, a.district, a.city, a.phone
        );
    }
    Ok(())
}

pub async fn run_card(ctx: &Context, command: CardCommand) -> Result<(), CliError> {
    let service = AccountService::new(&ctx.state, &ctx.api);
    let cards = match command {
        CardCommand::List => service.load_cards().await?,
        CardCommand::Add(args) => {
            let card = CardInput {
                card_no: CardNumber::parse(&args.number).map_err(ClientError::from)?,
                expire_month: args.month,
                expire_year: args.year,
                name_on_card: args.name,
            };
            service.add_card(&card).await?
        }
        CardCommand::Delete { id } => service.delete_card(id).await?,
    };

    if cards.is_empty() {
        println!("No saved cards");
    }
    for card in &cards {
        println!(
            "{:>5}  **** {}  {:02}/{}  {}",
            card.id,
            card.last_four(),
            card.expire_month,
            card.expire_year,
            card.name_on_card
        );
    }
    Ok(())
}

pub async fn orders(ctx: &Context) -> Result<(), CliError> {
    let orders = AccountService::new(&ctx.state, &ctx.api)
        .load_orders()
        .await?;

    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in &orders {
        let items: u32 = order.products.iter().map(|p| p.count).sum();
        println!(
            "#{:<6}  {:<20}  {:>10}  {} item(s)",
            order.id, order.order_date, order.price, items
        );
    }
    Ok(())
}
