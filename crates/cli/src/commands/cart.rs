//! Cart and wishlist commands.

use clap::Subcommand;
use storekeep_core::ProductId;
use storekeep_storefront::checkout::totals;
use storekeep_storefront::services::CatalogService;
use storekeep_storefront::store::{CartAction, ProductSnapshot, WishlistAction};

use super::{CliError, Context};

#[derive(Subcommand)]
pub enum CartCommand {
    /// Add a product (fetched from the catalog)
    Add {
        id: ProductId,
        /// Quantity to end up with
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove { id: ProductId },
    /// Set a line's quantity; 0 removes it
    Set { id: ProductId, quantity: i64 },
    /// Empty the cart
    Clear,
    /// Show lines, selection and totals
    List,
    /// Include lines in checkout
    Select {
        ids: Vec<ProductId>,
        /// Select every line
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
    /// Exclude lines from checkout
    Unselect {
        ids: Vec<ProductId>,
        /// Unselect every line
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum WishlistCommand {
    /// Save a product (fetched from the catalog)
    Add { id: ProductId },
    /// Remove a saved product
    Remove { id: ProductId },
    /// Remove everything
    Clear,
    /// Show saved products
    List,
}

async fn fetch_snapshot(ctx: &Context, id: ProductId) -> Result<ProductSnapshot, CliError> {
    let product = CatalogService::new(&ctx.state, &ctx.api)
        .fetch_product(id)
        .await?;
    Ok(ProductSnapshot::from(&product))
}

pub async fn run_cart(ctx: &Context, command: CartCommand) -> Result<(), CliError> {
    match command {
        CartCommand::Add { id, quantity } => {
            let snapshot = fetch_snapshot(ctx, id).await?;
            let name = snapshot.name.clone();
            ctx.state.with_store(|store| {
                store.dispatch(CartAction::Add(snapshot));
                if quantity > 1 {
                    store.dispatch(CartAction::SetQuantity {
                        id,
                        quantity: i64::from(quantity),
                    });
                }
            });
            println!("Added {name}");
        }
        CartCommand::Remove { id } => {
            ctx.state.dispatch(CartAction::Remove(id));
        }
        CartCommand::Set { id, quantity } => {
            ctx.state.dispatch(CartAction::SetQuantity { id, quantity });
        }
        CartCommand::Clear => {
            ctx.state.dispatch(CartAction::Clear);
            println!("Cart cleared");
        }
        CartCommand::List => print_cart(ctx),
        CartCommand::Select { ids, all } => set_selection(ctx, &ids, all, true),
        CartCommand::Unselect { ids, all } => set_selection(ctx, &ids, all, false),
    }
    Ok(())
}

fn set_selection(ctx: &Context, ids: &[ProductId], all: bool, selected: bool) {
    ctx.state.with_store(|store| {
        if all {
            store.dispatch(if selected {
                CartAction::SelectAll
            } else {
                CartAction::DeselectAll
            });
            return;
        }
        for &id in ids {
            if store.state().cart.is_selected(id) != selected {
                store.dispatch(CartAction::ToggleSelected(id));
            }
        }
    });
    print_cart(ctx);
}

fn print_cart(ctx: &Context) {
    let state = ctx.state.snapshot();
    let cart = &state.cart;
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for line in cart.lines() {
        let mark = if cart.is_selected(line.id) { "x" } else { " " };
        println!(
            "[{mark}] {:>6}  {:<40}  {:>3} x {:>10} = {:>10}",
            line.id,
            line.name,
            line.quantity,
            line.unit_price,
            line.line_total().round_cents()
        );
    }

    let totals = totals(cart);
    println!("Subtotal:    {}", totals.subtotal);
    println!("Shipping:    {}", totals.shipping);
    println!("Grand total: {}", totals.grand_total);
}

pub async fn run_wishlist(ctx: &Context, command: WishlistCommand) -> Result<(), CliError> {
    match command {
        WishlistCommand::Add { id } => {
            let snapshot = fetch_snapshot(ctx, id).await?;
            println!("Saved {}", snapshot.name);
            ctx.state.dispatch(WishlistAction::Add(snapshot));
        }
        WishlistCommand::Remove { id } => {
            ctx.state.dispatch(WishlistAction::Remove(id));
        }
        WishlistCommand::Clear => {
            ctx.state.dispatch(WishlistAction::Clear);
        }
        WishlistCommand::List => {
            let state = ctx.state.snapshot();
            if state.wishlist.is_empty() {
                println!("Wishlist is empty");
            }
            for entry in state.wishlist.items() {
                println!("{:>6}  {:<40}  {:>10}", entry.id, entry.name, entry.unit_price);
            }
        }
    }
    Ok(())
}
