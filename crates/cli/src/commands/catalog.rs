//! Catalog commands: products, categories.

use clap::Args;
use storekeep_core::{CategoryId, ProductSort};
use storekeep_storefront::api::{DEFAULT_PAGE_LIMIT, ProductQuery};
use storekeep_storefront::services::CatalogService;

use super::{CliError, Context};

#[derive(Args)]
pub struct ProductsArgs {
    /// Only products in this category
    #[arg(short, long)]
    category: Option<CategoryId>,

    /// Free-text filter
    #[arg(short, long)]
    filter: Option<String>,

    /// Ordering: price:asc, price:desc, rating:asc, rating:desc
    #[arg(short, long)]
    sort: Option<ProductSort>,

    /// Page size
    #[arg(short, long, default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: u32,

    /// Page offset
    #[arg(short, long, default_value_t = 0)]
    offset: u32,
}

pub async fn products(ctx: &Context, args: ProductsArgs) -> Result<(), CliError> {
    let query = ProductQuery {
        category: args.category,
        filter: args.filter,
        sort: args.sort,
        limit: args.limit,
        offset: args.offset,
    };

    let page = CatalogService::new(&ctx.state, &ctx.api)
        .fetch_products(query)
        .await?;

    for product in &page.products {
        println!(
            "{:>6}  {:<40}  {:>10}  stock {:<4} rating {:.1}",
            product.id, product.name, product.price, product.stock, product.rating
        );
    }
    println!("{} of {} products", page.products.len(), page.total);
    Ok(())
}

pub async fn categories(ctx: &Context, top: usize) -> Result<(), CliError> {
    let categories = CatalogService::new(&ctx.state, &ctx.api)
        .top_categories(top)
        .await?;

    for category in &categories {
        println!(
            "{:>4}  {:<24}  {:<6}  rating {:.1}",
            category.id, category.title, category.gender, category.rating
        );
    }
    Ok(())
}
