use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront_reviews::{
    CatalogStore, Config, HttpApiClient, ProductQuery, ProductSummary, ReviewChange, ReviewForm,
    ReviewSnapshot, ReviewSyncStore,
};

#[derive(Parser)]
#[command(name = "storefront-reviews")]
#[command(about = "Browse storefront products and manage your reviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, default_value = ".storefront/config.yml")]
    config: PathBuf,

    /// Override the API base URL
    #[arg(long, env = "STOREFRONT_API_URL")]
    api_url: Option<String>,

    /// Session token for authenticated calls
    #[arg(long, env = "STOREFRONT_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a product's rating and reviews
    Show {
        /// Product ID
        product: String,

        /// Your user ID, to highlight your own review
        #[arg(long, env = "STOREFRONT_USER_ID")]
        user: Option<String>,
    },

    /// Create or update your review of a product
    Review {
        /// Product ID
        product: String,

        /// Your user ID
        #[arg(long, env = "STOREFRONT_USER_ID")]
        user: String,

        /// Rating from 1 to 5 (defaults to your current rating)
        #[arg(long)]
        rating: Option<u8>,

        /// Review text (defaults to your current comment)
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete your review of a product
    Delete {
        /// Product ID
        product: String,

        /// Your user ID
        #[arg(long, env = "STOREFRONT_USER_ID")]
        user: String,
    },

    /// List products
    Products {
        #[arg(long, default_value = "")]
        category: String,

        /// Price range, e.g. 0-500
        #[arg(long, default_value = "0-10000")]
        price: String,

        #[arg(long, default_value = "")]
        search: String,

        /// Minimum rating
        #[arg(long, default_value = "")]
        ratings: String,

        #[arg(long, default_value = "")]
        availability: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Search products with a natural-language prompt
    AiSearch {
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("storefront_reviews=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if cli.session_token.is_some() {
        config.api.session_token = cli.session_token;
    }

    let client =
        Arc::new(HttpApiClient::new(&config.api).context("Failed to create API client")?);

    match cli.command {
        Commands::Show { product, user } => {
            let store = load_reviews(&config, client, &product).await?;
            print_reviews(&store.snapshot(), user.as_deref());
        }
        Commands::Review {
            product,
            user,
            rating,
            comment,
        } => {
            let store = load_reviews(&config, client, &product).await?;
            let mut form = ReviewForm::with_default_rating(
                &store.snapshot(),
                &user,
                config.reviews.default_rating,
            );
            if let Some(rating) = rating {
                if !(1..=5).contains(&rating) {
                    anyhow::bail!("--rating must be between 1 and 5, got {}", rating);
                }
                form.set_rating(rating);
            }
            if let Some(comment) = comment {
                form.comment = comment;
            }

            let outcome = form.submit(&store, &product).await?;
            let fallback = match outcome.change {
                ReviewChange::Created => "Review posted.",
                ReviewChange::Updated => "Review updated.",
            };
            println!("{}", outcome.message.as_deref().unwrap_or(fallback));
            if let Some(actual) = &outcome.reassigned_reviewer {
                println!("Note: the server recorded this review for user {}", actual);
            }
            print_reviews(&store.snapshot(), Some(&user));
        }
        Commands::Delete { product, user } => {
            let store = load_reviews(&config, client, &product).await?;
            let own = store
                .current_user_review(&user)
                .with_context(|| format!("You have not reviewed product {}", product))?;

            let outcome = store.remove_review(&product, &own.review_id).await?;
            println!("{}", outcome.message.as_deref().unwrap_or("Review deleted."));
            print_reviews(&store.snapshot(), Some(&user));
        }
        Commands::Products {
            category,
            price,
            search,
            ratings,
            availability,
            page,
        } => {
            let catalog = CatalogStore::new(client).with_config(&config.catalog);
            let query = ProductQuery {
                availability,
                price,
                category,
                ratings,
                search,
                page,
            };
            let listing = catalog.fetch_products(&query).await?;
            println!("{} products (page {})\n", listing.total_products, page);
            print_products(&listing.products);
            if !listing.top_rated_products.is_empty() {
                println!("\nTop rated:");
                print_products(&listing.top_rated_products);
            }
        }
        Commands::AiSearch { prompt } => {
            let catalog = CatalogStore::new(client).with_config(&config.catalog);
            let products = catalog.ai_search(&prompt).await?;
            if products.is_empty() {
                println!("No products matched.");
            } else {
                print_products(&products);
            }
        }
    }

    Ok(())
}

async fn load_reviews(
    config: &Config,
    client: Arc<HttpApiClient>,
    product_id: &str,
) -> Result<ReviewSyncStore<Arc<HttpApiClient>>> {
    let catalog = CatalogStore::new(client.clone()).with_config(&config.catalog);
    let product = catalog.fetch_product_details(product_id).await?;

    info!(product_id, reviews = product.reviews.len(), "Loaded product");

    Ok(ReviewSyncStore::from_product(client, &product).with_config(&config.reviews))
}

fn print_reviews(snapshot: &ReviewSnapshot, viewer: Option<&str>) {
    match snapshot.aggregate_rating {
        Some(rating) => println!("Product {} rated {:.1}/5", snapshot.product_id, rating),
        None => println!("Product {} has no rating yet", snapshot.product_id),
    }
    println!();

    if snapshot.reviews.is_empty() {
        println!("No reviews yet. Be the first one to review this product.");
        return;
    }

    for review in &snapshot.reviews {
        let filled = review.rating.min(5) as usize;
        let stars = "★".repeat(filled) + &"☆".repeat(5 - filled);
        let own = viewer.is_some_and(|v| v == review.reviewer_id);
        println!(
            "  {} {}{}",
            stars,
            review.reviewer_name().unwrap_or(review.reviewer_id.as_str()),
            if own { " (you)" } else { "" }
        );
        if !review.comment.is_empty() {
            println!("    {}", review.comment);
        }
    }
}

fn print_products(products: &[ProductSummary]) {
    for product in products {
        let rating = product
            .ratings
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {}  ${:.2}  rating {}  stock {}",
            product.id, product.name, product.price, rating, product.stock
        );
    }
}
