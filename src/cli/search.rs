//! Search command implementation

use clap::Args;

use super::AppContext;
use crate::core::Category;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Category name or prefix (only the first 25 characters are sent)
    pub query: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the search command
pub async fn run(ctx: &AppContext, args: SearchArgs) -> anyhow::Result<()> {
    let settings = ctx.load_settings();
    let client = ctx.client(&settings)?;

    let categories = match client.search(args.query.trim()).await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!("Category search failed: {}", e);
            vec![Category::other()]
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else if categories.is_empty() {
        println!("No categories found.");
    } else {
        for category in &categories {
            println!("{}", category.full_name);
        }
    }

    Ok(())
}
