use clap::Parser;
use log::info;
use recipe_collector::config::load_config;
use recipe_collector::{
    CollectRequest, CollectorError, DiscardSink, FilterSpec, NutrientField, NutritionPredicate,
    RecipeCollector,
};
use std::path::PathBuf;
use std::time::Duration;

/// Search a recipe site and print the recipes that pass the given filters as JSON
#[derive(Parser, Debug)]
#[command(name = "recipe-collector", version, about)]
struct Args {
    /// Search term, e.g. "chicken"
    search: String,

    /// Number of recipes to collect
    #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    count: u16,

    /// Ingredients to exclude (comma separated, case-insensitive)
    #[arg(short, long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Minimum protein in grams
    #[arg(long)]
    protein_min: Option<f64>,

    /// Maximum fat in grams
    #[arg(long)]
    fat_max: Option<f64>,

    /// Maximum carbohydrates in grams
    #[arg(long)]
    carbs_max: Option<f64>,

    /// Extra nutrition filter, e.g. "calories<=500" (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<NutritionPredicate>,

    /// Site to search instead of the configured one
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Configuration file (defaults to ./recipe-collector.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Config-file defaults followed by the command-line filters
    fn filter_spec(&self, defaults: FilterSpec) -> FilterSpec {
        let mut predicates = defaults.nutrition_predicates().to_vec();
        predicates.extend(self.filters.iter().copied());

        let limits = [
            (NutrientField::ProteinContent, self.protein_min, true),
            (NutrientField::FatContent, self.fat_max, false),
            (NutrientField::CarbohydrateContent, self.carbs_max, false),
        ];
        for (field, limit, is_minimum) in limits {
            if let Some(limit) = limit {
                predicates.push(if is_minimum {
                    NutritionPredicate::at_least(field, limit)
                } else {
                    NutritionPredicate::at_most(field, limit)
                });
            }
        }

        let banned = defaults
            .banned_ingredients()
            .iter()
            .chain(self.exclude.iter());
        FilterSpec::new(banned, predicates)
    }
}

#[tokio::main]
async fn main() -> Result<(), CollectorError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let filter = args.filter_spec(config.filter_spec()?);

    let mut builder = RecipeCollector::builder().config(config);
    if let Some(base_url) = &args.base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(Duration::from_secs(timeout));
    }
    let collector = builder.build()?;

    let request = CollectRequest::new(&args.search, usize::from(args.count), filter);
    let recipes = collector.collect(&request, &mut DiscardSink).await;

    if recipes.is_empty() {
        info!("No recipes matched the criteria");
    }
    println!("{}", serde_json::to_string_pretty(&recipes)?);

    Ok(())
}
