use clap::{Parser, ValueEnum};
use jobboard_crawler::config::prepare_folder;
use jobboard_crawler::writer::append_location_links;
use jobboard_crawler::{
    load_config, logging, ApolloClient, ApolloCrawlConfig, CrawlPipeline, CrawlerConfig,
    HiringCafeClient, HiringCafeCrawlConfig, Result,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Site {
    HiringCafe,
    Apollo,
}

/// Browser-driven crawler for job boards and company listings.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// YAML config file for the selected site.
    #[arg(long, default_value = "config/hiring_cafe.yaml")]
    config: PathBuf,

    /// Site to crawl.
    #[arg(long, value_enum, default_value_t = Site::HiringCafe)]
    site: Site,

    /// Stop after link discovery; skip the detail pages.
    #[arg(long)]
    links_only: bool,

    /// Collect location links from the sitemap instead of scrolling the
    /// listing page.
    #[arg(long)]
    via_sitemap: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let results_dir = prepare_folder(&config.results_dir())?;
    let logs_dir = prepare_folder(&config.logs_dir())?;
    let _guard = logging::init(&logs_dir)?;

    match cli.site {
        Site::HiringCafe => run_hiring_cafe(&cli, &config, &results_dir),
        Site::Apollo => run_apollo(&config),
    }
}

fn run_hiring_cafe(cli: &Cli, config: &CrawlerConfig, results_dir: &Path) -> Result<()> {
    let client = HiringCafeClient::new(HiringCafeCrawlConfig::from(config));

    if cli.via_sitemap {
        let links = client.collect_location_links()?;
        let csv_path = results_dir.join("location_links.csv");
        append_location_links(&links, &csv_path)?;
        info!(
            "✅ appended {} location links to {}",
            links.len(),
            csv_path.display()
        );
        return Ok(());
    }

    let pipeline = CrawlPipeline::new()
        .discover(&client)?
        .checkpoint(&results_dir.join("job_links.json"));

    if cli.links_only {
        info!("🔗 stopping after discovery: {} links", pipeline.links().len());
        return Ok(());
    }

    pipeline.extract_each(&client, results_dir);
    Ok(())
}

fn run_apollo(config: &CrawlerConfig) -> Result<()> {
    prepare_folder(&config.pages_dir())?;
    let client = ApolloClient::new(ApolloCrawlConfig::from(config));

    let saved = client.capture_pages()?;
    info!("🏁 captured {} pages", saved.len());
    Ok(())
}
