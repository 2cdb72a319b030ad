use clap::{Parser, Subcommand};
use sitemap_gen::config::{self, Overrides};
use sitemap_gen::locale::Locales;
use sitemap_gen::manifest::JsonRouteManifest;
use sitemap_gen::writer::FsSink;
use sitemap_gen::{generate, output};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sitemap-gen")]
#[command(about = "Sitemap generator for statically generated sites")]
#[command(long_about = "\
Sitemap generator for statically generated sites

Every file under the pages directory becomes a route; a JSON route
manifest can be used instead. Routes are filtered by exclude/include
rules and written to sitemap.xml, optionally once per language with
<xhtml:link> alternates.

Pages structure:

  pages/
  ├── index.html                   # → /
  ├── about.html                   # → /about
  ├── _app.js                      # reserved, skipped
  └── blog/
      ├── index.md                 # → /blog
      └── first-post.md            # → /blog/first-post

Run 'sitemap-gen gen-config' to generate a documented sitemap.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML, or JSON by extension)
    #[arg(long, default_value = "sitemap.toml", global = true)]
    config: PathBuf,

    /// Base URL, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Pages directory, overriding the config file
    #[arg(long, global = true)]
    pages: Option<PathBuf>,

    /// Route manifest to read instead of walking the pages directory
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Directory sitemap.xml is written to, overriding the config file
    #[arg(long, global = true)]
    target: Option<PathBuf>,

    /// Log every discovered and excluded page
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate sitemap.xml
    Build,
    /// List the entries that would be written, without writing anything
    Check,
    /// Print a stock sitemap.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            pages_directory: self.pages.clone(),
            route_manifest: self.manifest.clone(),
            target_directory: self.target.clone(),
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "sitemap_gen=debug"
    } else {
        "sitemap_gen=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            setup_logging(cli.verbose);
            let mut sink = FsSink::new();
            let summary =
                generate::run(&cli.config, &cli.overrides(), &JsonRouteManifest, &mut sink)?;
            output::print_build_output(&summary);
        }
        Command::Check => {
            setup_logging(cli.verbose);
            let config = config::load_config(&cli.config, &cli.overrides())?;
            let lastmod = config.lastmod.then(generate::today);
            let collected =
                generate::collect_entries(&config, &JsonRouteManifest, lastmod.as_deref())?;
            output::print_check_output(
                &collected,
                &config.base_url,
                &Locales::from_config(&config),
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
