use clap::{Parser, Subcommand};
use post_press::config::{self, SiteConfig};
use post_press::storage::S3Store;
use post_press::types::Post;
use post_press::{dates, imaging, output, process, publish, scaffold, scan};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let describe = env!("GIT_DESCRIBE");
    if describe.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        describe
    }
}

#[derive(Parser)]
#[command(name = "post-press")]
#[command(about = "Scaffold, stage images for, and publish date-keyed blog posts")]
#[command(long_about = "\
Scaffold, stage images for, and publish date-keyed blog posts

Posts live in a date-keyed tree under the storage root:

  content/post/
  └── 2024/05/
      ├── 10/                      # First post of the day
      │   ├── index.md             # Frontmatter + body
      │   ├── img_src/             # Drop camera images here
      │   └── img/                 # Normalized images (marks the post unpublished)
      └── 10_1/                    # Second post of the same day

Workflow:
  post-press new -d 2024-05-10     # create the post, process staged images
  post-press new -d 2024-05-10     # again after staging more images
  post-press publish               # upload every unpublished post of this year

Publishing uploads img/ to S3, rewrites img/ links in index.md to the public
URL, then deletes img/ and img_src/.

Settings come from postpress.toml and the environment (POST_DIR,
S3_BUCKET_NAME, S3_KEY_PREFIX, REMOTE_IMG_BASE_URL, AWS_REGION, S3_ENDPOINT).
A .env file in the working directory is read first.

Run 'post-press gen-config' to generate a documented postpress.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Storage root (overrides config and POST_DIR)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Identifies one post from the command line.
#[derive(clap::Args, Clone)]
struct PostArgs {
    /// Post date, e.g. 2024-05-10, 2024/5/10, 20240510 or 5/10 (defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    /// Sequence number for additional posts on the same day
    #[arg(short = 'n', long, default_value_t = 0)]
    number: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Create a post (if needed) and process its staged images
    New(PostArgs),
    /// List unpublished posts of a year
    Scan {
        /// Year to scan (0 = current year)
        #[arg(short, long, default_value_t = 0)]
        year: i32,

        /// Print posts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish every unpublished post of a year
    Publish {
        /// Year to publish (0 = current year)
        #[arg(short, long, default_value_t = 0)]
        year: i32,
    },
    /// Publish a single post
    PublishPost(PostArgs),
    /// Print a stock postpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    load_dotenv();

    match &cli.command {
        Command::New(args) => {
            let site_config = load_site_config(&cli)?;
            let post = post_from_args(&site_config, args);
            let scaffold_report = scaffold::scaffold(&post, &site_config.template)?;
            let backend = imaging::backend_from_config(&site_config.images);
            let process_report = process::process_images(&backend, &post, &site_config.images)?;
            output::print_new_output(&post, &scaffold_report, &process_report);
        }
        Command::Scan { year, json } => {
            let site_config = load_site_config(&cli)?;
            let year = scan::resolve_year(*year);
            let posts = scan::scan(&site_config.storage_root, year)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                output::print_scan_output(year, &posts);
            }
        }
        Command::Publish { year } => {
            let site_config = load_site_config(&cli)?;
            site_config.validate_remote()?;
            let store = S3Store::new(&site_config.remote)?;
            let report = publish::publish_year(
                &store,
                &site_config.storage_root,
                *year,
                &site_config.remote,
            )?;
            output::print_year_report(&report);
        }
        Command::PublishPost(args) => {
            let site_config = load_site_config(&cli)?;
            site_config.validate_remote()?;
            let post = existing_post_from_args(&site_config, args)?;
            let store = S3Store::new(&site_config.remote)?;
            let report = publish::publish(&store, &post, &site_config.remote)?;
            output::print_publish_report(post.relative_path(), &report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Config file, then environment, then `--root`.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.config, |name| std::env::var(name).ok())?;
    if let Some(root) = &cli.root {
        site_config.storage_root = root.clone();
    }
    Ok(site_config)
}

/// Read `.env` from the working directory. A missing file is normal.
fn load_dotenv() {
    if let Err(e) = config::load_env_file(std::path::Path::new(".env")) {
        warn!(error = %e, "Could not load .env file");
    }
}

/// Resolve `--date`/`--number` into a post. Unparseable dates fall back to today.
fn post_from_args(site_config: &SiteConfig, args: &PostArgs) -> Post {
    let today = chrono::Local::now().date_naive();
    let date = dates::date_or_today(args.date.as_deref(), today);
    Post::new(&site_config.storage_root, date, args.number)
}

/// Resolve `--date`/`--number` into a post that must already exist.
fn existing_post_from_args(
    site_config: &SiteConfig,
    args: &PostArgs,
) -> Result<Post, dates::DateError> {
    let today = chrono::Local::now().date_naive();
    let date = dates::require_date(args.date.as_deref(), today)?;
    Ok(Post::new(&site_config.storage_root, date, args.number))
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default = if verbose {
        "warn,post_press=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
