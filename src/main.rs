//! CLI entry point for postfolio

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postfolio::Blog;

#[derive(Parser)]
#[command(name = "postfolio")]
#[command(version)]
#[command(about = "A markdown blog and portfolio site generator", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Series the post belongs to
        #[arg(short, long, requires = "sequence")]
        series: Option<String>,

        /// Position of the post within its series
        #[arg(long, requires = "series")]
        sequence: Option<i64>,
    },

    /// Build the static site
    #[command(alias = "g")]
    Build,

    /// Build, then serve the site and the subscription endpoint
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Rebuild and reload the browser on changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Remove the generated site
    Clean,

    /// List site content
    List {
        /// Type of content to list (posts, series, featured, ids)
        #[arg(default_value = "posts")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postfolio=debug,info"
    } else {
        "postfolio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::New {
            title,
            series,
            sequence,
        } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            let series = series.as_deref().zip(sequence);
            blog.new_post(&title, series)?;
        }

        Commands::Build => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Building site...");
            blog.build()?;
            println!("Built successfully!");
        }

        Commands::Serve { port, ip, watch } => {
            let blog = Blog::new(&base_dir)?;

            // Build first
            tracing::info!("Building site...");
            blog.build()?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            postfolio::server::start(&blog, &ip, port, watch).await?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            postfolio::commands::list::run(&blog, &r#type)?;
        }

        Commands::Version => {
            println!("postfolio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
