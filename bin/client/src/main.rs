//! Document exchange client

mod api;
mod constants;
mod download;
mod session;
mod upload;

use api::ApiClient;
use clap::{Parser, Subcommand};
use common::utils::token_from_link;
use constants::{CLIENT_DATA_DIR, DEFAULT_SERVER_URL, DOWNLOADED_DIR};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Document exchange client")]
struct Cli {
    /// Server URL
    #[arg(short, long, global = true, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Directory holding the saved access token and downloads
    #[arg(long, global = true, default_value = CLIENT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Verify an email address with the mailed link or its token
    Verify { link: String },
    /// Log in and save the access token
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// List uploaded documents
    List,
    /// Upload a pptx, docx or xlsx document (ops users only)
    Upload { path: PathBuf },
    /// Request a download link for a document
    Link { file_id: i64 },
    /// Download a document with a download link or its token
    Download {
        link: String,
        /// Output directory (default: client_data/downloaded/)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Check that the server is up
    Health,
}

fn authenticated(cli: &Cli) -> anyhow::Result<ApiClient> {
    let token = session::load_access_token(&cli.data_dir)?;
    Ok(ApiClient::new(&cli.server).with_access_token(token))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server);

    match &cli.command {
        Commands::Signup {
            username,
            email,
            password,
        } => {
            println!("{}", api.signup(username, email, password)?);
        }
        Commands::Verify { link } => {
            println!("{}", api.verify_email(token_from_link(link))?);
        }
        Commands::Login { email, password } => {
            let token = api.login(email, password)?;
            let path = session::save_access_token(&cli.data_dir, &token)?;
            println!("Logged in. Access token saved to: {}", path.display());
        }
        Commands::List => {
            let files = authenticated(&cli)?.list_files()?;
            if files.is_empty() {
                println!("No files uploaded yet");
            }
            for file in files {
                println!(
                    "{:>6}  {}  {}",
                    file.id,
                    file.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
                    file.filename
                );
            }
        }
        Commands::Upload { path } => {
            upload::upload_file(&authenticated(&cli)?, path)?;
        }
        Commands::Link { file_id } => {
            let link = authenticated(&cli)?.download_link(*file_id)?;
            println!("Download URL: {}", link.download_url);
            println!("Expires in: {}s", link.expires_in);
        }
        Commands::Download { link, output_dir } => {
            let output_dir = output_dir
                .clone()
                .unwrap_or_else(|| cli.data_dir.join(DOWNLOADED_DIR));
            download::download_file(&authenticated(&cli)?, token_from_link(link), &output_dir)?;
        }
        Commands::Health => {
            println!("Server status: {}", api.health()?.status);
        }
    }

    Ok(())
}
