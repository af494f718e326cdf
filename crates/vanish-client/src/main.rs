//! Vanish command line tool.
//!
//! # Usage
//!
//! ```bash
//! # Share text from stdin as a one-time secret valid for an hour
//! echo "hunter2" | vanish --api https://vanish.example/api --url https://vanish.example
//!
//! # Share a file for a week, readable more than once
//! vanish --file report.pdf --expiration 1w --one-time false
//!
//! # Fetch and decrypt
//! vanish --decrypt "https://vanish.example/#/s/<id>/<key>"
//! ```

use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vanish_client::{Client, Plaintext, ShareOptions, open, share};
use vanish_proto::Expiration;

/// Secret lifetime on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExpirationArg {
    /// One hour
    #[value(name = "1h")]
    Hour,
    /// One day
    #[value(name = "1d")]
    Day,
    /// One week
    #[value(name = "1w")]
    Week,
}

impl From<ExpirationArg> for Expiration {
    fn from(arg: ExpirationArg) -> Self {
        match arg {
            ExpirationArg::Hour => Self::OneHour,
            ExpirationArg::Day => Self::OneDay,
            ExpirationArg::Week => Self::OneWeek,
        }
    }
}

/// Share secrets that vanish after reading
#[derive(Parser, Debug)]
#[command(name = "vanish")]
#[command(about = "Encrypt and share one-time secrets")]
#[command(version)]
struct Args {
    /// API root of the vanish server
    #[arg(long, env = "VANISH_API", default_value = "http://localhost:1337")]
    api: String,

    /// Base of printed share links (defaults to the API root)
    #[arg(long, env = "VANISH_URL")]
    url: Option<String>,

    /// Share this file instead of stdin
    #[arg(long, conflicts_with = "decrypt")]
    file: Option<PathBuf>,

    /// Lifetime of the secret
    #[arg(long, value_enum, default_value_t = ExpirationArg::Hour)]
    expiration: ExpirationArg,

    /// Delete the secret after the first read
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    one_time: bool,

    /// Manual key; kept out of the link and shared out of band
    #[arg(long)]
    key: Option<String>,

    /// Fetch and decrypt this share link
    #[arg(long)]
    decrypt: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let client = Client::new(&args.api)?;

    if let Some(link) = &args.decrypt {
        let decrypted = open(&client, link, args.key.as_deref()).await?;
        match decrypted.filename.as_deref().and_then(safe_file_name) {
            Some(name) => {
                std::fs::write(&name, &decrypted.content)?;
                writeln!(io::stderr(), "wrote {}", name.display())?;
            },
            None => io::stdout().write_all(&decrypted.content)?,
        }
        return Ok(());
    }

    let plaintext = match args.file {
        Some(path) => Plaintext::File(path),
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            Plaintext::Bytes(bytes)
        },
    };

    let options = ShareOptions {
        expiration: args.expiration.into(),
        one_time: args.one_time,
        key: args.key,
        link_base: args.url.unwrap_or(args.api),
    };
    let shared = share(&client, plaintext, &options).await?;
    tracing::info!(id = %shared.id, "secret stored");

    writeln!(io::stdout(), "{}", shared.link)?;
    Ok(())
}

/// Last path component of a sender-chosen name, never a directory.
fn safe_file_name(name: &str) -> Option<PathBuf> {
    Path::new(name).file_name().map(PathBuf::from)
}
