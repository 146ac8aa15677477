use std::{
    error::Error,
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use bucketfs::{
    adapters,
    config::{Args, Command, S3Config},
    util::object::{parse_provider_from_uri, Provider},
    Entry, FilesystemAdapter, ObjectFS, TemporaryUrlGenerator, WriteOptions,
};
use clap::Parser;
use time::OffsetDateTime;
use tracing::{error, info, span, Level};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error_message=%err, error_group="main");
            eprintln!("bucketfs: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = S3Config::from_args(args)?;
    info!(bucket = %config.bucket, region = ?config.region, endpoint = ?config.endpoint, "args");

    let client: Arc<dyn adapters::Object> = match parse_provider_from_uri(&args.bucket)? {
        Provider::AWS => Arc::new(adapters::s3::S3Client::from_config(&config)?),
    };
    let fs = ObjectFS::new(client, &config.bucket);

    let mut stdout = io::stdout().lock();

    match &args.command {
        Command::Ls { path, recursive } => {
            for entry in fs.list_contents(path, *recursive) {
                match entry? {
                    Entry::Directory { path } => writeln!(stdout, "{:>12}  {}", "-", path)?,
                    Entry::File { path, size, .. } => writeln!(stdout, "{:>12}  {}", size, path)?,
                }
            }
        }
        Command::Cat { path } => {
            let mut reader = fs.read_stream(path)?;
            io::copy(&mut reader, &mut stdout)?;
        }
        Command::Stat { path } => {
            let attributes = fs.file_size(path)?;
            writeln!(stdout, "path: {}", attributes.path)?;
            if let Some(size) = attributes.file_size {
                writeln!(stdout, "size: {}", size)?;
            }
            if let Some(mime_type) = attributes.mime_type {
                writeln!(stdout, "mime_type: {}", mime_type)?;
            }
            if let Some(last_modified) = attributes.last_modified {
                writeln!(stdout, "last_modified: {}", last_modified)?;
            }
        }
        Command::Url { path, expires_in } => {
            let expires_at = OffsetDateTime::now_utc() + Duration::from_secs(*expires_in);
            let url = fs.temporary_url(path, expires_at, &WriteOptions::default())?;
            writeln!(stdout, "{}", url)?;
        }
        Command::Rm { path } => fs.delete(path)?,
        Command::Mkdir { path } => fs.create_directory(path, &WriteOptions::default())?,
    }

    stdout.flush()?;
    Ok(())
}
