use clap::{Parser, Subcommand};

use crate::{model::fs::FSError, util};

/// Connection settings for one S3 bucket. Credentials are not part of it; they
/// come from the standard AWS provider chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

impl S3Config {
    pub fn from_args(args: &Args) -> Result<Self, FSError> {
        let bucket = util::object::parse_bucket_from_uri(&args.bucket);
        if bucket.is_empty() {
            return Err(FSError::new(format!(
                "failed to parse bucket of: {}",
                args.bucket
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            region: args.region.clone(),
            endpoint: args.endpoint.clone(),
            force_path_style: args.path_style,
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "bucketfs", version, about = "Browse an object storage bucket like a filesystem")]
pub struct Args {
    /// Bucket name or `s3://bucket` URI
    #[arg(long, env = "BUCKETFS_BUCKET")]
    pub bucket: String,

    #[arg(long, env = "BUCKETFS_REGION")]
    pub region: Option<String>,

    /// Custom endpoint, e.g. a local S3-compatible server
    #[arg(long, env = "BUCKETFS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Address the bucket in the URL path instead of the host name
    #[arg(long)]
    pub path_style: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List a directory
    Ls {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print a file to stdout
    Cat { path: String },
    /// Show size, mime type and modification time of a file
    Stat { path: String },
    /// Print a signed URL for a file
    Url {
        path: String,
        #[arg(long, default_value_t = 3600)]
        expires_in: u64,
    },
    /// Delete a file
    Rm { path: String },
    /// Create a directory placeholder
    Mkdir { path: String },
}
