use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image_functions::functions::FunctionSet;
use image_functions::models::{Config, InvocationRequest, Variant};
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FunctionArg {
    Resize,
    Ocr,
}

impl From<FunctionArg> for Variant {
    fn from(arg: FunctionArg) -> Self {
        match arg {
            FunctionArg::Resize => Variant::Resize,
            FunctionArg::Ocr => Variant::Ocr,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "image-functions")]
#[command(about = "Invoke the image resize or OCR function once")]
struct CliArgs {
    /// Function to invoke.
    #[arg(value_enum)]
    function: FunctionArg,

    /// JSON invocation envelope; read from stdin when neither this nor --image is given.
    #[arg(long, value_name = "FILE", conflicts_with = "image")]
    envelope: Option<PathBuf>,

    /// Raw image file to send as the request body.
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,

    /// Query string sent with --image.
    #[arg(long, default_value = "")]
    query: String,
}

fn load_request(args: &CliArgs) -> Result<InvocationRequest> {
    if let Some(path) = &args.image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        return Ok(InvocationRequest::from_bytes(&bytes, args.query.clone()));
    }

    let json = match &args.envelope {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read envelope {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read envelope from stdin")?;
            buf
        }
    };

    serde_json::from_str(&json).context("Invalid invocation envelope")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_functions=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let request = load_request(&args)?;
    let variant = Variant::from(args.function);
    info!("Invoking {}", variant);

    let functions = FunctionSet::from_config(&config);
    let result = functions.get(variant).invoke(request).await;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_args() {
        let args = CliArgs::try_parse_from([
            "image-functions",
            "resize",
            "--image",
            "a.png",
            "--query",
            "t1",
        ])
        .unwrap();

        assert!(matches!(args.function, FunctionArg::Resize));
        assert_eq!(args.query, "t1");
    }

    #[test]
    fn test_envelope_conflicts_with_image() {
        let err = CliArgs::try_parse_from([
            "image-functions",
            "ocr",
            "--envelope",
            "e.json",
            "--image",
            "a.png",
        ])
        .unwrap_err();

        assert!(err.to_string().contains("cannot be used with"));
    }

    #[test]
    fn test_load_request_from_envelope_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envelope.json");
        std::fs::write(&path, r#"{"__ow_body": "aGk=", "__ow_query": "run-42"}"#).unwrap();

        let args = CliArgs::try_parse_from([
            "image-functions",
            "ocr",
            "--envelope",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let request = load_request(&args).unwrap();
        assert_eq!(request, InvocationRequest::new("aGk=", "run-42"));
    }
}
