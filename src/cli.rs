use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::api::handlers::error_response;
use crate::api::types::PredictResponse;
use crate::error::Result;
use crate::services::Predictor;

#[derive(Parser)]
#[command(name = "mpox")]
#[command(version = "0.1.0")]
#[command(about = "Monkeypox symptom classifier inference endpoint", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, <MPOX_ENV>.toml)
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve the HTTP endpoint (default)
    Serve {
        /// Override the configured listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load both artifacts and report what was loaded
    Check,
    /// Run a single request body through the pipeline and print the response
    Predict {
        /// Request JSON, or @path to read it from a file
        #[arg(short, long)]
        symptoms: String,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve { port: None }
    }
}

/// Read an inline JSON argument or `@file` reference.
pub fn read_request_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(arg.to_string()),
    }
}

/// Produce the status code and JSON body `/predict` would return.
pub fn predict_once(predictor: &Predictor, body: &str, expose_details: bool) -> (u16, Value) {
    match predictor.predict_body(body.as_bytes()) {
        Ok(diagnosis) => (
            200,
            serde_json::to_value(PredictResponse {
                result: diagnosis.to_string(),
            })
            .unwrap_or(Value::Null),
        ),
        Err(e) => {
            let (status, axum::Json(err)) = error_response(&e, expose_details);
            (
                status.as_u16(),
                serde_json::to_value(err).unwrap_or(Value::Null),
            )
        }
    }
}

/// Human-readable summary of the loaded artifacts.
pub fn describe_artifacts(predictor: &Predictor) -> Result<String> {
    let scaler = predictor.scaler();
    let categories = serde_json::to_string(&scaler.categories)?;
    Ok(format!(
        "model:  {}\nscaler: {:?} (input_dim={})\ncategories: {}",
        predictor.classifier().describe(),
        scaler.kind,
        scaler.input_dim(),
        categories
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{Activation, DenseClassifier, DenseLayer, DenseNetwork, Scaler};
    use std::sync::Arc;

    fn predictor() -> Predictor {
        let network = DenseNetwork {
            input_dim: 9,
            layers: vec![DenseLayer {
                weights: vec![vec![1.0; 9]],
                bias: vec![-0.5],
                activation: Activation::Sigmoid,
            }],
            classes: None,
            metadata: Value::Null,
        };
        Predictor::new(
            Scaler::identity(),
            Arc::new(DenseClassifier::new(network, 0.5).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["mpox"]).unwrap();
        assert_eq!(cli.command.unwrap_or_default(), Commands::Serve { port: None });
        assert_eq!(cli.config, PathBuf::from("config"));

        let cli = Cli::try_parse_from(["mpox", "-c", "/etc/mpox", "serve", "--port", "9000"])
            .unwrap();
        assert_eq!(cli.command, Some(Commands::Serve { port: Some(9000) }));
        assert_eq!(cli.config, PathBuf::from("/etc/mpox"));

        let cli = Cli::try_parse_from(["mpox", "predict", "--symptoms", "{}"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Predict {
                symptoms: "{}".to_string()
            })
        );
    }

    #[test]
    fn predict_once_mirrors_endpoint() {
        let p = predictor();
        let (status, body) = predict_once(&p, "{}", false);
        assert_eq!(status, 400);
        assert_eq!(body, serde_json::json!({"error": "Missing symptoms data"}));

        let (status, body) = predict_once(&p, "nope", false);
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Malformed request body");
    }

    #[test]
    fn reads_request_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(&path, "{\"symptoms\": {}}").unwrap();
        let arg = format!("@{}", path.display());
        assert_eq!(read_request_arg(&arg).unwrap(), "{\"symptoms\": {}}");
        assert_eq!(read_request_arg("{}").unwrap(), "{}");
    }

    #[test]
    fn describes_artifacts() {
        let text = describe_artifacts(&predictor()).unwrap();
        assert!(text.contains("dense("));
        assert!(text.contains("Identity"));
    }
}
