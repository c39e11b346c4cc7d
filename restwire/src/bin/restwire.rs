//! restwire CLI: issue load-balanced calls against a set of endpoints from the shell.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use restwire::http::Method;
use restwire::{Call, CallError, ClientDispatcher, HttpClient, RoundRobinEndpointProvider};
use thiserror::Error;
use tracing_subscriber::prelude::*;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
enum CliError {
    #[error("expected NAME=VALUE, got {0:?}")]
    Pair(String),
    #[error("invalid HTTP method {0:?}")]
    Method(String),
    #[error("body is not valid JSON: {0}")]
    Body(#[from] serde_json::Error),
    #[error(transparent)]
    Call(#[from] CallError),
}

#[derive(Parser)]
#[command(name = "restwire")]
#[command(about = "Declarative REST clients: call endpoints through the restwire dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one or more requests, round-robin over the given endpoints.
    Call(CallArgs),
}

#[derive(Args, Debug)]
struct CallArgs {
    /// Base address; repeat for several (e.g. --endpoint http://127.0.0.1:8080)
    #[arg(long = "endpoint", required = true)]
    endpoints: Vec<String>,
    #[arg(long, default_value = "GET")]
    method: String,
    /// Request path, appended to the endpoint
    #[arg(long, default_value = "/")]
    path: String,
    /// Query pair NAME=VALUE; repeatable
    #[arg(long = "query", value_parser = parse_pair)]
    query: Vec<(String, String)>,
    /// Header NAME=VALUE; repeatable
    #[arg(long = "header", value_parser = parse_pair)]
    headers: Vec<(String, String)>,
    /// JSON request body
    #[arg(long)]
    body: Option<String>,
    /// Number of calls to send
    #[arg(long, default_value_t = 1)]
    repeat: usize,
}

impl CallArgs {
    fn to_call(&self) -> Result<Call, CliError> {
        let method = Method::from_bytes(self.method.to_uppercase().as_bytes())
            .map_err(|_| CliError::Method(self.method.clone()))?;
        let mut call = Call::new(method, self.path.as_str());
        for (name, value) in &self.query {
            call = call.query(name, value);
        }
        for (name, value) in &self.headers {
            call = call.header(name, value);
        }
        if let Some(body) = &self.body {
            let body: serde_json::Value = serde_json::from_str(body)?;
            call = call.json_body(&body)?;
        }
        Ok(call)
    }

    fn run(&self) -> Result<(), BoxError> {
        let call = self.to_call()?;
        let provider = RoundRobinEndpointProvider::new(self.endpoints.iter().cloned())?;
        let dispatcher =
            ClientDispatcher::new("restwire::cli", Arc::new(provider), HttpClient::default_json()?);
        for n in 1..=self.repeat {
            let value = dispatcher.invoke_value(call.clone())?;
            println!("#{n} {}", serde_json::to_string_pretty(&value)?);
        }
        Ok(())
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), CliError> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| CliError::Pair(raw.to_string()))
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Commands::Call(args) => args.run(),
    }
}
