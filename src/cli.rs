use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::io::Write;

use crate::config::{ConfigOverrides, LlmType};

/// Ask an LLM endpoint for shell commands and render the answer as Markdown.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "llm-shell", version, about, long_about = None)]
pub struct Cli {
    /// The API key for the endpoint; saved for later runs
    #[arg(long = "api_key", value_name = "API_KEY")]
    pub api_key: Option<String>,

    /// The URL of the completion endpoint; saved for later runs
    #[arg(long = "endpoint_url", value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// The request dialect of the endpoint, either llama or GPT; saved for later runs
    #[arg(long = "llm_type", value_name = "llama|GPT")]
    pub llm_type: Option<String>,

    /// shell-bash, kubectl or powershell; defaults to shell-bash
    #[arg(long = "query_type", value_name = "TYPE")]
    pub query_type: Option<String>,

    /// Skip TLS certificate verification for self-signed endpoints; saved for later runs
    #[arg(long = "insecure_skip_verify", value_name = "true|false")]
    pub insecure_skip_verify: Option<bool>,

    /// The query to send to the endpoint
    pub query: String,
}

impl Cli {
    /// Settings to persist. An unknown `--llm_type` fails here, before anything is written.
    pub fn overrides(&self) -> Result<ConfigOverrides> {
        let llm_type = self
            .llm_type
            .as_deref()
            .map(str::parse::<LlmType>)
            .transpose()?;

        Ok(ConfigOverrides {
            api_key: self.api_key.clone(),
            endpoint_url: self.endpoint_url.clone(),
            llm_type,
            insecure_skip_verify: self.insecure_skip_verify,
        })
    }
}

/// True when the program was started with no arguments at all.
pub fn is_bare_invocation<I>(args: I) -> bool
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter().nth(1).is_none()
}

pub fn print_first_run_help(out: &mut impl Write, config_path: &str) -> std::io::Result<()> {
    writeln!(
        out,
        "Please provide an API key and an endpoint URL the first time you run this. \
         All command line arguments are optional."
    )?;
    writeln!(
        out,
        "Example: llm-shell --api_key <API_KEY> --endpoint_url <ENDPOINT_URL> --llm_type GPT \
         --query_type kubectl \"query\""
    )?;
    writeln!(
        out,
        "Once provided, the api_key and endpoint_url will be saved in a config.json file for future use."
    )?;
    writeln!(
        out,
        "If the query_type parameter is not provided, it defaults to shell-bash."
    )?;
    writeln!(out, "This config file is saved into {config_path}")?;
    out.flush()
}
