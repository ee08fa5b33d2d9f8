pub mod cli;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod providers;
pub mod render;
pub mod roles;

use anyhow::Result;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;

use cli::Cli;
use config::{ConfigStore, RuntimeOptions};
use dispatch::{DispatchOutcome, DispatchRequest, HttpTransport, Transport, dispatch};
use render::Renderer;
use roles::RoleTable;

/// Everything one invocation needs besides the parsed arguments.
pub struct App<'a, T: ?Sized> {
    pub store: &'a ConfigStore,
    pub roles: &'a RoleTable,
    pub options: &'a RuntimeOptions,
    pub transport: &'a T,
    pub renderer: &'a Renderer,
}

impl<T: Transport + ?Sized> App<'_, T> {
    /// Persists overrides, validates settings, sends the query and renders the reply.
    ///
    /// Every configuration problem is reported before the transport is touched.
    /// An HTTP error status is written to `out` and yields a failing exit code.
    pub async fn execute(&self, cli: &Cli, out: &mut impl Write) -> Result<ExitCode> {
        let overrides = cli.overrides()?;
        let settings = self.store.apply(&overrides)?.resolve()?;
        let system_prompt = self.roles.system_prompt(cli.query_type.as_deref())?;

        let prepared = providers::build(
            settings.llm_type,
            &settings.api_key,
            system_prompt,
            &cli.query,
        )?;
        let request = DispatchRequest::new(
            settings.endpoint_url,
            prepared,
            settings.insecure_skip_verify,
        );
        let dispatched = dispatch(self.transport, &request).await?;

        match dispatched.outcome {
            DispatchOutcome::Success { body } => {
                if self.options.log_execution_time {
                    render::report_execution_time(out, dispatched.elapsed)?;
                }
                self.renderer.render_answer(out, &body)?;
                Ok(ExitCode::SUCCESS)
            }
            DispatchOutcome::HttpFailure(failure) => {
                render::report_http_failure(out, &failure)?;
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

pub fn print_first_run_help() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let options = RuntimeOptions::from_env();
    let config_path = config::app_dir(&options)
        .map(|dir| ConfigStore::new(dir).path().display().to_string())
        .unwrap_or_else(|_| "~/.llm-shell/config.json".to_string());
    cli::print_first_run_help(&mut io::stdout().lock(), &config_path)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let options = RuntimeOptions::from_env();
    let store = ConfigStore::new(config::app_dir(&options)?);
    let _log_guard = logging::init(store.dir());
    info!(
        config_path = %store.path().display(),
        log_execution_time = options.log_execution_time,
        timeout_secs = ?options.timeout_secs,
        "loaded runtime configuration"
    );

    let roles = RoleTable::default();
    let transport = HttpTransport::new(options.timeout_secs);
    let renderer = Renderer::for_stdout();
    let app = App {
        store: &store,
        roles: &roles,
        options: &options,
        transport: &transport,
        renderer: &renderer,
    };

    let mut stdout = io::stdout().lock();
    app.execute(&cli, &mut stdout).await
}
