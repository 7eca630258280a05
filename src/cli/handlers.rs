//! Subcommand handlers; each returns the process exit code

use super::commands::{AnalyzeArgs, ConfigArgs};
use super::output::{write_artifacts, OutputFormatter};
use crate::config::MonodockConfig;
use crate::pipeline::{Analyzer, CancellationSignal};
use crate::progress::{LoggingHandler, NoOpHandler, ProgressHandler};
use std::env;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Applies command-line overrides on top of the environment configuration
fn effective_config(args: &AnalyzeArgs) -> MonodockConfig {
    let default_config = MonodockConfig::default();
    let provider = args.provider.unwrap_or(default_config.provider);
    let model = match (&args.model, args.provider) {
        (Some(model), _) => model.clone(),
        (None, Some(p)) if p != default_config.provider => p.default_model().to_string(),
        (None, _) => default_config.model.clone(),
    };

    MonodockConfig {
        provider,
        model,
        api_base_url: args.endpoint.clone().or(default_config.api_base_url.clone()),
        credential_env: args.credential_env.clone().or(default_config.credential_env.clone()),
        request_timeout_secs: args.timeout.unwrap_or(default_config.request_timeout_secs),
        max_fragment_size: args.max_fragment_size.unwrap_or(default_config.max_fragment_size),
        ..default_config
    }
}

pub async fn handle_analyze(args: &AnalyzeArgs, quiet: bool) -> i32 {
    let repo_path = match &args.repository_path {
        Some(path) => path.clone(),
        None => match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("Failed to get current directory: {}", e);
                return 1;
            }
        },
    };
    debug!("Repository path: {}", repo_path.display());

    let config = effective_config(args);
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return 1;
    }

    let progress: Arc<dyn ProgressHandler> = if quiet {
        Arc::new(NoOpHandler)
    } else {
        Arc::new(LoggingHandler)
    };

    let cancel = CancellationSignal::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    let analyzer = if args.no_ai {
        debug!("AI consultation disabled by --no-ai");
        Analyzer::offline()
    } else {
        let ai_config = config.to_ai_config();
        debug!(
            provider = %ai_config.provider,
            model = %ai_config.model,
            endpoint = ?ai_config.endpoint,
            "Using AI provider"
        );
        Analyzer::new(ai_config.create_client(), ai_config.pipeline_config())
    };
    let analyzer = analyzer.with_progress(progress).with_cancellation(cancel);

    let result = match analyzer.run(&repo_path, args.target).await {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            eprintln!("\n{}", e.help_message());
            return if e.is_cancelled() { 130 } else { 1 };
        }
    };

    if let Some(dir) = &args.output_dir {
        match write_artifacts(dir, &result) {
            Ok(written) => {
                for path in &written {
                    info!(path = %path.display(), "Wrote artifact");
                }
                if !quiet {
                    eprintln!("Wrote {} file(s) to {}", written.len(), dir.display());
                }
            }
            Err(e) => {
                error!("{:#}", e);
                return 1;
            }
        }
    }

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format(&result) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = MonodockConfig::default();
    let formatter = OutputFormatter::new(args.format.into());
    let status = match config.validate() {
        Ok(()) => 0,
        Err(e) => {
            error!("Configuration error: {}", e);
            1
        }
    };
    match formatter.format_config(&config) {
        Ok(output) => {
            println!("{}", output);
            status
        }
        Err(e) => {
            error!("Failed to format configuration: {:#}", e);
            1
        }
    }
}
