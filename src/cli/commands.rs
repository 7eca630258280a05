use crate::emit::TargetOs;
use crate::llm::Provider;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generates container artifacts for every service in a repository
#[derive(Parser, Debug)]
#[command(
    name = "monodock",
    about = "Generate Dockerfiles and a compose file for every service in a repository",
    version,
    long_about = "monodock scans a repository for project manifests, classifies each service, \
                  infers the databases, caches and queues it needs, optionally consults an AI \
                  provider, and writes Dockerfiles, a docker-compose file and the commands to \
                  build and run them."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze a repository and generate container artifacts",
        long_about = "Scans the repository, builds the service dependency graph and generates \
                      one Dockerfile per service plus a docker-compose file.\n\n\
                      Examples:\n  \
                      monodock analyze\n  \
                      monodock analyze /path/to/repo --no-ai\n  \
                      monodock analyze --format json --target windows\n  \
                      monodock analyze --provider openai --model gpt-4o-mini --output-dir ./deploy"
    )]
    Analyze(AnalyzeArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub repository_path: Option<PathBuf>,

    #[arg(
        short = 't',
        long,
        value_enum,
        default_value = "posix",
        help = "Shell dialect of the emitted commands"
    )]
    pub target: TargetOs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Write the Dockerfiles and compose file under this directory"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Skip AI consultation and use the built-in templates only")]
    pub no_ai: bool,

    #[arg(short = 'p', long, value_enum, help = "AI provider (overrides MONODOCK_PROVIDER)")]
    pub provider: Option<Provider>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name (provider-specific, e.g. 'qwen2.5-coder:7b' for Ollama)"
    )]
    pub model: Option<String>,

    #[arg(long, value_name = "URL", help = "Provider base URL")]
    pub endpoint: Option<String>,

    #[arg(
        long,
        value_name = "VAR",
        help = "Environment variable holding the provider API key"
    )]
    pub credential_env: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Timeout of each provider attempt in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "BYTES", help = "Maximum size of one prompt fragment")]
    pub max_fragment_size: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
    Yaml,
    Markdown,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => super::output::OutputFormat::Human,
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Markdown => super::output::OutputFormat::Markdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_analyze_args() {
        let args = CliArgs::parse_from(["monodock", "analyze"]);
        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.format, OutputFormatArg::Human);
                assert_eq!(analyze.target, TargetOs::Posix);
                assert!(!analyze.no_ai);
                assert!(analyze.provider.is_none());
                assert!(analyze.timeout.is_none());
                assert!(analyze.repository_path.is_none());
                assert!(analyze.output_dir.is_none());
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_with_options() {
        let args = CliArgs::parse_from([
            "monodock",
            "analyze",
            "/tmp/repo",
            "--target",
            "windows",
            "--format",
            "markdown",
            "--provider",
            "openai",
            "--model",
            "gpt-4o",
            "--endpoint",
            "http://localhost:8080/v1/",
            "--credential-env",
            "MY_KEY",
            "--timeout",
            "120",
            "--max-fragment-size",
            "4096",
            "--output-dir",
            "out",
        ]);

        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.repository_path, Some(PathBuf::from("/tmp/repo")));
                assert_eq!(analyze.target, TargetOs::Windows);
                assert_eq!(analyze.format, OutputFormatArg::Markdown);
                assert_eq!(analyze.provider, Some(Provider::OpenAI));
                assert_eq!(analyze.model.as_deref(), Some("gpt-4o"));
                assert_eq!(analyze.endpoint.as_deref(), Some("http://localhost:8080/v1/"));
                assert_eq!(analyze.credential_env.as_deref(), Some("MY_KEY"));
                assert_eq!(analyze.timeout, Some(120));
                assert_eq!(analyze.max_fragment_size, Some(4096));
                assert_eq!(analyze.output_dir, Some(PathBuf::from("out")));
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_no_ai_flag() {
        let args = CliArgs::parse_from(["monodock", "analyze", "--no-ai"]);
        match args.command {
            Commands::Analyze(analyze) => assert!(analyze.no_ai),
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_config_command() {
        let args = CliArgs::parse_from(["monodock", "config", "--format", "json"]);
        match args.command {
            Commands::Config(config) => assert_eq!(config.format, OutputFormatArg::Json),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_invalid_target_rejected() {
        assert!(CliArgs::try_parse_from(["monodock", "analyze", "--target", "amiga"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["monodock", "-v", "analyze"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["monodock", "analyze", "-q"]);
        assert!(args.quiet);

        let args = CliArgs::parse_from(["monodock", "--log-level", "debug", "config"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["monodock", "-v", "-q", "analyze"]).is_err());
    }
}
