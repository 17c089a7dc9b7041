//! Probe command-line runner.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use probe::{Assertion, Check, HttpMethod, Request, TestResult};
use probe_domain::Header;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Probe - run HTTP checks from the command line.
#[derive(Parser)]
#[command(name = "probe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single request and evaluate it
    Check(CheckArgs),

    /// Run every request of a YAML or JSON suite file
    Run {
        /// Path to the suite file
        suite: PathBuf,
    },
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Target URL
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: HttpMethod,

    /// Request header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Basic auth credentials as 'user:password'
    #[arg(long)]
    basic_auth: Option<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Expected status code
    #[arg(long)]
    status: Option<u16>,

    /// Require a JSON body
    #[arg(long)]
    json: bool,

    /// Require an empty body
    #[arg(long)]
    empty: bool,

    /// Require the body to contain this text
    #[arg(long)]
    contains: Option<String>,

    /// Repeat until this status code is returned
    #[arg(long)]
    until_status: Option<u16>,

    /// Maximum number of attempts
    #[arg(long, env = "PROBE_ITERATIONS")]
    iterations: Option<u32>,

    /// Pause between attempts in milliseconds
    #[arg(long)]
    sleep_ms: Option<u64>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl CheckArgs {
    fn into_request(self) -> Result<Request, Box<dyn std::error::Error>> {
        let mut request = probe::request(self.method, self.url);

        for raw in &self.headers {
            let header = Header::parse(raw)?;
            request = request.header(header.name, header.value);
        }
        if let Some(credentials) = &self.basic_auth {
            let (username, password) = credentials
                .split_once(':')
                .ok_or("basic auth must be given as 'user:password'")?;
            request = request.basic_auth(username, password);
        }
        if let Some(data) = self.data {
            request = request.body(data);
        }
        if let Some(expected) = self.status {
            request = request.status_code(expected);
        }
        if self.json {
            request = request.body_is_json();
        }
        if self.empty {
            request = request.body_is_empty();
        }
        if let Some(text) = self.contains {
            request = request.body_contains(text);
        }
        if let Some(expected) = self.until_status {
            let until = Assertion::StatusCode { expected };
            request = request.test(move |response, _| {
                if until.evaluate(response).is_success() {
                    TestResult::success()
                } else {
                    TestResult::repeat()
                }
            });
        }
        if let Some(iterations) = self.iterations {
            request = request.iterations(iterations);
        }
        if let Some(sleep_ms) = self.sleep_ms {
            request = request.sleep(Duration::from_millis(sleep_ms));
        }
        if let Some(timeout_secs) = self.timeout_secs {
            request = request.timeout(Duration::from_secs(timeout_secs));
        }

        Ok(request)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => args.into_request()?.run().await,
        Commands::Run { suite } => {
            let suite = probe::load_suite(&suite).await?;
            let mut group = suite.to_group(&probe::default_client())?;
            group.run().await
        }
    };

    println!("{result}");
    Ok(ExitCode::from(probe::exit_status(result.kind())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use probe::ResultKind;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check_args(args: &[&str]) -> CheckArgs {
        let argv = ["probe", "check"].into_iter().chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Check(args) => args,
            Commands::Run { .. } => panic!("expected the check subcommand"),
        }
    }

    async fn server_returning(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_parse_check_flags() {
        let args = check_args(&[
            "http://localhost/items",
            "-X",
            "post",
            "-H",
            "Accept: application/json",
            "-H",
            "X-Tag: one",
            "--status",
            "201",
            "--iterations",
            "4",
        ]);

        assert_eq!(args.method, HttpMethod::Post);
        assert_eq!(args.headers.len(), 2);
        assert_eq!(args.status, Some(201));
        assert_eq!(args.iterations, Some(4));
        assert_eq!(args.into_request().unwrap().configured_iterations(), 4);
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["probe", "run", "suite.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run { suite } if suite == PathBuf::from("suite.yaml")
        ));
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let parsed = Cli::try_parse_from(["probe", "check", "http://localhost", "-X", "BREW"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_basic_auth_without_colon() {
        let args = check_args(&["http://localhost", "--basic-auth", "user"]);
        let error = args.into_request().unwrap_err();
        assert_eq!(error.to_string(), "basic auth must be given as 'user:password'");
    }

    #[test]
    fn test_malformed_header() {
        let args = check_args(&["http://localhost", "-H", "no colon here"]);
        assert!(args.into_request().is_err());
    }

    #[tokio::test]
    async fn test_until_status_repeats_until_budget() {
        let server = server_returning(503).await;
        let uri = server.uri();
        let args = check_args(&[&uri, "--until-status", "200", "--iterations", "2"]);

        let result = args.into_request().unwrap().run().await;

        assert_eq!(result.kind(), ResultKind::Failure);
        assert_eq!(result.description(), "failed after running out of iterations");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_until_status_reached() {
        let server = server_returning(200).await;
        let uri = server.uri();
        let args = check_args(&[&uri, "--until-status", "200", "--iterations", "3"]);

        let result = args.into_request().unwrap().run().await;

        assert_eq!(result.kind(), ResultKind::Success);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
