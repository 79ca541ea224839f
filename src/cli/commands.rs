//! CLI command implementations

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::http_server::{AppState, HttpServer};
use crate::observability::init_tracing;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};

/// How often expired sessions are swept from the store
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a CLI command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::HashPassword { config } => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            hash_password(config.as_deref(), stdin.lock(), stdout.lock())
        }
    }
}

/// Start the HTTP server and block until it stops
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    init_tracing();

    let mut config = Config::load_or_default(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let state = config.build_state();
    let server = HttpServer::new(config.http.clone(), state.clone());

    info!(
        addr = %server.socket_addr(),
        max_upload_bytes = config.max_upload_bytes,
        session_ttl_hours = config.session_ttl_hours,
        "starting filevault"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        tokio::spawn(sweep_sessions(state));
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server error: {}", e)))
    })
}

async fn sweep_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match state.auth.purge_expired_sessions() {
            Ok(0) => {}
            Ok(removed) => info!(removed, "purged expired sessions"),
            Err(e) => warn!(error = %e, "session sweep failed"),
        }
    }
}

/// Read one password line from `input` and write its encoded credential to `output`
///
/// The output is suitable for seeding a user record by hand.
pub fn hash_password<R: BufRead, W: Write>(
    config_path: Option<&Path>,
    mut input: R,
    mut output: W,
) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);

    if password.is_empty() {
        return Err(CliError::hash_failed("No password given on stdin"));
    }

    let credential = config
        .verifier()
        .issue(password)
        .map_err(|e| CliError::hash_failed(e.to_string()))?;

    writeln!(output, "{}", credential.encode())?;
    output.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StoredCredential;
    use crate::cli::errors::CliErrorCode;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn cheap_config() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"scrypt": {"log_n": 8}}"#).unwrap();
        file
    }

    #[test]
    fn test_hash_password_prints_verifiable_credential() {
        let config_file = cheap_config();
        let mut out = Vec::<u8>::new();

        hash_password(
            Some(config_file.path()),
            Cursor::new("correct horse\n"),
            &mut out,
        )
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        let credential = StoredCredential::parse(printed.trim()).unwrap();
        let verifier = Config::load(config_file.path()).unwrap().verifier();

        assert!(verifier.verify("correct horse", &credential).unwrap());
        assert!(!verifier.verify("correct horse\n", &credential).unwrap());
    }

    #[test]
    fn test_hash_password_rejects_empty_input() {
        let config_file = cheap_config();
        let err = hash_password(Some(config_file.path()), Cursor::new("\n"), Vec::<u8>::new())
            .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::HashFailed);
    }

    #[test]
    fn test_serve_with_bad_config_fails_before_binding() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"max_upload_bytes": 0}"#).unwrap();

        let err = serve(Some(file.path()), None).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
