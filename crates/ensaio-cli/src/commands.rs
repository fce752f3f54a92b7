//! Command implementations.

use crate::{output, CheckArgs, CliError, CliResult, RunArgs};
use ensaio::Script;

/// `check`: parse and validate a script offline
pub fn run_check(args: &CheckArgs, use_color: bool) -> CliResult<()> {
    let script = Script::from_file(&args.script)?;
    output::print_script(&script, use_color);
    println!("\nscript is valid");
    Ok(())
}

/// `run`: execute a script against a live browser
#[cfg(feature = "browser")]
pub fn run_run(args: &RunArgs, use_color: bool) -> CliResult<()> {
    use ensaio::{BrowserOptions, BrowserSession, RunnerConfig, StepRunner};

    let script = Script::from_file(&args.script)?;

    let runtime = tokio::runtime::Runtime::new().map_err(ensaio::EnsaioError::Io)?;
    runtime.block_on(async {
        let options = BrowserOptions {
            headless: !args.headed,
            sandbox: !args.no_sandbox,
            chromium_path: args.chromium_path.clone(),
            ..BrowserOptions::default()
        };
        let session = BrowserSession::launch(&options).await?;

        let address = args
            .base_url
            .as_deref()
            .or(script.base_address.as_deref());
        if let Some(address) = address {
            session.goto(address).await?;
        }

        let driver = session.driver();
        let config = RunnerConfig::default().with_artifacts_dir(&args.artifacts);
        let report = StepRunner::with_config(&driver, config).run(&script).await;

        session.close().await?;

        if args.json {
            println!("{}", report.to_json().map_err(|e| {
                ensaio::EnsaioError::script(format!("report serialization failed: {e}"))
            })?);
        } else {
            output::print_report(&report, use_color);
        }

        if report.passed {
            Ok(())
        } else {
            Err(CliError::RunFailed(
                report.fatal.clone().unwrap_or_else(|| "see report".to_string()),
            ))
        }
    })
}

/// `run` without the browser feature compiled in
#[cfg(not(feature = "browser"))]
pub fn run_run(_args: &RunArgs, _use_color: bool) -> CliResult<()> {
    Err(CliError::Unsupported(
        "browser control not enabled. Rebuild with --features browser".to_string(),
    ))
}
