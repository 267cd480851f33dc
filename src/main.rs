use clap::Parser;
use env_logger::Env;
use lfiscan::{
    cli::{Cli, Commands, ExitStatus, TraversalArgs},
    config::Config,
    display::DisplayManager,
    file::IncludedFile,
    reporting::{ReportGenerator, ScanReport},
    utils::{progress, time::format_duration},
    Category, HttpTransport, LfiProbe, LfiScanner, Result, ScanOptions, ScanTarget,
    SignatureCatalog, Transport,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    let display = DisplayManager::with_quiet(cli.quiet);

    if !cli.quiet && !matches!(cli.command, Commands::Signatures { .. }) {
        display.print_banner("LFISCAN - Local File Inclusion Scanner", Some("Authorized Testing Only"));
        display.print_warning("Ensure you have proper permission before scanning any application.");
        println!();
    }

    let mut config = match &cli.config {
        Some(config_path) => match Config::load_from_file(&config_path.to_string_lossy()) {
            Ok(config) => {
                if !cli.quiet {
                    display.print_success(&format!("Loaded configuration from {}", config_path.display()));
                }
                config
            }
            Err(e) => {
                display.print_error(&format!("Failed to load configuration: {}", e));
                process::exit(ExitStatus::Error.code());
            }
        },
        None => Config::default(),
    };

    if let Some(timeout) = cli.timeout {
        config.http.timeout = timeout;
    }
    if let Some(output) = &cli.output {
        config.reporting.output_dir = output.clone();
    }

    let start_time = Instant::now();

    let result = match &cli.command {
        Commands::Scan {
            url, param, os, min_depth, max_depth, categories, exhaustive,
            workers, mirror, report, format, traversal,
        } => {
            if let Some(os) = os {
                config.scan.os = Some(os.clone());
            }
            if let Some(n) = min_depth {
                config.scan.min_depth = *n;
            }
            if let Some(n) = max_depth {
                config.scan.max_depth = *n;
            }
            if *exhaustive {
                config.scan.exhaustive = true;
            }
            if let Some(n) = workers {
                config.scan.workers = *n;
            }
            if let Some(dir) = mirror {
                config.reporting.mirror_dir = Some(dir.clone());
            }
            if !format.is_empty() {
                config.reporting.formats = format.iter().map(|f| (*f).into()).collect();
            }
            apply_traversal_args(&mut config, traversal);

            match parse_categories(categories) {
                Ok(parsed) => {
                    if !parsed.is_empty() {
                        config.scan.categories = parsed;
                    }
                    match config.validate() {
                        Ok(()) => execute_scan(&config, &display, url, param.as_deref(), *report).await,
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(e),
            }
        }
        Commands::Include { url, param, path, depth, save, traversal } => {
            apply_traversal_args(&mut config, traversal);
            execute_include(&config, &display, url, param, path, *depth, save.as_ref()).await
        }
        Commands::Signatures { category, os } => {
            execute_signatures(&display, category.as_deref(), os.as_deref())
        }
    };

    let elapsed = start_time.elapsed();

    match result {
        Ok(status) => {
            if !cli.quiet && !matches!(cli.command, Commands::Signatures { .. }) {
                display.print_success(&format!("Completed in {}", format_duration(elapsed)));
            }
            process::exit(status.code());
        }
        Err(e) => {
            if e.is_input_error() {
                display.print_error(&format!("Rejected input: {}", e));
            } else {
                display.print_error(&format!("Scan failed: {}", e));
            }
            process::exit(ExitStatus::Error.code());
        }
    }
}

fn apply_traversal_args(config: &mut Config, args: &TraversalArgs) {
    if let Some(prefix) = &args.prefix {
        config.scan.prefix = Some(prefix.clone());
    }
    if let Some(separator) = args.separator {
        config.scan.separator = separator;
    }
    if args.null_byte {
        config.scan.terminate_with_null = true;
    }
    if let Some(method) = args.method {
        config.scan.method = method.into();
    }
}

fn parse_categories(names: &[String]) -> Result<Vec<Category>> {
    names.iter().map(|name| name.parse()).collect()
}

async fn execute_scan(
    config: &Config,
    display: &DisplayManager,
    url: &str,
    param: Option<&str>,
    write_report: bool,
) -> Result<ExitStatus> {
    display.print_section_header("🔍 LFI SCAN");

    let target = ScanTarget::parse(url)?;
    let catalog = SignatureCatalog::builtin()?;
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.http)?);

    let mut options = ScanOptions::from(config);
    options.param = param.map(String::from);

    let scanner = LfiScanner::new(catalog, transport, options)?;
    let params = target.params_to_test(param)?;

    display.print_info(&format!(
        "Testing {} parameter(s) [{}] against {} signatures",
        params.len(),
        params.join(", "),
        scanner.signatures().len()
    ));

    let abort = scanner.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    let spinner = progress::create_spinner(&format!("Probing {}", target.base()));
    let exhaustive = config.scan.exhaustive;

    let vulnerabilities = if exhaustive {
        if config.scan.workers > 1 {
            scanner.scan_parallel(&target, config.scan.workers, false).await?
        } else {
            scanner.scan_all(&target).await?
        }
    } else if config.scan.workers > 1 {
        scanner.scan_parallel(&target, config.scan.workers, true).await?
    } else {
        scanner.first_vulnerability(&target).await?.into_iter().collect()
    };

    spinner.finish_and_clear();

    let counts = scanner.counts();
    let mut report = ScanReport::new(target.to_string(), exhaustive);
    report.probes_sent = counts.probes;
    report.transport_failures = counts.transport_failures;

    for vuln in &vulnerabilities {
        display.print_vulnerability(vuln);
        report.record(vuln);
    }
    report.complete();

    let aborted = scanner.is_aborted();
    if aborted {
        display.print_warning(&format!("Scan interrupted after {} requests; results are partial", counts.probes));
    }

    if vulnerabilities.is_empty() {
        if counts.probes > 0 && counts.transport_failures == counts.probes {
            display.print_warning(&format!(
                "All {} requests failed; the target could not be assessed",
                counts.probes
            ));
        } else if !aborted {
            display.print_info(&format!("No inclusion confirmed after {} requests", counts.probes));
        }
    } else {
        display.print_success(&format!(
            "{} inclusion(s) confirmed after {} requests",
            vulnerabilities.len(),
            counts.probes
        ));
    }

    let generator = ReportGenerator::new(config.clone());

    if let Some(base) = &config.reporting.mirror_dir {
        let saved = generator.mirror_files(&vulnerabilities, base).await?;
        for path in &saved {
            display.print_info(&format!("Saved {}", path.display()));
        }
    }

    if write_report {
        for path in generator.generate_report(&report).await? {
            display.print_info(&format!("Report written to {}", path.display()));
        }
    }

    Ok(ExitStatus::for_scan(exhaustive, vulnerabilities.len(), aborted))
}

async fn execute_include(
    config: &Config,
    display: &DisplayManager,
    url: &str,
    param: &str,
    path: &str,
    depth: usize,
    save: Option<&PathBuf>,
) -> Result<ExitStatus> {
    let target = ScanTarget::parse(url)?;
    target.params_to_test(Some(param))?;
    if config.scan.prefix.is_none() {
        lfiscan::config::validate_depths(depth, depth)?;
    }

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.http)?);
    let probe = LfiProbe::new(target, param, config.traversal(depth), transport)
        .with_method(config.scan.method);

    display.print_info(&format!("Requesting {}", probe.url_for(path)));
    let file: IncludedFile = probe.include(path).await?;

    match save {
        Some(destination) => {
            let saved = file.save(destination).await?;
            display.print_success(&format!("Saved {} ({} bytes) to {}", file.path, file.body.len(), saved.display()));
        }
        None => println!("{}", file),
    }

    Ok(ExitStatus::Success)
}

fn execute_signatures(display: &DisplayManager, category: Option<&str>, os: Option<&str>) -> Result<ExitStatus> {
    let catalog = SignatureCatalog::builtin()?;

    let signatures = match category {
        Some(name) => catalog.select(&[name.parse::<Category>()?])?,
        None => catalog.all(),
    };

    display.print_section_header(&format!("📚 SIGNATURES ({})", signatures.len()));
    display.print_signatures(&signatures, os);
    Ok(ExitStatus::Success)
}
