use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "xlocate-runner")]
#[command(about = "Resolve page-file element lookups in a live browser")]
#[command(version)]
struct Cli {
    /// Page file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate the page file and list its elements without a browser
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> xlocate_runner::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let params = xlocate_runner::Params::from_args(&cli.params)?;
    let mut config = xlocate_runner::Config::load_with_params(&cli.config, &params)?;

    if cli.check {
        println!("Page valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Elements: {}", config.elements.len());
        for (name, stack) in &config.elements {
            let shape: Vec<String> = stack.iter().map(|d| d.to_string()).collect();
            println!("    - {}: {}", name, shape.join(", "));
        }
        println!("  Lookups: {}", config.lookups.len());
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        if let Some(ref retry) = config.on_failure.as_ref().and_then(|f| f.retry.as_ref()) {
            println!("  Retry attempts: {}", retry.attempts);
        }
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let mut runner = xlocate_runner::Runner::new(&config.browser).await?;
    let result = runner.run(&config).await?;

    println!();
    for outcome in &result.lookups {
        match &outcome.found {
            Some(c) => println!(
                "  {} -> <{}> at ({}, {}) {}x{} in {}",
                outcome.name,
                c.tag_name,
                c.rect.left,
                c.rect.top,
                c.rect.width(),
                c.rect.height(),
                c.frame
            ),
            None => println!("  {} -> absent", outcome.name),
        }
    }
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    println!("  Lookups: {}/{}", result.lookups.len(), config.lookups.len());
    println!("  Duration: {}ms", result.duration_ms);
    if result.retries > 0 {
        println!("  Retries: {}", result.retries);
    }

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
