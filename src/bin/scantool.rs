use barcode_gate::logging::init_logging;
use barcode_gate::tools::{DirectoryCamera, LabelDecoder, ScriptedCamera, ScriptedDecoder, read_script};
use barcode_gate::{
    BarcodeSymbology, Camera, Decoder, RejectReason, ScanConfig, ScanController, ScanRegion,
    SessionOutcome, TrustPolicy, ValidationOutcome, validate_batch_with, validate_with,
};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "scantool", version, about = "Barcode validation and scan session tools")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate payloads given on the command line
    Validate {
        #[arg(required = true)]
        payloads: Vec<String>,
        /// Accept only EAN-13 and UPC-A
        #[arg(long)]
        strict: bool,
    },
    /// Validate one payload per line of a file, in parallel
    ValidateFile {
        #[arg(long)]
        file: PathBuf,
        /// Accept only EAN-13 and UPC-A
        #[arg(long)]
        strict: bool,
    },
    /// Run a scan session over a directory of images with .txt labels
    Scan {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        smoke: bool,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Run a scan session over a script of decode results (one per line)
    Replay {
        #[arg(long)]
        script: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Invalid reads tolerated before the advisory
    #[arg(long)]
    threshold: Option<u32>,
    /// Decode attempts per second, 0 for every frame
    #[arg(long)]
    fps: Option<u32>,
    /// Scan region as WIDTHxHEIGHT
    #[arg(long)]
    region: Option<ScanRegion>,
    /// Decode whole frames
    #[arg(long, conflicts_with = "region")]
    full_frame: bool,
    /// Accept only EAN-13 and UPC-A
    #[arg(long)]
    strict: bool,
}

impl SessionArgs {
    /// Environment configuration with the command-line flags on top
    fn config(&self) -> ScanConfig {
        self.apply(ScanConfig::from_env())
    }

    fn apply(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(threshold) = self.threshold {
            config = config.with_advisory_threshold(threshold);
        }
        if let Some(fps) = self.fps {
            config = config.with_fps(fps);
        }
        if let Some(region) = self.region {
            config = config.with_scan_region(Some(region));
        }
        if self.full_frame {
            config = config.with_scan_region(None);
        }
        if self.strict {
            config = config.with_trust(TrustPolicy::Checksummed);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Validate { payloads, strict } => validate_cmd(&payloads, policy(strict), cli.json),
        Command::ValidateFile { file, strict } => validate_file_cmd(&file, policy(strict), cli.json),
        Command::Scan {
            root,
            limit,
            smoke,
            session,
        } => scan_cmd(&root, limit, smoke, &session, cli.json),
        Command::Replay { script, session } => replay_cmd(&script, &session, cli.json),
    }
}

fn policy(strict: bool) -> TrustPolicy {
    if strict {
        TrustPolicy::Checksummed
    } else {
        TrustPolicy::Permissive
    }
}

fn validate_cmd(payloads: &[String], policy: TrustPolicy, as_json: bool) -> ExitCode {
    let outcomes: Vec<ValidationOutcome> = payloads.iter().map(|p| validate_with(p, policy)).collect();
    print_outcomes(payloads, &outcomes, as_json);
    exit_for_outcomes(&outcomes)
}

fn validate_file_cmd(file: &Path, policy: TrustPolicy, as_json: bool) -> ExitCode {
    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(err) => {
            log::error!("failed to read {}: {}", file.display(), err);
            return ExitCode::from(1);
        }
    };
    let payloads: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if payloads.is_empty() {
        println!("No payloads in {}", file.display());
        return ExitCode::from(2);
    }

    let outcomes = validate_batch_with(&payloads, policy);
    print_outcomes(&payloads, &outcomes, as_json);

    if !as_json {
        println!("\n{} payload(s)", outcomes.len());
        for (key, count) in summarize(&outcomes) {
            println!("  {:<40} {}", key, count);
        }
    }
    exit_for_outcomes(&outcomes)
}

/// Non-zero counts per symbology, then per reject reason, in declaration order
fn summarize(outcomes: &[ValidationOutcome]) -> Vec<(String, usize)> {
    let accepted = BarcodeSymbology::ALL.iter().map(|&symbology| {
        let count = outcomes.iter().filter(|o| o.symbology() == Some(symbology)).count();
        (format!("accepted {}", symbology), count)
    });
    let rejected = RejectReason::ALL.iter().map(|&reason| {
        let count = outcomes.iter().filter(|o| o.reason() == Some(reason)).count();
        (format!("rejected: {}", reason), count)
    });
    accepted.chain(rejected).filter(|(_, count)| *count > 0).collect()
}

fn print_outcomes(payloads: &[String], outcomes: &[ValidationOutcome], as_json: bool) {
    if as_json {
        let rows: Vec<_> = payloads
            .iter()
            .zip(outcomes)
            .map(|(payload, outcome)| json!({ "payload": payload, "result": outcome }))
            .collect();
        println!("{}", json!(rows));
        return;
    }
    for (payload, outcome) in payloads.iter().zip(outcomes) {
        println!("{}\t{}", payload, outcome);
    }
}

fn exit_for_outcomes(outcomes: &[ValidationOutcome]) -> ExitCode {
    if outcomes.iter().all(ValidationOutcome::is_accepted) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn scan_cmd(root: &Path, limit: Option<usize>, smoke: bool, session: &SessionArgs, as_json: bool) -> ExitCode {
    let config = session.config();
    let mut camera = DirectoryCamera::new(root).with_limit(limit).with_smoke(smoke);
    if let Some(interval) = config.frame_interval() {
        camera = camera.with_frame_spacing(interval);
    }
    run_session(camera, LabelDecoder::new(), config, as_json)
}

fn replay_cmd(script_path: &Path, session: &SessionArgs, as_json: bool) -> ExitCode {
    let script = match read_script(script_path) {
        Ok(script) => script,
        Err(err) => {
            log::error!("failed to read script {}: {}", script_path.display(), err);
            return ExitCode::from(1);
        }
    };
    let config = session.config();
    let mut camera = ScriptedCamera::new(script.len());
    if let Some(interval) = config.frame_interval() {
        camera = camera.with_frame_spacing(interval);
    }
    run_session(camera, ScriptedDecoder::new(script), config, as_json)
}

fn run_session<C, D>(camera: C, decoder: D, config: ScanConfig, as_json: bool) -> ExitCode
where
    C: Camera + 'static,
    D: Decoder + 'static,
{
    let (tx, rx) = mpsc::channel();
    let mut controller = ScanController::new(camera, decoder)
        .with_config(config)
        .on_advisory(|advisory| eprintln!("advisory: {}", advisory.message()));

    let handle = controller.open(move |outcome| {
        let _ = tx.send(outcome);
    });
    let interrupt = handle.clone();
    if let Err(err) = ctrlc::set_handler(move || interrupt.cancel()) {
        log::warn!("Ctrl+C will not cancel the session: {}", err);
    }

    controller.run();
    let outcome = rx.recv().unwrap_or(SessionOutcome::Cancelled);
    let stats = handle.stats();

    if as_json {
        println!("{}", json!({ "session": handle.id().get(), "result": outcome, "stats": stats }));
    } else {
        match &outcome {
            SessionOutcome::Succeeded { payload, symbology } => {
                println!("Scanned {} ({})", payload, symbology)
            }
            SessionOutcome::Failed { error } => println!("Scan failed: {}", error),
            SessionOutcome::Cancelled => println!("Scan cancelled"),
        }
        println!(
            "frames={} throttled={} decodes={} invalid={} duplicates={}",
            stats.frames_seen, stats.frames_throttled, stats.decodes, stats.invalid_attempts, stats.duplicates
        );
    }

    match outcome {
        SessionOutcome::Succeeded { .. } => ExitCode::SUCCESS,
        SessionOutcome::Failed { .. } => ExitCode::from(1),
        SessionOutcome::Cancelled => ExitCode::from(2),
    }
}
