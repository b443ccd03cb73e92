mod args;
mod render;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::mpsc;

use walkseq_core::midi::MidiOutputDevice;
use walkseq_core::persistence::{load_from_file, save_to_file};
use walkseq_core::Config;
use walkseq_engine::StepSequencer;

use args::{parse_args, Args, USAGE};

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("walkseq")
        .join("walkseq.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("walkseq.log")))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("walkseq: logging disabled, cannot create log file: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, simplelog::Config::default(), log_file).is_err() {
        eprintln!("walkseq: logger already initialized");
        return;
    }

    log::info!("walkseq starting (log level: {:?})", log_level);
}

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("walkseq: {}\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("walkseq: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    if args.list_ports {
        let mut device = MidiOutputDevice::new();
        device.refresh_ports();
        if device.list_ports().is_empty() {
            println!("no MIDI output ports");
        }
        for port in device.list_ports() {
            println!("{:>3}  {}", port.index, port.name);
        }
        return Ok(());
    }

    let config = Config::load();
    let mut seq = build_sequencer(args, &config)?;

    let sample_rate = config.sample_rate();
    let block_size = config.block_size();
    seq.prepare(sample_rate, block_size);

    let (feedback_tx, feedback_rx) = mpsc::channel();
    seq.subscribe(feedback_tx);
    seq.set_playing(true);

    match args.port.or(config.midi_port()) {
        Some(port) => {
            let mut device = MidiOutputDevice::new();
            device.connect(port)?;
            println!(
                "playing on '{}'",
                device.connected_port_name().unwrap_or("?")
            );
            render::play_live(
                &mut seq,
                &mut device,
                &feedback_rx,
                sample_rate,
                block_size,
                args.seconds(),
            )?;
            device.disconnect();
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let count = render::render_offline(
                &mut seq,
                sample_rate,
                block_size,
                args.seconds(),
                &mut out,
            )
            .and_then(|count| out.flush().map(|()| count))
            .map_err(|e| format!("write failed: {}", e))?;
            log::info!("rendered {} events", count);
        }
    }

    seq.unsubscribe();
    for event in feedback_rx.try_iter() {
        log::trace!(target: "feedback", "{:?}", event);
    }

    if let Some(path) = &args.save {
        save_to_file(path, seq.params(), seq.pattern())
            .map_err(|e| format!("cannot save {}: {}", path.display(), e))?;
    }

    Ok(())
}

/// Config defaults, then saved state, then command-line overrides.
fn build_sequencer(args: &Args, config: &Config) -> Result<StepSequencer, String> {
    let mut seq = match args.seed {
        Some(seed) => StepSequencer::with_seed(seed),
        None => StepSequencer::new(),
    };
    let defaults = config.sequencer_params();

    match &args.state {
        Some(path) => {
            let (params, pattern) = load_from_file(path)
                .map_err(|e| format!("cannot load {}: {}", path.display(), e))?;
            seq.restore(params, pattern);
            if let Some(kind) = args.pattern {
                seq.randomize(kind);
            }
        }
        None => {
            let pattern = *seq.pattern();
            seq.restore(defaults, pattern);
            seq.randomize(args.pattern.unwrap_or_else(|| config.pattern_kind()));
        }
    }

    if let Some(bpm) = args.bpm {
        seq.set_internal_bpm(bpm);
    }

    log::debug!(
        "sequencer: rate {} density {} offset {} root {} bpm {:.1}",
        seq.params().rate,
        seq.density(),
        seq.offset(),
        seq.root(),
        seq.internal_bpm()
    );
    Ok(seq)
}
