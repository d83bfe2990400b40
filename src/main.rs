use std::{panic, process};

use castpipe::capture::TestPatternCapture;
use castpipe::config::{PipelineConfig, app_name, app_version};
use castpipe::encoder::open_encoder;
use castpipe::error::{PipelineError, StageKind};
use castpipe::sink::open_sink;
use castpipe::{SenderCoordinator, SignalOfStop};
use clap::{Arg, ArgMatches, Command, value_parser};
use log::{error, info};

fn main() {
    tracing_subscriber::fmt::init();

    let matches = Command::new(app_name())
        .version(app_version())
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("JSON pipeline configuration. Missing fields keep their defaults.")
                .required(false),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("N")
                .help("Stop after N frames instead of running until Ctrl-C.")
                .value_parser(value_parser!(u64))
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DEST")
                .help("Destination: tcp://host:port, file://path or a plain file path.")
                .required(false),
        )
        .arg(
            Arg::new("codec")
                .long("codec")
                .value_name("NAME")
                .help("Encoder to use (\"raw\", or an FFmpeg codec name with the ffmpeg feature).")
                .required(false),
        )
        .get_matches();

    // kill the main thread as soon as a stage thread panics
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(105);
    }));

    if let Err(e) = run(&matches) {
        error!("{}", e);
        process::exit(1);
    }
}

fn load_config(matches: &ArgMatches) -> Result<PipelineConfig, PipelineError> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(frames) = matches.get_one::<u64>("frames") {
        config.capture.frame_limit = Some(*frames);
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.sink.destination = output.clone();
    }
    if let Some(codec) = matches.get_one::<String>("codec") {
        config.encoder.codec = codec.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<(), PipelineError> {
    let config = load_config(matches)?;

    let transformer = open_encoder(&config.encoder).map_err(|source| PipelineError::Initialization {
        stage: StageKind::Encode,
        source,
    })?;
    let sink = open_sink(&config.sink).map_err(|source| PipelineError::Initialization {
        stage: StageKind::Transmit,
        source,
    })?;

    let sos = SignalOfStop::new();
    let mut pipeline = SenderCoordinator::new(
        Box::new(TestPatternCapture::new()),
        transformer,
        sink,
        sos.clone(),
    );

    // gracefully drain the pipeline when receiving SIGINT, SIGTERM, or SIGHUP
    let handler_sos = sos.clone();
    ctrlc::set_handler(move || {
        info!("Stop requested, draining pipeline");
        handler_sos.cancel();
    })
    .map_err(|e| std::io::Error::other(format!("cannot install Ctrl-C handler: {}", e)))?;

    info!(
        "{} {}: {} {}x{} → {}",
        app_name(),
        app_version(),
        config.encoder.codec,
        config.encoder.width,
        config.encoder.height,
        config.sink.destination
    );

    pipeline.start(&config)?;
    pipeline.wait()
}
