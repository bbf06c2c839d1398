use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bossfight_arena::control::RandomPolicy;
use bossfight_arena::episode::{
    EpisodeAnalysis, EpisodeRecord, PlaybackSpeed, ReplayPlayer, TrainingMetrics,
    load_records_dir, session_directory,
};
use bossfight_arena::infra::{ArenaObserver, CompositeObserver, DefaultObserver};
use bossfight_arena::{ArenaConfig, FlatArena, Simulation, scenario};
use dotenv::dotenv;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn get_env_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bossfight_arena=info,arena=info,warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

struct RunOptions {
    episodes: u32,
    seed: u64,
    records_dir: PathBuf,
    replay_file: Option<PathBuf>,
    playback_speed: PlaybackSpeed,
    realtime: bool,
}

impl RunOptions {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let playback_speed = match env::var("ARENA_PLAYBACK_SPEED") {
            Ok(value) => value.parse()?,
            Err(_) => PlaybackSpeed::NORMAL,
        };
        Ok(Self {
            episodes: get_env_var("ARENA_EPISODES").unwrap_or(10),
            seed: get_env_var("ARENA_SEED").unwrap_or(0),
            records_dir: env::var("ARENA_RECORDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("records")),
            replay_file: env::var("ARENA_REPLAY_FILE").ok().map(PathBuf::from),
            playback_speed,
            realtime: get_env_var("ARENA_REALTIME").unwrap_or(false),
        })
    }
}

async fn write_records(
    dir: &Path,
    sim: &mut Simulation<FlatArena>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = sim.recorder().config().format;
    for record in sim.recorder_mut().take_completed() {
        for (name, bytes) in record.encode_files(format)? {
            let path = dir.join(name);
            tokio::fs::write(&path, bytes).await?;
            tracing::debug!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn train(config: ArenaConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let session = session_directory(&options.records_dir);
    tokio::fs::create_dir_all(&session).await?;
    tracing::info!("Recording episodes to {}", session.display());

    let observers: Vec<Box<dyn ArenaObserver>> = vec![
        Box::new(DefaultObserver),
        Box::new(TrainingMetrics::new(100, 10)),
    ];
    let mut sim = Simulation::new(scenario::standard_arena(config))
        .with_observer(Box::new(CompositeObserver::new(observers)));
    let mut policy = RandomPolicy::new(options.seed);

    let mut interval = tokio::time::interval(Duration::from_secs_f32(sim.arena().clock.dt()));
    let mut finished = 0;
    while finished < options.episodes {
        if options.realtime {
            interval.tick().await;
        }
        let report = sim.tick(&mut policy);
        if report.outcome.is_some() {
            finished += 1;
            write_records(&session, &mut sim).await?;
        }
    }

    tracing::info!("Finished {} episodes", finished);
    Ok(())
}

async fn replay(config: ArenaConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let path = options
        .replay_file
        .as_deref()
        .ok_or("ARENA_REPLAY_FILE is required in replay mode")?;
    let mut player = ReplayPlayer::load(path)?;
    player.set_speed(options.playback_speed);
    let expected = player.record().win_condition;

    let mut sim = Simulation::new(scenario::standard_arena(config));
    sim.start_replay(player);

    let frame_dt = sim.arena().clock.dt();
    let mut interval = tokio::time::interval(Duration::from_secs_f32(frame_dt));
    let mut policy = RandomPolicy::new(options.seed);
    let mut outcome = None;
    let mut last_tick = tokio::time::Instant::now();
    loop {
        // Unpaced runs count simulated time so slow motion still progresses.
        let real_dt = if options.realtime {
            interval.tick().await;
            let now = tokio::time::Instant::now();
            let elapsed = now.duration_since(last_tick).as_secs_f32();
            last_tick = now;
            elapsed
        } else {
            frame_dt
        };
        let report = sim.tick_with_real_dt(&mut policy, real_dt);
        if report.outcome.is_some() {
            outcome = report.outcome;
        }
        if report.replay_finished {
            break;
        }
    }

    match outcome {
        Some(outcome) if outcome.win == expected => {
            tracing::info!("Replay reproduced the recorded result: {}", outcome.win)
        }
        Some(outcome) => tracing::warn!(
            "Replay ended with {} but the record says {}",
            outcome.win,
            expected
        ),
        None => tracing::warn!("Replay ended before the episode finished"),
    }
    Ok(())
}

fn analyze(options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut records: Vec<EpisodeRecord> = load_records_dir(&options.records_dir)?;
    // Sessions are written one directory below the records root.
    for entry in std::fs::read_dir(&options.records_dir)?.flatten() {
        if entry.path().is_dir() {
            records.extend(load_records_dir(&entry.path())?);
        }
    }
    EpisodeAnalysis::from_records(&records).log_summary();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = ArenaConfig::from_env();
    let options = RunOptions::from_env()?;
    let mode = env::var("ARENA_MODE").unwrap_or_else(|_| "train".to_string());
    tracing::info!("Mode: {}", mode);

    match mode.as_str() {
        "train" => train(config, &options).await?,
        "replay" => replay(config, &options).await?,
        "analyze" => analyze(&options)?,
        other => return Err(format!("unknown ARENA_MODE '{other}'").into()),
    }

    Ok(())
}
