//! Parallel world bake across a pool of worker threads.
//!
//! Every `(chunk, view mode)` pair is one job. Workers each own a
//! [`ChunkBaker`] and share only the world overview, the set of claimed
//! digests and the cancellation flags. The first worker to claim a digest
//! writes its tile; everyone else only reports the digest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use dashmap::DashSet;
use tessera_config::{ViewMode, WorldSettings};
use tessera_worldgen::{WorldGenerator, WorldOverview};

use crate::chunk::{ChunkBaker, ChunkCoord};
use crate::error::{BakeError, io_at};
use crate::manifest::{CHUNKS_DIR, GENERATION_CONFIG_FILE, MANIFEST_FILE, Manifest};
use crate::tile::{Tier, content_digest, write_tile};

/// Shared stop flag. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Workers to use when none is configured: every core but one.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

#[derive(Clone, Debug)]
pub struct BakeOptions {
    pub output_dir: PathBuf,
    pub view_modes: Vec<ViewMode>,
    /// `None` uses [`default_worker_count`].
    pub workers: Option<usize>,
    pub cancel: CancelToken,
}

impl BakeOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            view_modes: ViewMode::ALL.to_vec(),
            workers: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count).max(1)
    }
}

/// Outcome of one job.
#[derive(Clone, Debug)]
pub struct JobSummary {
    pub coord: ChunkCoord,
    pub view_mode: ViewMode,
    pub digest: String,
    /// The tier written, if this job claimed the digest.
    pub saved: Option<Tier>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeReport {
    pub total: u64,
    pub unique_saved: u64,
}

#[derive(Clone, Debug, Default)]
pub struct BakeReport {
    pub output_dir: PathBuf,
    pub total_jobs: u64,
    pub unique_saved: u64,
    pub uniform: u64,
    pub palettized: u64,
    pub full: u64,
    pub per_mode: BTreeMap<ViewMode, ModeReport>,
    pub elapsed: Duration,
}

impl BakeReport {
    fn record(&mut self, summary: &JobSummary) {
        self.total_jobs += 1;
        let mode = self.per_mode.entry(summary.view_mode).or_default();
        mode.total += 1;
        if let Some(tier) = summary.saved {
            mode.unique_saved += 1;
            self.unique_saved += 1;
            match tier {
                Tier::Uniform => self.uniform += 1,
                Tier::Palettized => self.palettized += 1,
                Tier::Full => self.full += 1,
            }
        }
    }

    /// Share of jobs that needed their own file, in percent.
    pub fn unique_ratio(&self) -> f64 {
        if self.total_jobs == 0 {
            0.0
        } else {
            self.unique_saved as f64 / self.total_jobs as f64 * 100.0
        }
    }
}

type JobResult = Result<JobSummary, BakeError>;

fn run_job(
    baker: &ChunkBaker,
    claimed: &DashSet<String>,
    chunks_dir: &Path,
    coord: ChunkCoord,
    view_mode: ViewMode,
) -> JobResult {
    let attempt = || -> Result<JobSummary, BakeError> {
        let image = baker.bake_chunk(coord, view_mode)?;
        let digest = content_digest(&image);
        let saved = if claimed.insert(digest.clone()) {
            Some(write_tile(chunks_dir, &digest, &image)?)
        } else {
            None
        };
        Ok(JobSummary {
            coord,
            view_mode,
            digest,
            saved,
        })
    };
    attempt().map_err(|source| BakeError::Job {
        coord,
        view_mode,
        source: Box::new(source),
    })
}

struct WorkerShared {
    settings: WorldSettings,
    overview: Arc<WorldOverview>,
    claimed: Arc<DashSet<String>>,
    chunks_dir: PathBuf,
    cancel: CancelToken,
    abort: CancelToken,
}

fn spawn_worker(
    index: usize,
    shared: &WorkerShared,
    jobs: Receiver<(ChunkCoord, ViewMode)>,
    results: Sender<JobResult>,
) -> Result<JoinHandle<()>, BakeError> {
    let settings = shared.settings.clone();
    let overview = Arc::clone(&shared.overview);
    let claimed = Arc::clone(&shared.claimed);
    let chunks_dir = shared.chunks_dir.clone();
    let cancel = shared.cancel.clone();
    let abort = shared.abort.clone();

    std::thread::Builder::new()
        .name(format!("bake-worker-{index}"))
        .spawn(move || {
            let baker = ChunkBaker::new(&settings, overview);
            while let Ok((coord, view_mode)) = jobs.recv() {
                if cancel.is_cancelled() || abort.is_cancelled() {
                    break;
                }
                let result = run_job(&baker, &claimed, &chunks_dir, coord, view_mode);
                let failed = result.is_err();
                if results.send(result).is_err() || failed {
                    break;
                }
            }
        })
        .map_err(BakeError::Spawn)
}

/// Bake every chunk of every requested view mode into `options.output_dir`.
///
/// Writes `chunks/<digest>.png`, then `generation_config.json` and finally
/// `manifest.json`. A failed or cancelled bake never writes the manifest.
pub fn bake_world(settings: &WorldSettings, options: &BakeOptions) -> Result<BakeReport, BakeError> {
    let started = Instant::now();
    let root = &options.output_dir;
    let chunks_dir = root.join(CHUNKS_DIR);
    fs::create_dir_all(&chunks_dir).map_err(io_at(&chunks_dir))?;

    let coords: Vec<ChunkCoord> =
        ChunkCoord::all(settings.world_width_chunks, settings.world_height_chunks).collect();
    let per_mode_total = coords.len() as u64;
    let total_jobs = per_mode_total * options.view_modes.len() as u64;
    let worker_count = options.worker_count().min(total_jobs.max(1) as usize);

    tracing::info!(
        "Baking {}x{} chunks at {} px for {} view modes ({} jobs) into {} with {} workers",
        settings.world_width_chunks,
        settings.world_height_chunks,
        settings.chunk_resolution,
        options.view_modes.len(),
        total_jobs,
        root.display(),
        worker_count
    );

    let overview = Arc::new(WorldOverview::compute(&WorldGenerator::new(settings))?);

    let (job_tx, job_rx) = unbounded();
    for &mode in &options.view_modes {
        for &coord in &coords {
            // The receiver is alive until the workers are spawned below.
            let _ = job_tx.send((coord, mode));
        }
    }
    drop(job_tx);

    let shared = WorkerShared {
        settings: settings.clone(),
        overview,
        claimed: Arc::new(DashSet::new()),
        chunks_dir,
        cancel: options.cancel.clone(),
        abort: CancelToken::new(),
    };
    let (result_tx, result_rx) = unbounded();
    let mut handles = Vec::with_capacity(worker_count);
    for index in 0..worker_count {
        match spawn_worker(index, &shared, job_rx.clone(), result_tx.clone()) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                shared.abort.cancel();
                drop(job_rx);
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(e);
            }
        }
    }
    drop(job_rx);
    drop(result_tx);

    let mut manifest = Manifest::new(settings);
    let mut report = BakeReport {
        output_dir: root.clone(),
        ..Default::default()
    };
    let progress_step = (per_mode_total / 10).max(1);
    let mut failure: Option<BakeError> = None;

    for result in result_rx.iter() {
        match result {
            Ok(summary) => {
                report.record(&summary);
                let done = report.per_mode[&summary.view_mode].total;
                if done % progress_step == 0 || done == per_mode_total {
                    tracing::info!(
                        "[{}] {}/{} chunks baked",
                        summary.view_mode,
                        done,
                        per_mode_total
                    );
                }
                manifest.insert(summary.view_mode, summary.coord, summary.digest);
            }
            Err(e) => {
                if failure.is_none() {
                    tracing::error!("{e}");
                    shared.abort.cancel();
                    failure = Some(e);
                }
            }
        }
    }

    for handle in handles {
        if handle.join().is_err() && failure.is_none() {
            failure = Some(BakeError::WorkerPanic);
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }
    if options.cancel.is_cancelled() || report.total_jobs != total_jobs {
        tracing::warn!(
            "Bake cancelled after {}/{} jobs; manifest not written",
            report.total_jobs,
            total_jobs
        );
        return Err(BakeError::Cancelled);
    }

    settings.save(&root.join(GENERATION_CONFIG_FILE))?;
    manifest.save(&root.join(MANIFEST_FILE))?;
    report.elapsed = started.elapsed();

    tracing::info!("Bake complete in {:.2?}", report.elapsed);
    tracing::info!("Total chunk views:  {}", report.total_jobs);
    tracing::info!(
        "Unique tiles saved: {} ({:.2}% of total)",
        report.unique_saved,
        report.unique_ratio()
    );
    tracing::info!(
        "Tiers: {} uniform, {} palettized, {} full",
        report.uniform,
        report.palettized,
        report.full
    );
    Ok(report)
}
