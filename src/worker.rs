//! Run extraction on a dedicated background thread.
//!
//! The worker is an ordinary value: the caller spawns it, submits jobs and
//! terminates it (or drops it). Jobs own their pixel buffers, and the thread
//! calls the same pure functions as a direct [`crate::extract_palette`] call,
//! so results do not depend on where they were computed.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::banner::{BannerColors, derive_banner_colors};
use crate::config::{BannerOptions, PaletteOptions};
use crate::error::{PaletteError, Result};
use crate::loader::RgbaBuffer;
use crate::ranking::ExtractedColor;

/// One unit of work for the worker.
#[derive(Clone, Debug)]
pub struct PaletteJob {
    pub buffer: RgbaBuffer,
    pub palette: PaletteOptions,
    /// Also derive banner colors when set.
    pub banner: Option<BannerOptions>,
    /// Fixed seed for k-means++; entropy when `None`.
    pub seed: Option<u64>,
}

impl PaletteJob {
    pub fn new(buffer: RgbaBuffer) -> Self {
        Self {
            buffer,
            palette: PaletteOptions::default(),
            banner: None,
            seed: None,
        }
    }

    pub fn with_palette_options(mut self, options: PaletteOptions) -> Self {
        self.palette = options;
        self
    }

    pub fn with_banner(mut self, options: BannerOptions) -> Self {
        self.banner = Some(options);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn run(&self) -> Result<PaletteJobOutput> {
        let buf = &self.buffer;
        let palette = match self.seed {
            Some(seed) => crate::extract_palette_with_rng(
                &buf.pixels,
                buf.width,
                buf.height,
                &self.palette,
                &mut StdRng::seed_from_u64(seed),
            )?,
            None => crate::extract_palette(&buf.pixels, buf.width, buf.height, &self.palette)?,
        };
        let banner = match &self.banner {
            Some(options) => Some(derive_banner_colors(&palette, options)?),
            None => None,
        };
        Ok(PaletteJobOutput { palette, banner })
    }
}

/// What a finished job produced.
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteJobOutput {
    pub palette: Vec<ExtractedColor>,
    pub banner: Option<BannerColors>,
}

type Envelope = (PaletteJob, mpsc::Sender<Result<PaletteJobOutput>>);

/// Handle to a job in flight.
#[derive(Debug)]
pub struct PendingPalette {
    rx: mpsc::Receiver<Result<PaletteJobOutput>>,
}

impl PendingPalette {
    /// Block until the job finishes.
    pub fn wait(self) -> Result<PaletteJobOutput> {
        self.rx.recv().map_err(|_| PaletteError::WorkerUnavailable)?
    }

    /// The result if the job has already finished.
    pub fn try_wait(&self) -> Option<Result<PaletteJobOutput>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(PaletteError::WorkerUnavailable)),
        }
    }
}

/// A background thread processing [`PaletteJob`]s in submission order.
#[derive(Debug)]
pub struct PaletteWorker {
    sender: Option<mpsc::Sender<Envelope>>,
    handle: Option<JoinHandle<()>>,
}

impl PaletteWorker {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Envelope>();
        let handle = thread::Builder::new()
            .name("palette-worker".into())
            .spawn(move || {
                for (job, reply) in receiver {
                    // The caller may have dropped its PendingPalette.
                    let _ = reply.send(job.run());
                }
                debug!("palette worker queue closed");
            })
            .map_err(|e| {
                warn!("failed to spawn palette worker: {}", e);
                PaletteError::WorkerUnavailable
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a job.
    pub fn submit(&self, job: PaletteJob) -> Result<PendingPalette> {
        let sender = self.sender.as_ref().ok_or(PaletteError::WorkerUnavailable)?;
        let (reply, rx) = mpsc::channel();
        sender
            .send((job, reply))
            .map_err(|_| PaletteError::WorkerUnavailable)?;
        Ok(PendingPalette { rx })
    }

    /// Queue a job and wait for it.
    pub fn run(&self, job: PaletteJob) -> Result<PaletteJobOutput> {
        self.submit(job)?.wait()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Finish queued jobs, then stop the thread.
    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("palette worker panicked");
            }
        }
    }
}

impl Drop for PaletteWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
