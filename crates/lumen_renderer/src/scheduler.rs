//! Row-parallel render scheduling.
//!
//! The image is split into one job per row. Jobs are dealt round-robin into
//! one lane per worker of a fixed rayon pool; each lane renders its rows in
//! order and streams them back over a channel. The [`RenderHandle`] places
//! rows by index, so completion order never affects the final image.

use crate::renderer::{render_row, PixelBuffer};
use crate::{HittableList, RenderError, RenderResult, Viewport};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Pool size used when hardware parallelism cannot be queried.
pub const FALLBACK_WORKERS: usize = 4;

/// Everything needed to render one row, independent of any other job.
#[derive(Debug, Clone)]
pub struct RowJob {
    pub row: u32,
    pub viewport: Viewport,
    pub world: Arc<HittableList>,
    /// Render seed; combined with `row` to pick the row's random stream
    pub seed: u64,
}

/// A finished row, tagged with its index.
#[derive(Debug, Clone)]
pub struct RowResult {
    pub row: u32,
    /// RGBA8 bytes for the full row
    pub pixels: Vec<u8>,
}

/// How many rows of a render have arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub completed: u32,
    pub total: u32,
}

impl RenderProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Deal jobs into `lanes` lanes: job i goes to lane i % lanes.
pub fn distribute_round_robin(jobs: Vec<RowJob>, lanes: usize) -> Vec<Vec<RowJob>> {
    let lanes = lanes.max(1);
    let mut out: Vec<Vec<RowJob>> = (0..lanes)
        .map(|_| Vec::with_capacity(jobs.len() / lanes + 1))
        .collect();
    for (i, job) in jobs.into_iter().enumerate() {
        out[i % lanes].push(job);
    }
    out
}

/// Fixed pool of render workers.
///
/// Starting a render cancels whatever render this scheduler was running
/// before; superseded rows are dropped, not merged.
pub struct RenderScheduler {
    pool: ThreadPool,
    workers: usize,
    active: Mutex<Option<Arc<AtomicBool>>>,
}

impl RenderScheduler {
    /// Create a scheduler with exactly `workers` threads (at least one).
    pub fn new(workers: usize) -> RenderResult<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lumen-render-{i}"))
            .panic_handler(|_| {
                log::error!("Render worker panicked; the rest of its lane is lost");
            })
            .build()?;

        log::debug!("Render pool started with {workers} workers");

        Ok(Self {
            pool,
            workers,
            active: Mutex::new(None),
        })
    }

    /// Create a scheduler sized to the available hardware parallelism.
    pub fn with_available_parallelism() -> RenderResult<Self> {
        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(FALLBACK_WORKERS);
        Self::new(workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Dispatch row jobs rendering into a buffer shaped by `viewport`.
    ///
    /// The render is complete only once every row of `viewport` has arrived.
    /// Rows the jobs do not cover surface as [`RenderError::RowsLost`].
    pub fn submit(&self, viewport: Viewport, jobs: Vec<RowJob>) -> RenderHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        self.replace_active(Some(Arc::clone(&cancel)));

        log::info!(
            "Rendering {}x{} ({} jobs) on {} workers",
            viewport.image_width,
            viewport.image_height,
            jobs.len(),
            self.workers
        );
        if jobs.len() != viewport.image_height as usize {
            log::warn!(
                "{} jobs submitted for an image {} rows tall",
                jobs.len(),
                viewport.image_height
            );
        }

        let (tx, rx) = channel();
        for (lane, rows) in distribute_round_robin(jobs, self.workers)
            .into_iter()
            .enumerate()
            .filter(|(_, rows)| !rows.is_empty())
        {
            let tx = tx.clone();
            let cancel = Arc::clone(&cancel);
            self.pool.spawn(move || run_lane(lane, rows, &tx, &cancel));
        }

        RenderHandle::new(&viewport, rx, cancel)
    }

    /// Cancel the render most recently submitted, if any.
    pub fn cancel_active(&self) {
        self.replace_active(None);
    }

    fn replace_active(&self, next: Option<Arc<AtomicBool>>) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *active, next) {
            if !previous.swap(true, Ordering::SeqCst) {
                log::debug!("Cancelled superseded render");
            }
        }
    }
}

fn run_lane(lane: usize, jobs: Vec<RowJob>, tx: &Sender<RowResult>, cancel: &AtomicBool) {
    log::debug!("Lane {lane}: {} rows", jobs.len());

    for job in jobs {
        if cancel.load(Ordering::SeqCst) {
            log::debug!("Lane {lane}: cancelled before row {}", job.row);
            return;
        }

        let pixels = render_row(&job);
        log::trace!("Lane {lane}: row {} done", job.row);

        if tx.send(RowResult { row: job.row, pixels }).is_err() {
            log::debug!("Lane {lane}: receiver dropped, stopping");
            return;
        }
    }
}

/// Receiving end of a running render.
///
/// Owns the output buffer. Rows can be consumed one at a time with
/// [`next_row`](Self::next_row) for progressive display, or all at once with
/// [`wait`](Self::wait), which only returns a buffer once every row is in.
pub struct RenderHandle {
    rx: Receiver<RowResult>,
    cancel: Arc<AtomicBool>,
    image: PixelBuffer,
    received: Vec<bool>,
    completed: u32,
    total: u32,
}

impl RenderHandle {
    fn new(viewport: &Viewport, rx: Receiver<RowResult>, cancel: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            cancel,
            image: PixelBuffer::new(viewport.image_width, viewport.image_height),
            received: vec![false; viewport.image_height as usize],
            completed: 0,
            total: viewport.image_height,
        }
    }

    pub fn progress(&self) -> RenderProgress {
        RenderProgress {
            completed: self.completed,
            total: self.total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    /// The buffer as rendered so far. Rows not yet delivered are zeroed.
    pub fn preview(&self) -> &PixelBuffer {
        &self.image
    }

    /// Stop dispatching further rows. Rows already in flight still finish.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Wait for the next row and write it into the buffer.
    ///
    /// Returns the row index, or `None` once the render is complete. A
    /// timeout yields [`RenderError::Stalled`] and leaves the handle usable.
    pub fn next_row(&mut self, timeout: Option<Duration>) -> RenderResult<Option<u32>> {
        loop {
            if self.is_complete() {
                return Ok(None);
            }

            let received = match timeout {
                Some(timeout) => self.rx.recv_timeout(timeout),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            let result = match received {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(RenderError::Stalled {
                        timeout: timeout.unwrap_or_default(),
                        completed: self.completed,
                        total: self.total,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => return Err(self.disconnected()),
            };

            if self.place(result.row, &result.pixels) {
                return Ok(Some(result.row));
            }
        }
    }

    /// Block until every row has arrived and return the finished buffer.
    ///
    /// `timeout` bounds the wait for each individual row.
    pub fn wait(mut self, timeout: Option<Duration>) -> RenderResult<PixelBuffer> {
        while self.next_row(timeout)?.is_some() {}
        log::info!("Render complete: {} rows", self.total);
        Ok(self.image)
    }

    /// Iterate over rows as they arrive.
    pub fn rows(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Iterator<Item = RenderResult<u32>> + '_ {
        std::iter::from_fn(move || self.next_row(timeout).transpose())
    }

    fn place(&mut self, row: u32, pixels: &[u8]) -> bool {
        let Some(seen) = self.received.get_mut(row as usize) else {
            log::warn!("Ignoring row {row}: outside the image");
            return false;
        };
        if *seen {
            log::warn!("Ignoring duplicate delivery of row {row}");
            return false;
        }
        if !self.image.write_row(row, pixels) {
            log::warn!("Ignoring row {row}: expected {} bytes, got {}", self.image.stride(), pixels.len());
            return false;
        }

        *seen = true;
        self.completed += 1;
        true
    }

    fn disconnected(&self) -> RenderError {
        let completed = self.completed;
        let total = self.total;
        if self.cancel.load(Ordering::SeqCst) {
            log::warn!("Render cancelled with {completed}/{total} rows");
            RenderError::Cancelled { completed, total }
        } else {
            log::error!("Render workers exited with {completed}/{total} rows");
            RenderError::RowsLost {
                missing: total - completed,
                total,
            }
        }
    }
}
