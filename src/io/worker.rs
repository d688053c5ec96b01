// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background fetch workers.
//!
//! A fixed pool of threads pulls jobs from a shared channel and sends results
//! back as [`WorkerEvent`]s, which the UI drains once per frame. Every result
//! carries the epoch or ticket it was issued under; deciding whether it still
//! applies is left to the receiving state machine. Uploads get their own
//! thread so a large file never blocks tile traffic.

use super::backend::Backend;
use super::media::decode_tile;
use crate::error::ViewerError;
use crate::models::catalog::{Folder, FolderId, SlideSummary};
use crate::models::report::{Report, ReportId};
use crate::models::slide::{PyramidMetadata, SlideId};
use crate::report::list::ListRequest;
use crate::report::session::{PendingSave, Ticket};
use crate::viewer::controller::{MetadataRequest, TileRequest};
use crate::viewer::surface::{Epoch, TileCompletion};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Called after each event is sent, typically to request a repaint.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
pub enum Job {
    Metadata(MetadataRequest),
    Tile(TileRequest),
    Reports(ListRequest),
    SaveReport { slide: SlideId, pending: PendingSave },
    Folders,
    Slides { folder: Option<FolderId>, ticket: Ticket },
    CreateFolder(String),
    RenameFolder { id: FolderId, name: String },
}

#[derive(Debug)]
pub enum WorkerEvent {
    Metadata {
        epoch: Epoch,
        result: Result<PyramidMetadata, ViewerError>,
    },
    Tile(TileCompletion),
    Reports {
        ticket: Ticket,
        result: Result<Vec<Report>, ViewerError>,
    },
    Saved {
        slide: SlideId,
        pending: PendingSave,
        result: Result<ReportId, ViewerError>,
    },
    Folders(Result<Vec<Folder>, ViewerError>),
    Slides {
        ticket: Ticket,
        result: Result<Vec<SlideSummary>, ViewerError>,
    },
    FolderChanged(Result<(), ViewerError>),
    UploadProgress(u8),
    UploadFinished(Result<i64, ViewerError>),
}

pub struct Dispatcher {
    jobs: Option<Sender<Job>>,
    events_tx: Sender<WorkerEvent>,
    events: Receiver<WorkerEvent>,
    backend: Arc<dyn Backend>,
    live_epoch: Arc<AtomicU64>,
    stopping: Arc<AtomicBool>,
    notify: Notifier,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, workers: usize, notify: Notifier) -> Self {
        let (jobs_tx, jobs_rx) = channel::<Job>();
        let (events_tx, events) = channel();
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));
        let live_epoch = Arc::new(AtomicU64::new(0));
        let stopping = Arc::new(AtomicBool::new(false));

        let workers = (0..workers.max(1))
            .map(|index| {
                let jobs = Arc::clone(&jobs_rx);
                let events = events_tx.clone();
                let backend = Arc::clone(&backend);
                let live_epoch = Arc::clone(&live_epoch);
                let stopping = Arc::clone(&stopping);
                let notify = Arc::clone(&notify);
                std::thread::spawn(move || {
                    log::debug!("Fetch worker {} started", index);
                    loop {
                        let job = match jobs.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let Ok(job) = job else { break };
                        if stopping.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Some(event) = run_job(backend.as_ref(), &live_epoch, job) {
                            if events.send(event).is_err() {
                                break;
                            }
                            notify();
                        }
                    }
                    log::debug!("Fetch worker {} stopped", index);
                })
            })
            .collect();

        Self {
            jobs: Some(jobs_tx),
            events_tx,
            events,
            backend,
            live_epoch,
            stopping,
            notify,
            workers,
        }
    }

    /// Tile jobs issued under an older epoch are skipped once this is set.
    pub fn set_live_epoch(&self, epoch: Epoch) {
        self.live_epoch.store(epoch, Ordering::Relaxed);
    }

    pub fn submit(&self, job: Job) {
        if let Some(jobs) = &self.jobs {
            if jobs.send(job).is_err() {
                log::error!("Fetch workers are gone; job dropped");
            }
        }
    }

    /// Upload `path` on a dedicated thread, reporting progress as events.
    pub fn upload(&self, path: PathBuf, folder: Option<FolderId>) {
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        let notify = Arc::clone(&self.notify);
        std::thread::spawn(move || {
            log::info!("Uploading {}", path.display());
            let progress_events = events.clone();
            let progress_notify = Arc::clone(&notify);
            let progress = Box::new(move |percent: u8| {
                if percent % 25 == 0 {
                    log::info!("Upload {}%", percent);
                }
                let _ = progress_events.send(WorkerEvent::UploadProgress(percent));
                progress_notify();
            });
            let result = backend.upload_slide(&path, folder, progress);
            match &result {
                Ok(id) => log::info!("Uploaded {} as slide {}", path.display(), id),
                Err(e) => log::error!("{}", e),
            }
            let _ = events.send(WorkerEvent::UploadFinished(result));
            notify();
        });
    }

    /// Drain every event that has arrived so far.
    pub fn poll(&self) -> Vec<WorkerEvent> {
        self.events.try_iter().collect()
    }

    #[cfg(test)]
    fn wait(&self) -> WorkerEvent {
        self.events
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Queued jobs are abandoned; only a job already running is waited for
        self.stopping.store(true, Ordering::Relaxed);
        self.jobs = None;
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn run_job(backend: &dyn Backend, live_epoch: &AtomicU64, job: Job) -> Option<WorkerEvent> {
    let event = match job {
        Job::Metadata(request) => WorkerEvent::Metadata {
            epoch: request.epoch,
            result: backend.fetch_metadata(&request.slide),
        },
        Job::Tile(request) => {
            if request.epoch < live_epoch.load(Ordering::Relaxed) {
                log::debug!("Skipping tile {:?} from epoch {}", request.key, request.epoch);
                return None;
            }
            let result = backend.fetch_tile(&request.url).and_then(|bytes| decode_tile(&bytes));
            if let Err(e) = &result {
                log::debug!("Tile {:?} of {}: {}", request.key, request.slide, e);
            }
            WorkerEvent::Tile(TileCompletion {
                epoch: request.epoch,
                key: request.key,
                result,
            })
        }
        Job::Reports(request) => WorkerEvent::Reports {
            ticket: request.ticket,
            result: backend.list_reports(&request.slide),
        },
        Job::SaveReport { slide, pending } => {
            let result = backend.save_report(&slide, &pending.request);
            WorkerEvent::Saved { slide, pending, result }
        }
        Job::Folders => WorkerEvent::Folders(backend.list_folders()),
        Job::Slides { folder, ticket } => WorkerEvent::Slides {
            ticket,
            result: backend.list_slides(folder),
        },
        Job::CreateFolder(name) => WorkerEvent::FolderChanged(backend.create_folder(&name).map(|_| ())),
        Job::RenameFolder { id, name } => WorkerEvent::FolderChanged(backend.rename_folder(id, &name)),
    };
    Some(event)
}
