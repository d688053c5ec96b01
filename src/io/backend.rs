// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Backend collaborators.
//!
//! The viewer, the report session and the catalog panels talk to the slide
//! server through the traits below. [`HttpBackend`] implements them with a
//! blocking `reqwest` client and is only ever called from worker threads.
//! The endpoint is injected at construction.

use crate::error::ViewerError;
use crate::models::catalog::{Folder, FolderId, FolderRequest, SlideSummary, UploadResponse};
use crate::models::report::{Report, ReportId, SaveReportRequest, SaveReportResponse};
use crate::models::slide::{PyramidMetadata, SlideId, SlideInfo};
use reqwest::blocking::{multipart, Client};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

/// Upload progress callback, called with whole percentages.
pub type ProgressFn = Box<dyn FnMut(u8) + Send>;

/// Slide metadata and tiles.
pub trait SlideSource: Send + Sync {
    fn fetch_metadata(&self, slide: &SlideId) -> Result<PyramidMetadata, ViewerError>;

    /// Fetch raw tile bytes from a URL built by the tile addressing scheme.
    fn fetch_tile(&self, url: &str) -> Result<Vec<u8>, ViewerError>;
}

/// Per-slide report records.
pub trait ReportStore: Send + Sync {
    fn list_reports(&self, slide: &SlideId) -> Result<Vec<Report>, ViewerError>;

    /// Create (no id) or update (id present) a report; returns its id.
    fn save_report(&self, slide: &SlideId, request: &SaveReportRequest) -> Result<ReportId, ViewerError>;
}

/// Folder and slide catalog plus upload.
pub trait Catalog: Send + Sync {
    fn list_folders(&self) -> Result<Vec<Folder>, ViewerError>;
    fn create_folder(&self, name: &str) -> Result<FolderId, ViewerError>;
    fn rename_folder(&self, id: FolderId, name: &str) -> Result<(), ViewerError>;
    fn list_slides(&self, folder: Option<FolderId>) -> Result<Vec<SlideSummary>, ViewerError>;
    fn upload_slide(&self, path: &Path, folder: Option<FolderId>, progress: ProgressFn) -> Result<i64, ViewerError>;
}

/// Everything the application needs from the server.
pub trait Backend: SlideSource + ReportStore + Catalog {}

impl<T: SlideSource + ReportStore + Catalog> Backend for T {}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

#[derive(serde::Deserialize)]
struct CreatedFolder {
    id: FolderId,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> reqwest::Result<T> {
        self.client.get(url).send()?.error_for_status()?.json()
    }
}

impl SlideSource for HttpBackend {
    fn fetch_metadata(&self, slide: &SlideId) -> Result<PyramidMetadata, ViewerError> {
        let info: SlideInfo = self
            .get_json(&self.url(&format!("/info/{}", slide)))
            .map_err(|e| ViewerError::metadata(slide, e))?;
        info.into_metadata(slide)
    }

    fn fetch_tile(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
        // Error statuses and transport failures are treated alike
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| ViewerError::TileUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl ReportStore for HttpBackend {
    fn list_reports(&self, slide: &SlideId) -> Result<Vec<Report>, ViewerError> {
        self.get_json(&self.url(&format!("/report/{}", slide)))
            .map_err(|e| ViewerError::ReportsUnavailable(e.to_string()))
    }

    fn save_report(&self, slide: &SlideId, request: &SaveReportRequest) -> Result<ReportId, ViewerError> {
        let response: SaveReportResponse = self
            .client
            .post(self.url(&format!("/report/{}", slide)))
            .json(request)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| ViewerError::ReportSaveFailed(e.to_string()))?;
        Ok(response.id)
    }
}

impl Catalog for HttpBackend {
    fn list_folders(&self) -> Result<Vec<Folder>, ViewerError> {
        self.get_json(&self.url("/folders"))
            .map_err(|e| ViewerError::CatalogUnavailable(e.to_string()))
    }

    fn create_folder(&self, name: &str) -> Result<FolderId, ViewerError> {
        let created: CreatedFolder = self
            .client
            .post(self.url("/folders"))
            .json(&FolderRequest { name: name.to_string() })
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| ViewerError::CatalogUnavailable(e.to_string()))?;
        Ok(created.id)
    }

    fn rename_folder(&self, id: FolderId, name: &str) -> Result<(), ViewerError> {
        self.client
            .put(self.url(&format!("/folders/{}", id.0)))
            .json(&FolderRequest { name: name.to_string() })
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ViewerError::CatalogUnavailable(e.to_string()))?;
        Ok(())
    }

    fn list_slides(&self, folder: Option<FolderId>) -> Result<Vec<SlideSummary>, ViewerError> {
        let url = match folder {
            Some(id) => self.url(&format!("/slides?folder_id={}", id.0)),
            None => self.url("/slides"),
        };
        self.get_json(&url)
            .map_err(|e| ViewerError::CatalogUnavailable(e.to_string()))
    }

    fn upload_slide(&self, path: &Path, folder: Option<FolderId>, progress: ProgressFn) -> Result<i64, ViewerError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ViewerError::UploadFailed(format!("{}: {}", path.display(), e)))?;
        let total = file
            .metadata()
            .map_err(|e| ViewerError::UploadFailed(e.to_string()))?
            .len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "slide".to_string());

        let part = multipart::Part::reader_with_length(ProgressReader::new(file, total, progress), total)
            .file_name(file_name);
        let form = multipart::Form::new()
            .part("file", part)
            .text("folder_id", folder.map(|f| f.0.to_string()).unwrap_or_default());

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .map_err(|e| ViewerError::UploadFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::UploadFailed(format!("server returned {}", status)));
        }
        let body: UploadResponse = response
            .json()
            .map_err(|e| ViewerError::UploadFailed(e.to_string()))?;
        Ok(body.slide_id)
    }
}

/// Reader adapter reporting how much of the body has been streamed.
pub struct ProgressReader<R> {
    inner: R,
    total: u64,
    sent: u64,
    last: Option<u8>,
    progress: ProgressFn,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, progress: ProgressFn) -> Self {
        Self {
            inner,
            total,
            sent: 0,
            last: None,
            progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sent += n as u64;
        let percent = if self.total == 0 {
            100
        } else {
            (self.sent.min(self.total) * 100 / self.total) as u8
        };
        if self.last != Some(percent) {
            self.last = Some(percent);
            (self.progress)(percent);
        }
        Ok(n)
    }
}

/// In-memory backend for tests.
#[cfg(test)]
pub mod memory {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        metadata: HashMap<SlideId, PyramidMetadata>,
        reports: HashMap<SlideId, Vec<Report>>,
        saves: Vec<(SlideId, SaveReportRequest)>,
        next_id: i64,
        ticks: i64,
        fail_saves: bool,
        tile_delay: Option<std::time::Duration>,
        folders: Vec<Folder>,
        slides: Vec<SlideSummary>,
    }

    /// Records every save; timestamps advance one second per write.
    #[derive(Default)]
    pub struct MemoryBackend {
        state: Mutex<State>,
    }

    impl MemoryBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_slide(self, slide: &str, metadata: PyramidMetadata) -> Self {
            self.state.lock().unwrap().metadata.insert(SlideId::new(slide), metadata);
            self
        }

        pub fn with_report(self, slide: &str, id: i64, title: &str, content: &str, updated_at: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                let stamp = crate::models::timestamp::parse(updated_at).unwrap();
                state.reports.entry(SlideId::new(slide)).or_default().push(Report {
                    id: ReportId(id),
                    title: title.to_string(),
                    content: content.to_string(),
                    created_at: Some(stamp),
                    updated_at: Some(stamp),
                });
                state.next_id = state.next_id.max(id);
            }
            self
        }

        pub fn with_slide_row(self, id: i64, filename: &str, folder: Option<FolderId>) -> Self {
            self.state.lock().unwrap().slides.push(SlideSummary {
                id,
                filename: filename.to_string(),
                created_at: None,
                folder_id: folder,
                folder_name: None,
            });
            self
        }

        /// Every tile fetch sleeps for `delay` before failing.
        pub fn with_tile_delay(self, delay: std::time::Duration) -> Self {
            self.state.lock().unwrap().tile_delay = Some(delay);
            self
        }

        pub fn set_fail_saves(&self, fail: bool) {
            self.state.lock().unwrap().fail_saves = fail;
        }

        pub fn saves(&self) -> Vec<(SlideId, SaveReportRequest)> {
            self.state.lock().unwrap().saves.clone()
        }

        pub fn report(&self, slide: &str, id: i64) -> Option<Report> {
            let state = self.state.lock().unwrap();
            state
                .reports
                .get(&SlideId::new(slide))?
                .iter()
                .find(|r| r.id == ReportId(id))
                .cloned()
        }

        fn now(state: &mut State) -> DateTime<Utc> {
            state.ticks += 1;
            let base = crate::models::timestamp::parse("2024-06-01T00:00:00Z").unwrap();
            base + Duration::seconds(state.ticks)
        }
    }

    impl SlideSource for MemoryBackend {
        fn fetch_metadata(&self, slide: &SlideId) -> Result<PyramidMetadata, ViewerError> {
            self.state
                .lock()
                .unwrap()
                .metadata
                .get(slide)
                .copied()
                .ok_or_else(|| ViewerError::metadata(slide, "404 Not Found"))
        }

        fn fetch_tile(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
            let delay = self.state.lock().unwrap().tile_delay;
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            Err(ViewerError::TileUnavailable(format!("no tile at {}", url)))
        }
    }

    impl ReportStore for MemoryBackend {
        fn list_reports(&self, slide: &SlideId) -> Result<Vec<Report>, ViewerError> {
            Ok(self.state.lock().unwrap().reports.get(slide).cloned().unwrap_or_default())
        }

        fn save_report(&self, slide: &SlideId, request: &SaveReportRequest) -> Result<ReportId, ViewerError> {
            let mut state = self.state.lock().unwrap();
            state.saves.push((slide.clone(), request.clone()));
            if state.fail_saves {
                return Err(ViewerError::ReportSaveFailed("connection refused".to_string()));
            }
            let now = Self::now(&mut state);
            match request.id {
                Some(id) => {
                    let report = state
                        .reports
                        .get_mut(slide)
                        .and_then(|list| list.iter_mut().find(|r| r.id == id))
                        .ok_or_else(|| ViewerError::ReportSaveFailed("404 Not Found".to_string()))?;
                    report.title = request.title.clone();
                    report.content = request.content.clone();
                    report.updated_at = Some(now);
                    Ok(id)
                }
                None => {
                    state.next_id += 1;
                    let id = ReportId(state.next_id);
                    state.reports.entry(slide.clone()).or_default().push(Report {
                        id,
                        title: request.title.clone(),
                        content: request.content.clone(),
                        created_at: Some(now),
                        updated_at: Some(now),
                    });
                    Ok(id)
                }
            }
        }
    }

    impl Catalog for MemoryBackend {
        fn list_folders(&self) -> Result<Vec<Folder>, ViewerError> {
            Ok(self.state.lock().unwrap().folders.clone())
        }

        fn create_folder(&self, name: &str) -> Result<FolderId, ViewerError> {
            let mut state = self.state.lock().unwrap();
            let id = FolderId(state.folders.len() as i64 + 1);
            state.folders.push(Folder {
                id,
                name: name.to_string(),
                created_at: None,
                updated_at: None,
                slide_count: 0,
            });
            Ok(id)
        }

        fn rename_folder(&self, id: FolderId, name: &str) -> Result<(), ViewerError> {
            let mut state = self.state.lock().unwrap();
            let folder = state
                .folders
                .iter_mut()
                .find(|f| f.id == id)
                .ok_or_else(|| ViewerError::CatalogUnavailable("not found".to_string()))?;
            folder.name = name.to_string();
            Ok(())
        }

        fn list_slides(&self, folder: Option<FolderId>) -> Result<Vec<SlideSummary>, ViewerError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .slides
                .iter()
                .filter(|s| folder.is_none() || s.folder_id == folder)
                .cloned()
                .collect())
        }

        fn upload_slide(&self, _path: &Path, _folder: Option<FolderId>, mut progress: ProgressFn) -> Result<i64, ViewerError> {
            progress(100);
            Err(ViewerError::UploadFailed("server returned 500 Internal Server Error".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_progress_reader_reports_whole_percentages() {
        let data = vec![0u8; 1000];
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut reader = ProgressReader::new(
            &data[..],
            1000,
            Box::new(move |p| sink.lock().unwrap().push(p)),
        );

        let mut buf = [0u8; 250];
        while reader.read(&mut buf).unwrap() > 0 {}

        assert_eq!(*seen.lock().unwrap(), vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_http_backend_strips_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.url("/folders"), "http://localhost:8000/folders");
    }

    #[test]
    fn test_memory_backend_filters_slides_by_folder() {
        let backend = memory::MemoryBackend::new()
            .with_slide_row(1, "a.svs", Some(FolderId(1)))
            .with_slide_row(2, "b.svs", None);
        assert_eq!(backend.list_slides(None).unwrap().len(), 2);
        let filtered = backend.list_slides(Some(FolderId(1))).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].filename, "a.svs");
    }
}
