//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary
//! storage disk, an EventBus and a scripted encoding engine, all wired into
//! a full [`AppContext`].

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use videoladder::AppContext;
use vl_core::config::Config;
use vl_core::{Dimensions, Error, Resolution, User, Video};
use vl_db::pool::{init_memory_pool, DbPool};
use vl_db::queries::users;
use vl_pipeline::{EncodingEngine, ProbeReport, StreamInfo, TranscodeRequest};

/// Engine that reports fixed source dimensions and writes a small file per
/// successful rendition.
pub struct ScriptedEngine {
    pub source: Option<Dimensions>,
    pub failing: Vec<Resolution>,
    pub requests: Mutex<Vec<TranscodeRequest>>,
}

impl ScriptedEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            source: Some(Dimensions::new(width, height)),
            failing: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// An engine whose probe always fails.
    pub fn unprobeable() -> Self {
        Self {
            source: None,
            failing: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, resolution: Resolution) -> Self {
        self.failing.push(resolution);
        self
    }

    pub fn requests(&self) -> Vec<TranscodeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EncodingEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn probe(&self, _input: &Path) -> vl_core::Result<ProbeReport> {
        let dims = self
            .source
            .ok_or_else(|| Error::Probe("moov atom not found".into()))?;
        Ok(ProbeReport {
            format: Some("mov,mp4,m4a,3gp,3g2,mj2".into()),
            duration_secs: Some(12.5),
            streams: vec![StreamInfo::video(dims.width as i64, dims.height as i64)],
        })
    }

    async fn transcode(&self, request: &TranscodeRequest) -> vl_core::Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.iter().any(|r| r.dimensions() == request.fit) {
            return Err(Error::tool("ffmpeg", "exited with status 1"));
        }
        std::fs::write(&request.output, format!("rendition {}", request.fit))?;
        Ok(())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary storage disk.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub engine: Arc<ScriptedEngine>,
    pub storage_root: PathBuf,
    _dir: TempDir,
}

impl TestHarness {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self::with_config(engine, Config::default())
    }

    /// Build a harness; `config.storage` is replaced with a single `local`
    /// disk rooted in a temporary directory.
    pub fn with_config(engine: ScriptedEngine, mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage_root = dir.path().join("storage");
        std::fs::create_dir_all(&storage_root).expect("failed to create storage root");

        let mut disks = BTreeMap::new();
        disks.insert("local".to_string(), storage_root.clone());
        config.storage.disks = disks;
        config.storage.default_disk = "local".into();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let engine = Arc::new(engine);
        let ctx = AppContext::new(db.clone(), config, engine.clone());

        Self {
            ctx,
            db,
            engine,
            storage_root,
            _dir: dir,
        }
    }

    pub fn create_user(&self, email: &str) -> User {
        let conn = self.db.get().unwrap();
        users::create_user(&conn, "Test User", email).unwrap()
    }

    /// Write a fake source file outside storage, for ingesting.
    pub fn source_file(&self, name: &str) -> PathBuf {
        let path = self._dir.path().join(name);
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    /// Ingest a fresh source file for a new user.
    pub fn ingest(&self, file_name: &str) -> Video {
        let user = self.create_user(&format!("{}@example.com", uuid_like()));
        let source = self.source_file(file_name);
        videoladder::ingest::ingest_file(&self.ctx, user.id, &source, None, None).unwrap()
    }
}

fn uuid_like() -> String {
    vl_core::UserId::new().to_string()
}
