//! Registering uploaded files as videos awaiting processing.

use std::path::Path;

use vl_core::events::EventPayload;
use vl_core::{Error, Result, UserId, Video};
use vl_db::pool::get_conn;
use vl_db::queries::{users, videos};
use vl_pipeline::BlobStore;

use crate::context::AppContext;

/// Guess a video MIME type from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Copy `source` onto a storage disk and record it as an `uploaded` video.
///
/// The blob lands at `videos/<video id>/<file name>`. `disk` defaults to
/// the configured default disk and `name` to the file stem.
pub fn ingest_file(
    ctx: &AppContext,
    user_id: UserId,
    source: &Path,
    name: Option<&str>,
    disk: Option<&str>,
) -> Result<Video> {
    if !source.is_file() {
        return Err(Error::Validation(format!(
            "{} is not a readable file",
            source.display()
        )));
    }

    let conn = get_conn(&ctx.db)?;
    if users::get_user_by_id(&conn, user_id)?.is_none() {
        return Err(Error::not_found("user", user_id));
    }

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Validation(format!("{} has no usable file name", source.display())))?;
    let display_name = match name {
        Some(n) => n.to_string(),
        None => source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string(),
    };
    let disk = disk.unwrap_or(&ctx.config.storage.default_disk);

    let mut video = Video::uploaded(user_id, display_name, mime_for(source), disk, "");
    video.path = format!("videos/{}/{}", video.id, file_name);

    let target = ctx.blobs.resolve_writable(disk, &video.path)?;
    std::fs::copy(source, &target)?;

    if let Err(e) = videos::insert_video(&conn, &video) {
        let _ = std::fs::remove_file(&target);
        return Err(e);
    }

    tracing::info!(
        video_id = %video.id,
        disk = %video.disk,
        path = %video.path,
        "Video ingested"
    );
    ctx.event_bus.broadcast(EventPayload::VideoIngested {
        video_id: video.id,
        user_id,
        name: video.name.clone(),
    });

    Ok(video)
}
