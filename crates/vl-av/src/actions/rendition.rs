//! Downscaled H.264/AAC rendition encoding using ffmpeg.

use std::path::Path;
use std::time::Duration;

use vl_pipeline::TranscodeRequest;

use crate::command::ToolCommand;

/// Build the ffmpeg arguments for one rendition.
///
/// The scale filter fits the source inside the target box without cropping
/// or upscaling past it, keeping even dimensions for libx264.
pub fn rendition_args(request: &TranscodeRequest, threads: u32) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-i".into()];
    args.push(request.input.to_string_lossy().into_owned());

    if threads > 0 {
        args.extend(["-threads".into(), threads.to_string()]);
    }

    args.extend([
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "0:a:0?".into(),
        "-vf".into(),
        format!(
            "scale=w={}:h={}:force_original_aspect_ratio=decrease:force_divisible_by=2",
            request.fit.width, request.fit.height
        ),
        "-c:v".into(),
        "libx264".into(),
        "-b:v".into(),
        format!("{}k", request.video_bitrate_kbps),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        format!("{}k", request.audio_bitrate_kbps),
        "-movflags".into(),
        "+faststart".into(),
        "-f".into(),
        "mp4".into(),
    ]);
    args.push(request.output.to_string_lossy().into_owned());
    args
}

/// Encode one rendition with the ffmpeg binary at `ffmpeg`.
pub async fn encode_rendition(
    ffmpeg: &Path,
    request: &TranscodeRequest,
    threads: u32,
    timeout: Option<Duration>,
) -> vl_core::Result<()> {
    tracing::info!(
        "Rendition encode: {:?} -> {:?} (fit={}, video={}k, audio={}k)",
        request.input,
        request.output,
        request.fit,
        request.video_bitrate_kbps,
        request.audio_bitrate_kbps,
    );

    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.timeout(timeout);
    cmd.args(rendition_args(request, threads));
    cmd.execute().await?;

    Ok(())
}
