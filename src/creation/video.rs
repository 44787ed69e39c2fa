use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("Frame extraction failed for {video} (exit code {code:?}): {stderr}")]
    Failed {
        video: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Frame extraction for {video} produced no file at {output}")]
    MissingOutput { video: PathBuf, output: PathBuf },
    #[error("Could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes the first frame of a video as a still image.
pub trait FrameExtractor: Send + Sync {
    fn extract_first_frame(&self, video: &Path, output: &Path) -> Result<(), FrameError>;
}

/// Frame extractor that shells out to an `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    program: PathBuf,
}

impl FfmpegFrameExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract_first_frame(&self, video: &Path, output: &Path) -> Result<(), FrameError> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| FrameError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let result = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(video)
            .args(["-frames:v", "1"])
            .arg(output)
            .output()
            .map_err(|source| FrameError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !result.status.success() {
            return Err(FrameError::Failed {
                video: video.to_path_buf(),
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.is_file() {
            return Err(FrameError::MissingOutput {
                video: video.to_path_buf(),
                output: output.to_path_buf(),
            });
        }
        Ok(())
    }
}
