//! Frame sequence population
//!
//! Materializes the `{target}/{1..N}.{ext}` layout the tunnel loads from a
//! small set of source photos: frame `i` is a copy of source `(i-1) mod count`,
//! with sources in file-name order.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Population job
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    pub source: PathBuf,
    pub target: PathBuf,
    pub total_frames: usize,
    pub ext: String,
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::from("assets/family-photos"),
            target: PathBuf::from("Family Photos"),
            total_frames: 190,
            ext: "png".to_string(),
        }
    }
}

/// Source images with the given extension, sorted by name
pub fn source_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let ext = ext.trim_start_matches('.');
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// (source, destination) for frames 1..=total
pub fn plan(sources: &[PathBuf], target: &Path, total: usize, ext: &str) -> Vec<(PathBuf, PathBuf)> {
    if sources.is_empty() {
        return Vec::new();
    }
    let ext = ext.trim_start_matches('.');
    (1..=total)
        .map(|i| {
            let source = sources[(i - 1) % sources.len()].clone();
            (source, target.join(format!("{}.{}", i, ext)))
        })
        .collect()
}

/// Copy the sources into the numbered layout; returns frames written
pub fn run(options: &PopulateOptions) -> Result<usize> {
    let sources = source_files(&options.source, &options.ext)?;
    if sources.is_empty() {
        bail!("No source images found in {}", options.source.display());
    }

    info!(
        "Found {} source images. Creating {} frames...",
        sources.len(),
        options.total_frames
    );

    fs::create_dir_all(&options.target).with_context(|| {
        format!("Failed to create target directory: {}", options.target.display())
    })?;

    let jobs = plan(&sources, &options.target, options.total_frames, &options.ext);
    for (source, dest) in &jobs {
        fs::copy(source, dest).with_context(|| {
            format!("Failed to copy {} -> {}", source.display(), dest.display())
        })?;
        debug!("{} -> {}", source.display(), dest.display());
    }

    info!("Tunnel sequence populated: {}", options.target.display());
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: Cyclic assignment
    /// Validates: 3 sources, 190 frames -> frames 1, 4, 190 use source[0]
    #[test]
    fn test_plan_cycles_sources() {
        let sources: Vec<PathBuf> = ["a.png", "b.png", "c.png"].iter().map(PathBuf::from).collect();
        let jobs = plan(&sources, Path::new("out"), 190, "png");

        assert_eq!(jobs.len(), 190);
        for frame in [1usize, 4, 190] {
            assert_eq!(jobs[frame - 1].0, sources[0], "frame {}", frame);
        }
        assert_eq!(jobs[1].0, sources[1]);
        assert_eq!(jobs[2].0, sources[2]);
        assert_eq!(jobs[0].1, Path::new("out").join("1.png"));
        assert_eq!(jobs[189].1, Path::new("out").join("190.png"));
    }

    #[test]
    fn test_plan_without_sources() {
        assert!(plan(&[], Path::new("out"), 10, "png").is_empty());
    }

    /// Test: Full run on disk
    /// Validates: Sorted sources, other extensions ignored, contents copied
    #[test]
    fn test_run_populates_directory() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("c.png"), b"C").unwrap();
        fs::write(src.path().join("a.png"), b"A").unwrap();
        fs::write(src.path().join("b.PNG"), b"B").unwrap();
        fs::write(src.path().join("notes.txt"), b"skip").unwrap();

        let target = dst.path().join("Family Photos");
        let options = PopulateOptions {
            source: src.path().to_path_buf(),
            target: target.clone(),
            total_frames: 7,
            ext: "png".into(),
        };

        assert_eq!(run(&options).unwrap(), 7);
        assert_eq!(fs::read(target.join("1.png")).unwrap(), b"A");
        assert_eq!(fs::read(target.join("2.png")).unwrap(), b"B");
        assert_eq!(fs::read(target.join("3.png")).unwrap(), b"C");
        assert_eq!(fs::read(target.join("7.png")).unwrap(), b"A");
        assert!(!target.join("8.png").exists());
    }

    #[test]
    fn test_run_fails_without_sources() {
        let src = tempfile::tempdir().unwrap();
        let options = PopulateOptions {
            source: src.path().to_path_buf(),
            target: src.path().join("out"),
            ..PopulateOptions::default()
        };
        let err = run(&options).unwrap_err();
        assert!(err.to_string().contains("No source images"));
    }
}
