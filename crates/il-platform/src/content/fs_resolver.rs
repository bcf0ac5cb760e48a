//! Content handles backed by plain directories.
//!
//! `content://<authority>/<segments..>` resolves to `<root>/<segments..>`
//! where `root` is configured per authority.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use il_core::ports::ContentResolverPort;
use il_core::ContentHandle;

pub struct FsContentResolver {
    roots: BTreeMap<String, PathBuf>,
}

impl FsContentResolver {
    pub fn new(roots: BTreeMap<String, PathBuf>) -> Self {
        Self { roots }
    }

    fn path_for(&self, handle: &ContentHandle) -> Option<PathBuf> {
        let root = self.roots.get(&handle.authority()?)?;
        let segments = handle.segments();
        if segments.is_empty() || segments.iter().any(|s| s == "." || s == "..") {
            return None;
        }
        let mut path = root.clone();
        path.extend(segments);
        Some(path)
    }
}

impl ContentResolverPort for FsContentResolver {
    /// Unknown authorities and missing files resolve to no content.
    fn open(&self, handle: &ContentHandle) -> Result<Option<Box<dyn Read + Send>>> {
        let Some(path) = self.path_for(handle) else {
            tracing::debug!(handle = %handle, "Content handle has no backing path");
            return Ok(None);
        };

        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to open content file: {}", path.display())),
        }
    }
}
