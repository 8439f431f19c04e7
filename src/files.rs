use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};

pub const MML_EXTENSION: &str = "mml";

/// All regular files under `base` (recursively) with the `mml` extension.
pub fn loadable_files(base: &Path) -> Result<Vec<PathBuf>> {
    let mut res = Vec::new();
    collect_loadable(base, &mut res)?;
    Ok(res)
}

fn collect_loadable(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| anyhow!("can't open directory for reading: {:?}", dir))?;
    for entry in entries {
        let entry = entry.with_context(|| anyhow!("reading directory: {:?}", dir))?;
        let file_type = entry
            .file_type()
            .with_context(|| anyhow!("reading file type of: {:?}", entry.path()))?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_loadable(&path, out)?;
        } else if file_type.is_file()
            && path.extension().map_or(false, |ext| ext == MML_EXTENSION)
        {
            out.push(path);
        }
    }
    Ok(())
}
