//! The top-level driver: walk the input tree, parse and render each file,
//! and mirror the results under the output directory.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error, info};

use crate::eval::Context;
use crate::files;
use crate::mml;
use crate::render;

/// Process exit statuses, in the order of their exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success = 0,
    InvalidArgs = 1,
    InvalidInputDir = 2,
    UnreadableFile = 3,
    ErrorReadingFile = 4,
    MmlParseError = 5,
    EvalError = 6,
    OutputWriteError = 7,
}

pub fn run(input_dir: &Path, output_dir: &Path) -> Status {
    let mut paths = match files::loadable_files(input_dir) {
        Ok(paths) => paths,
        Err(err) => {
            error!("walking {:?}: {:#}", input_dir, err);
            return Status::InvalidInputDir;
        }
    };
    // deterministic order, so definitions carry across files predictably
    paths.sort();

    // one shared context: `def`s made by earlier files are visible to later ones
    let mut ctx = Context::new();

    for path in &paths {
        debug!("rendering {:?}", path);
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                error!("reading {:?}: {}", path, err);
                return match err.kind() {
                    ErrorKind::NotFound | ErrorKind::PermissionDenied => Status::UnreadableFile,
                    _ => Status::ErrorReadingFile,
                };
            }
        };

        let doc = match mml::parse(&source) {
            Ok(doc) => doc,
            Err(err) => {
                error!("parsing {:?}: {}", path, err);
                return Status::MmlParseError;
            }
        };

        let rendered = match render::render_document(&doc, &mut ctx) {
            Ok(rendered) => rendered,
            Err(err) => {
                error!("rendering {:?}: {:#}", path, err);
                return Status::EvalError;
            }
        };

        let relative = path.strip_prefix(input_dir).unwrap_or(path);
        let out_path = output_dir.join(relative);
        if let Some(parent) = out_path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                error!("creating {:?}: {}", parent, err);
                return Status::OutputWriteError;
            }
        }
        if let Err(err) = fs::write(&out_path, &rendered) {
            error!("writing {:?}: {}", out_path, err);
            return Status::OutputWriteError;
        }
    }

    info!("rendered {} files", paths.len());
    Status::Success
}
