//! In-memory ZIP assembly. Pure: file map in, bytes out.

use crate::domain::model::ProjectFiles;
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Writes every file into a single deflate-compressed archive. The file map
/// iterates in path order and the modification timestamp is pinned, so
/// identical inputs produce byte-identical archives.
pub fn build_archive(files: &ProjectFiles) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options: FileOptions<'_, ()> = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for (path, content) in files {
        zip.start_file(path.as_str(), options.clone())?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
