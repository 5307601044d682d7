pub mod export;
pub mod scanner;
pub mod tags;

use std::fs;
use std::path::{Path, PathBuf};

use dxfpts_core::{diagnostics::Outcome, document::Drawing};
use thiserror::Error;

pub use export::{PointCsvWriter, output_path};
pub use scanner::EntityScanner;
pub use tags::{Tag, TagReader};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub trait DrawingLoader {
    fn load(&self, path: &Path) -> Result<Outcome<Drawing>, IoError>;
}

/// DXF 文本读取入口。文件按字节读取并以有损方式解码为 UTF-8，
/// 非法字节不会中断解析；只有文件无法读取时才返回错误。
pub struct DxfPointReader;

impl DxfPointReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfPointReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for DxfPointReader {
    fn load(&self, path: &Path) -> Result<Outcome<Drawing>, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(scan_str(&String::from_utf8_lossy(&bytes)))
    }
}

/// 扫描内存中的 DXF 文本。
pub fn scan_str(source: &str) -> Outcome<Drawing> {
    EntityScanner::new(source).scan()
}
