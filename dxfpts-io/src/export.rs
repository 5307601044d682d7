use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dxfpts_core::geometry::Point3;

use crate::IoError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const HEADER: [&str; 3] = ["X", "Y", "Z"];

/// 将点序列写为 `X,Y,Z` 表头的 CSV。坐标使用最短可往返的十进制表示，不做舍入。
#[derive(Debug, Clone, Copy)]
pub struct PointCsvWriter {
    write_bom: bool,
}

impl PointCsvWriter {
    pub fn new() -> Self {
        Self { write_bom: true }
    }

    /// 是否在文件开头写入 UTF-8 BOM（便于表格软件识别编码）。
    pub fn with_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }

    pub fn write_to<W: Write>(&self, mut out: W, points: &[Point3]) -> Result<(), csv::Error> {
        if self.write_bom {
            out.write_all(UTF8_BOM)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);
        writer.write_record(HEADER)?;
        for point in points {
            writer.write_record(point.to_array().map(format_coordinate))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, points: &[Point3], path: &Path) -> Result<(), IoError> {
        let file = File::create(path).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_to(BufWriter::new(file), points)
            .map_err(|source| IoError::Csv {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Default for PointCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_coordinate(value: f64) -> String {
    // `Debug` 输出最短且可精确往返的表示，并保留整数值的 `.0`
    format!("{value:?}")
}

/// 推导输出 CSV 路径。未显式指定时沿用输入文件名并改扩展名为 `.csv`；
/// 给定 `unique_suffix` 时把它插入到扩展名之前。
pub fn output_path(input: &Path, explicit: Option<&Path>, unique_suffix: Option<&str>) -> PathBuf {
    let base = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("csv"));
    match unique_suffix {
        Some(suffix) => insert_suffix(&base, suffix),
        None => base,
    }
}

fn insert_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut file_name = format!("{stem}{suffix}");
    if let Some(extension) = path.extension() {
        file_name.push('.');
        file_name.push_str(&extension.to_string_lossy());
    }
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(writer: PointCsvWriter, points: &[Point3]) -> String {
        let mut buffer = Vec::new();
        writer.write_to(&mut buffer, points).expect("写入内存缓冲区");
        String::from_utf8(buffer).expect("输出应为 UTF-8")
    }

    #[test]
    fn writes_header_and_full_precision_rows() {
        let text = render(
            PointCsvWriter::new().with_bom(false),
            &[
                Point3::new(10.0, 0.0, -1.5),
                Point3::new(0.1 + 0.2, 1.0 / 3.0, 123456789.125),
            ],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "X,Y,Z",
                "10.0,0.0,-1.5",
                "0.30000000000000004,0.3333333333333333,123456789.125",
            ]
        );
    }

    #[test]
    fn empty_point_list_writes_header_only() {
        let text = render(PointCsvWriter::new().with_bom(false), &[]);
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["X,Y,Z"]);
    }

    #[test]
    fn bom_is_written_by_default() {
        let text = render(PointCsvWriter::default(), &[]);
        assert!(text.starts_with('\u{feff}'));
        assert_eq!(text.trim_start_matches('\u{feff}').trim_end(), "X,Y,Z");
    }

    #[test]
    fn output_path_defaults_to_input_stem() {
        let input = Path::new("drawings/part.dxf");
        assert_eq!(
            output_path(input, None, None),
            PathBuf::from("drawings/part.csv")
        );
        assert_eq!(
            output_path(input, None, Some("_unique")),
            PathBuf::from("drawings/part_unique.csv")
        );
    }

    #[test]
    fn output_path_respects_explicit_target() {
        let input = Path::new("part.dxf");
        let explicit = Path::new("out/points.txt");
        assert_eq!(
            output_path(input, Some(explicit), Some("_unique")),
            PathBuf::from("out/points_unique.txt")
        );
        assert_eq!(
            output_path(input, Some(Path::new("points")), Some("_unique")),
            PathBuf::from("points_unique")
        );
    }
}
