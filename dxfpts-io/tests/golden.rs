use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use dxfpts_core::document::Drawing;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldenDrawing {
    loose_points: Vec<[f64; 3]>,
    blocks: Vec<GoldenBlock>,
    instances: Vec<GoldenInstance>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenBlock {
    name: String,
    points: Vec<[f64; 3]>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenInstance {
    block: String,
    origin: [f64; 3],
    scale: [f64; 3],
    rotation_deg: f64,
    line: usize,
}

pub fn assert_golden(name: &str, drawing: &Drawing) {
    let snapshot = GoldenDrawing::from_drawing(drawing);
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenDrawing = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if expected != snapshot {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前解析结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}

impl GoldenDrawing {
    fn from_drawing(drawing: &Drawing) -> Self {
        let mut blocks: Vec<GoldenBlock> = drawing
            .blocks
            .blocks()
            .map(|block| GoldenBlock {
                name: block.name.clone(),
                points: block.points.iter().map(|p| p.to_array()).collect(),
            })
            .collect();
        blocks.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            loose_points: drawing.points.iter().map(|p| p.to_array()).collect(),
            blocks,
            instances: drawing
                .instances
                .iter()
                .map(|instance| GoldenInstance {
                    block: instance.block_name.clone(),
                    origin: instance.origin.to_array(),
                    scale: instance.scale.to_array(),
                    rotation_deg: instance.rotation_deg,
                    line: instance.line,
                })
                .collect(),
        }
    }
}
