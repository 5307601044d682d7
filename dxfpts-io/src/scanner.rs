use dxfpts_core::{
    diagnostics::{Diagnostic, Outcome},
    document::{Block, Drawing, InstanceReference},
    geometry::Point3,
};
use glam::DVec3;

use crate::tags::{Tag, TagReader};

/// POINT 实体读取过程中的坐标累积器。
#[derive(Debug, Default)]
struct PartialPoint {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
}

impl PartialPoint {
    fn finish(self) -> Option<Point3> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point3::new(x, y, self.z.unwrap_or(0.0))),
            _ => None,
        }
    }
}

/// 尚未遇到 ENDBLK 的块区域。
#[derive(Debug)]
struct OpenBlock {
    name: Option<String>,
    line: usize,
    points: Vec<Point3>,
}

impl OpenBlock {
    fn into_block(self) -> Option<Block> {
        let name = self.name?;
        Some(Block {
            name,
            points: self.points,
        })
    }
}

/// 单遍扫描 DXF 组码流，收集块外的点、块定义与块参照。
///
/// 实体边界为组码 0；组码 0 的值即实体关键字。只识别 `POINT`、`BLOCK`、
/// `ENDBLK`、`INSERT`，其余实体整体忽略。扫描过程中不解析块参照，
/// INSERT 可以引用文件中更靠后定义的块。
pub struct EntityScanner<'a> {
    reader: TagReader<'a>,
    buffer: Option<Tag>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> EntityScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            reader: TagReader::new(source),
            buffer: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn scan(mut self) -> Outcome<Drawing> {
        let mut drawing = Drawing::new();
        let mut open_block: Option<OpenBlock> = None;

        while let Some(tag) = self.next_tag() {
            if !tag.is_entity_start() {
                continue;
            }
            match tag.value.as_str() {
                "POINT" => {
                    if let Some(point) = self.parse_point() {
                        match open_block.as_mut() {
                            Some(block) => block.points.push(point),
                            None => drawing.points.push(point),
                        }
                    }
                }
                "BLOCK" => {
                    let block = self.parse_block_header(tag.line);
                    if let Some(previous) = open_block.replace(block) {
                        self.diagnostics.push(Diagnostic::UnterminatedBlock {
                            line: previous.line,
                            name: previous.name,
                        });
                    }
                }
                "ENDBLK" => {
                    if let Some(block) = open_block.take().and_then(OpenBlock::into_block) {
                        drawing.blocks.insert(block);
                    }
                }
                "INSERT" => {
                    if let Some(instance) = self.parse_insert(tag.line) {
                        drawing.instances.push(instance);
                    }
                }
                _ => {}
            }
        }

        // 文件结束时仍未闭合的块：有名称且已采集到点时仍然登记
        if let Some(block) = open_block
            .filter(|block| !block.points.is_empty())
            .and_then(OpenBlock::into_block)
        {
            drawing.blocks.insert(block);
        }

        self.drain_reader_diagnostics();
        Outcome::new(drawing, self.diagnostics)
    }

    fn parse_point(&mut self) -> Option<Point3> {
        let mut partial = PartialPoint::default();
        while let Some(tag) = self.next_entity_tag() {
            match tag.code {
                10 => replace_if_some(&mut partial.x, self.parse_f64(&tag)),
                20 => replace_if_some(&mut partial.y, self.parse_f64(&tag)),
                30 => replace_if_some(&mut partial.z, self.parse_f64(&tag)),
                _ => {}
            }
        }
        partial.finish()
    }

    fn parse_block_header(&mut self, line: usize) -> OpenBlock {
        let mut name = None;
        while let Some(tag) = self.next_entity_tag() {
            if tag.code == 2 {
                name = non_empty(tag.value);
                break;
            }
        }
        OpenBlock {
            name,
            line,
            points: Vec::new(),
        }
    }

    fn parse_insert(&mut self, line: usize) -> Option<InstanceReference> {
        let mut name = None;
        let mut origin = DVec3::ZERO;
        let mut scale = DVec3::ONE;
        let mut rotation_deg = 0.0;

        while let Some(tag) = self.next_entity_tag() {
            let slot = match tag.code {
                2 => {
                    name = non_empty(tag.value);
                    continue;
                }
                10 => &mut origin.x,
                20 => &mut origin.y,
                30 => &mut origin.z,
                41 => &mut scale.x,
                42 => &mut scale.y,
                43 => &mut scale.z,
                50 => &mut rotation_deg,
                _ => continue,
            };
            if let Some(value) = self.parse_f64(&tag) {
                *slot = value;
            }
        }

        Some(InstanceReference {
            block_name: name?,
            origin: Point3::from_vec(origin),
            scale,
            rotation_deg,
            line,
        })
    }

    /// 读取当前实体内的下一个组码；遇到下一个实体起始（组码 0）时回退并返回 `None`。
    fn next_entity_tag(&mut self) -> Option<Tag> {
        let tag = self.next_tag()?;
        if tag.is_entity_start() {
            self.put_back(tag);
            return None;
        }
        Some(tag)
    }

    fn next_tag(&mut self) -> Option<Tag> {
        if let Some(tag) = self.buffer.take() {
            return Some(tag);
        }
        let tag = self.reader.next();
        self.drain_reader_diagnostics();
        tag
    }

    fn put_back(&mut self, tag: Tag) {
        debug_assert!(self.buffer.is_none(), "只允许回退一个组码");
        self.buffer = Some(tag);
    }

    fn drain_reader_diagnostics(&mut self) {
        self.diagnostics.extend(self.reader.take_diagnostics());
    }

    fn parse_f64(&mut self, tag: &Tag) -> Option<f64> {
        match tag.value.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.diagnostics.push(Diagnostic::MalformedValue {
                    line: tag.line + 1,
                    code: tag.code,
                    raw: tag.value.clone(),
                });
                None
            }
        }
    }
}

fn replace_if_some(slot: &mut Option<f64>, value: Option<f64>) {
    if value.is_some() {
        *slot = value;
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
