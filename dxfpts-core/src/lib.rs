pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示。相等比较为逐分量精确比较，不带容差。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        pub const ORIGIN: Point3 = Point3(DVec3::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn from_vec(vec: DVec3) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn to_array(self) -> [f64; 3] {
            self.0.to_array()
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于统计点集范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds3 {
        min: Point3,
        max: Point3,
    }

    impl Bounds3 {
        #[inline]
        pub fn new(min: Point3, max: Point3) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y() || self.min.z() > self.max.z()
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        pub fn include_point(&mut self, point: Point3) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point3::from_vec(self.min.as_vec3().min(point.as_vec3()));
            self.max = Point3::from_vec(self.max.as_vec3().max(point.as_vec3()));
        }

        pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(*point);
            }
            bounds
        }
    }
}

pub mod transform {
    use glam::{DVec2, DVec3};

    use crate::geometry::Point3;

    /// 块参照的放置参数：先缩放、再绕 Z 轴旋转、最后平移，顺序不可交换。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct InsertTransform {
        pub origin: Point3,
        pub scale: DVec3,
        /// 旋转角（度），正值为逆时针。
        pub rotation_deg: f64,
    }

    impl InsertTransform {
        pub const IDENTITY: InsertTransform = InsertTransform {
            origin: Point3::ORIGIN,
            scale: DVec3::ONE,
            rotation_deg: 0.0,
        };

        #[inline]
        pub fn new(origin: Point3, scale: DVec3, rotation_deg: f64) -> Self {
            Self {
                origin,
                scale,
                rotation_deg,
            }
        }

        pub fn apply(&self, point: Point3) -> Point3 {
            let scaled = point.as_vec3() * self.scale;
            // 角度恰为 0 时不做三角运算，保证无旋转时结果逐位不变。
            let planar = if self.rotation_deg == 0.0 {
                scaled.truncate()
            } else {
                let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
                DVec2::new(
                    scaled.x * cos - scaled.y * sin,
                    scaled.x * sin + scaled.y * cos,
                )
            };
            Point3::from_vec(planar.extend(scaled.z) + self.origin.as_vec3())
        }
    }

    impl Default for InsertTransform {
        fn default() -> Self {
            Self::IDENTITY
        }
    }

}

pub mod document {
    use std::collections::HashMap;

    use glam::DVec3;

    use crate::geometry::Point3;
    use crate::transform::InsertTransform;

    /// BLOCK…ENDBLK 之间采集到的点，按文件顺序保存。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Block {
        pub name: String,
        pub points: Vec<Point3>,
    }

    impl Block {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                points: Vec::new(),
            }
        }
    }

    /// 块名到块定义的索引。块名区分大小写；同名块后定义者覆盖先定义者。
    #[derive(Debug, Clone, Default)]
    pub struct BlockRegistry {
        blocks: HashMap<String, Block>,
    }

    impl BlockRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        /// 登记块定义，返回被覆盖的旧定义（若有）。
        pub fn insert(&mut self, block: Block) -> Option<Block> {
            self.blocks.insert(block.name.clone(), block)
        }

        #[inline]
        pub fn get(&self, name: &str) -> Option<&Block> {
            self.blocks.get(name)
        }

        #[inline]
        pub fn contains(&self, name: &str) -> bool {
            self.blocks.contains_key(name)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.blocks.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.blocks.is_empty()
        }

        pub fn blocks(&self) -> impl Iterator<Item = &Block> {
            self.blocks.values()
        }
    }

    /// INSERT 实体：对某个块的一次放置。
    #[derive(Debug, Clone, PartialEq)]
    pub struct InstanceReference {
        pub block_name: String,
        pub origin: Point3,
        pub scale: DVec3,
        pub rotation_deg: f64,
        /// INSERT 关键字所在行号（从 1 开始）。
        pub line: usize,
    }

    impl InstanceReference {
        #[inline]
        pub fn transform(&self) -> InsertTransform {
            InsertTransform::new(self.origin, self.scale, self.rotation_deg)
        }
    }

    /// 单次扫描的结果：块外的点、块索引以及待解析的块参照列表。
    #[derive(Debug, Clone, Default)]
    pub struct Drawing {
        pub points: Vec<Point3>,
        pub blocks: BlockRegistry,
        pub instances: Vec<InstanceReference>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn registry_is_last_write_wins() {
            let mut registry = BlockRegistry::new();
            let mut first = Block::new("B1");
            first.points.push(Point3::new(1.0, 0.0, 0.0));
            assert!(registry.insert(first).is_none());

            let mut second = Block::new("B1");
            second.points.push(Point3::new(2.0, 0.0, 0.0));
            let replaced = registry.insert(second).expect("应返回旧定义");
            assert_eq!(replaced.points, vec![Point3::new(1.0, 0.0, 0.0)]);

            assert_eq!(registry.len(), 1);
            assert_eq!(
                registry.get("B1").map(|block| block.points.clone()),
                Some(vec![Point3::new(2.0, 0.0, 0.0)])
            );
        }

        #[test]
        fn block_names_are_case_sensitive() {
            let mut registry = BlockRegistry::new();
            registry.insert(Block::new("Bolt"));
            assert!(registry.contains("Bolt"));
            assert!(!registry.contains("BOLT"));
        }
    }
}

pub mod diagnostics {
    use std::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum Severity {
        Note,
        Warning,
    }

    /// 解析与解析后处理中可恢复的问题。所有变体都不会中止处理流程。
    #[derive(Debug, Clone, PartialEq)]
    pub enum Diagnostic {
        /// 期望为组码的行无法解析为整数，已跳过该行。
        MalformedTag { line: usize, raw: String },
        /// 数值组码对应的值无法解析为有限浮点数，字段保持默认值。
        MalformedValue { line: usize, code: i32, raw: String },
        /// 文件末尾只有组码行，缺少值行。
        DanglingGroupCode { line: usize, code: i32 },
        /// BLOCK 在遇到 ENDBLK 之前被新的 BLOCK 取代，其中的点被丢弃。
        UnterminatedBlock { line: usize, name: Option<String> },
        /// INSERT 引用了未定义的块，该参照不产生任何点。
        UnresolvedBlockReference { line: usize, name: String },
    }

    impl Diagnostic {
        pub fn severity(&self) -> Severity {
            match self {
                Diagnostic::MalformedTag { .. }
                | Diagnostic::MalformedValue { .. }
                | Diagnostic::DanglingGroupCode { .. } => Severity::Note,
                Diagnostic::UnterminatedBlock { .. }
                | Diagnostic::UnresolvedBlockReference { .. } => Severity::Warning,
            }
        }

        pub fn line(&self) -> usize {
            match self {
                Diagnostic::MalformedTag { line, .. }
                | Diagnostic::MalformedValue { line, .. }
                | Diagnostic::DanglingGroupCode { line, .. }
                | Diagnostic::UnterminatedBlock { line, .. }
                | Diagnostic::UnresolvedBlockReference { line, .. } => *line,
            }
        }
    }

    impl fmt::Display for Diagnostic {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Diagnostic::MalformedTag { line, raw } => {
                    write!(f, "第 {line} 行的组码 \"{raw}\" 无法解析为整数，已跳过")
                }
                Diagnostic::MalformedValue { line, code, raw } => {
                    write!(f, "第 {line} 行组码 {code} 的值 \"{raw}\" 不是有效数值，使用默认值")
                }
                Diagnostic::DanglingGroupCode { line, code } => {
                    write!(f, "第 {line} 行的组码 {code} 缺少对应的值行")
                }
                Diagnostic::UnterminatedBlock { line, name } => match name {
                    Some(name) => write!(f, "第 {line} 行的块 \"{name}\" 未遇到 ENDBLK 即被新块取代"),
                    None => write!(f, "第 {line} 行的未命名块未遇到 ENDBLK 即被新块取代"),
                },
                Diagnostic::UnresolvedBlockReference { line, name } => {
                    write!(f, "第 {line} 行的 INSERT 引用了未定义的块 \"{name}\"")
                }
            }
        }
    }

    /// 带诊断信息的结果：处理总能完成，同时附带可恢复问题的有序列表。
    #[derive(Debug, Clone)]
    pub struct Outcome<T> {
        pub value: T,
        pub diagnostics: Vec<Diagnostic>,
    }

    impl<T> Outcome<T> {
        #[inline]
        pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
            Self { value, diagnostics }
        }

        pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
            Outcome {
                value: f(self.value),
                diagnostics: self.diagnostics,
            }
        }

        pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
            self.diagnostics
                .iter()
                .filter(|diagnostic| diagnostic.severity() == Severity::Warning)
        }

        #[inline]
        pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
            (self.value, self.diagnostics)
        }
    }
}
