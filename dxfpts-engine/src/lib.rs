pub mod summary;

use dxfpts_core::{diagnostics::Outcome, document::Drawing, geometry::Point3};

pub use dedup::DedupMode;
pub use summary::PointSummary;

/// 完整的第二遍处理：解析块参照，再按指定模式去重。
pub fn extract(drawing: &Drawing, mode: DedupMode) -> Outcome<Vec<Point3>> {
    resolver::resolve(drawing).map(|points| dedup::dedup(points, mode))
}

pub mod resolver {
    use tracing::debug;

    use dxfpts_core::{
        diagnostics::{Diagnostic, Outcome},
        document::Drawing,
        geometry::Point3,
    };

    /// 将块参照展开为世界坐标点。
    ///
    /// 结果先包含所有块外的点（文件顺序），随后按 INSERT 的文件顺序追加每个参照
    /// 变换后的块内点（保持块内采集顺序）。引用未定义块的 INSERT 不产生点，
    /// 并记录一条 [`Diagnostic::UnresolvedBlockReference`]。
    pub fn resolve(drawing: &Drawing) -> Outcome<Vec<Point3>> {
        let mut points = drawing.points.clone();
        let mut diagnostics = Vec::new();

        for instance in &drawing.instances {
            let Some(block) = drawing.blocks.get(&instance.block_name) else {
                debug!(
                    block = %instance.block_name,
                    line = instance.line,
                    "INSERT 引用了未定义的块，已跳过"
                );
                diagnostics.push(Diagnostic::UnresolvedBlockReference {
                    line: instance.line,
                    name: instance.block_name.clone(),
                });
                continue;
            };
            let transform = instance.transform();
            points.extend(block.points.iter().map(|point| transform.apply(*point)));
        }

        debug!(
            loose = drawing.points.len(),
            instances = drawing.instances.len(),
            total = points.len(),
            "块参照解析完成"
        );
        Outcome::new(points, diagnostics)
    }

}

pub mod dedup {
    use std::collections::HashSet;

    use dxfpts_core::geometry::Point3;

    /// 输出去重模式。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum DedupMode {
        #[default]
        KeepAll,
        /// 只保留每个坐标首次出现的点，保持首次出现的顺序。
        UniqueOrdered,
    }

    impl DedupMode {
        #[inline]
        pub fn from_unique_flag(unique: bool) -> Self {
            if unique {
                DedupMode::UniqueOrdered
            } else {
                DedupMode::KeepAll
            }
        }
    }

    /// 精确相等去重，没有容差：变换舍入造成的微小差异会被视为不同的点。
    pub fn dedup(points: Vec<Point3>, mode: DedupMode) -> Vec<Point3> {
        match mode {
            DedupMode::KeepAll => points,
            DedupMode::UniqueOrdered => {
                let mut seen = HashSet::with_capacity(points.len());
                points
                    .into_iter()
                    .filter(|point| match exact_key(*point) {
                        Some(key) => seen.insert(key),
                        None => true,
                    })
                    .collect()
            }
        }
    }

    /// 与 `==` 一致的哈希键：`-0.0` 归一为 `0.0`；含 NaN 的点与任何点都不相等，返回 `None`。
    fn exact_key(point: Point3) -> Option<[u64; 3]> {
        let coords = point.to_array();
        if coords.iter().any(|c| c.is_nan()) {
            return None;
        }
        Some(coords.map(|c| if c == 0.0 { 0.0_f64.to_bits() } else { c.to_bits() }))
    }

}
