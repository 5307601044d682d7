use std::fmt;

use dxfpts_core::geometry::{Bounds3, Point3};

/// 点集概览：数量、坐标范围以及前若干个点。
#[derive(Debug, Clone, PartialEq)]
pub struct PointSummary {
    pub count: usize,
    pub bounds: Bounds3,
    pub preview: Vec<Point3>,
}

impl PointSummary {
    pub const DEFAULT_PREVIEW: usize = 5;

    pub fn from_points(points: &[Point3], preview_len: usize) -> Self {
        Self {
            count: points.len(),
            bounds: Bounds3::from_points(points),
            preview: points.iter().take(preview_len).copied().collect(),
        }
    }
}

impl fmt::Display for PointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "总点数: {}", self.count)?;
        if self.bounds.is_empty() {
            return Ok(());
        }
        let (min, max) = (self.bounds.min(), self.bounds.max());
        writeln!(f, "X范围: [{:.6}, {:.6}]", min.x(), max.x())?;
        writeln!(f, "Y范围: [{:.6}, {:.6}]", min.y(), max.y())?;
        writeln!(f, "Z范围: [{:.6}, {:.6}]", min.z(), max.z())?;
        writeln!(f, "前{}个点:", self.preview.len())?;
        for (index, point) in self.preview.iter().enumerate() {
            writeln!(
                f,
                "  点{}: ({:.6}, {:.6}, {:.6})",
                index + 1,
                point.x(),
                point.y(),
                point.z()
            )?;
        }
        Ok(())
    }
}
