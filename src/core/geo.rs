//! 地理作用域解析
//!
//! 把"之间/与/经由"字段缩小为行程中的一个连续航段窗口。
//! 窗口要么完整成立，要么不存在（此时规则结果为 Skip），不会出现部分匹配。
//!
//! 行程中的"点"按顺序编号：点 0 是第一个航段的起点，点 k（k>0）是第 k 个航段的终点。
//! 点 0 与最后一个点是行程起终点，其余为转机点。

use crate::core::context::TransactionContext;
use crate::core::error::CompileIssue;
use crate::core::models::{GeoFields, HiddenStops, LocAppl, Location, TravelSegment, ViaPolarity};
use crate::core::providers::{BoundaryDescriptor, LocationMatcher};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// 点在行程中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointPosition {
    Origin,
    Intermediate,
    Destination,
}

fn position_of(point: usize, segment_count: usize) -> PointPosition {
    if point == 0 {
        PointPosition::Origin
    } else if point == segment_count {
        PointPosition::Destination
    } else {
        PointPosition::Intermediate
    }
}

fn point_location(segs: &[TravelSegment], point: usize) -> &Location {
    if point < segs.len() {
        &segs[point].origin
    } else {
        &segs[point - 1].destination
    }
}

/// 已解析的地理项：地点匹配器加行程结构范围
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub matcher: LocationMatcher,
    pub boundary: BoundaryDescriptor,
}

impl GeoPoint {
    pub fn new(matcher: LocationMatcher) -> Self {
        Self {
            matcher,
            boundary: BoundaryDescriptor::default(),
        }
    }

    fn matches_at(&self, segs: &[TravelSegment], point: usize) -> bool {
        let allowed = match position_of(point, segs.len()) {
            PointPosition::Origin => self.boundary.origin,
            PointPosition::Intermediate => self.boundary.intermediate,
            PointPosition::Destination => self.boundary.destination,
        };
        allowed && self.matcher.matches(point_location(segs, point))
    }

    fn matches_hidden(&self, stop: &Location) -> bool {
        self.boundary.intermediate && self.matcher.matches(stop)
    }
}

/// 窗口形式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoWindow {
    /// 整个行程
    Whole,
    /// 两地之间，任一方向
    Between(GeoPoint, GeoPoint),
    /// 区域内：窗口中所有点都在同一地理项内
    Within(GeoPoint),
    /// 只给出起点
    From(GeoPoint),
    /// 只给出终点
    To(GeoPoint),
    /// 经由：从第一个到达经由点的航段到最后一个离开经由点的航段
    Through(Vec<GeoPoint>),
}

/// 已解析的地理作用域
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoScope {
    pub window: GeoWindow,
    /// 窗口必须经过的地点
    pub via: Option<GeoPoint>,
    pub hidden: HiddenStops,
    pub polarity: ViaPolarity,
}

impl Default for GeoScope {
    fn default() -> Self {
        Self::whole()
    }
}

impl GeoScope {
    pub fn whole() -> Self {
        Self {
            window: GeoWindow::Whole,
            via: None,
            hidden: HiddenStops::Blank,
            polarity: ViaPolarity::Blank,
        }
    }

    /// 从规则记录的地理字段解析作用域
    ///
    /// 任一地理项或行程结构指示无法解析时返回对应的问题，调用方据此把规则降级为 Skip。
    pub fn resolve(
        fields: &GeoFields,
        vendor: &str,
        tx: &TransactionContext,
    ) -> Result<Self, CompileIssue> {
        let point = |item: u32| -> Result<Option<GeoPoint>, CompileIssue> {
            if item == 0 {
                return Ok(None);
            }
            resolve_point(item, vendor, tx).map(Some)
        };

        // 经由方式只编码了经由项时，该项即为经由点
        let mut absorbed_via = false;
        let window = match fields.loc_appl {
            LocAppl::Blank => GeoWindow::Whole,
            LocAppl::BetweenAnd => {
                let first = point(fields.between_item)?;
                let second = point(fields.and_item)?;
                match (first, second) {
                    (Some(a), Some(_)) if fields.between_item == fields.and_item => {
                        GeoWindow::Within(a)
                    }
                    (Some(a), Some(b)) => GeoWindow::Between(a, b),
                    (Some(a), None) => GeoWindow::From(a),
                    (None, Some(b)) => GeoWindow::To(b),
                    (None, None) => GeoWindow::Whole,
                }
            }
            LocAppl::Via => {
                let mut points = Vec::new();
                points.extend(point(fields.between_item)?);
                points.extend(point(fields.and_item)?);
                if points.is_empty() {
                    points.extend(point(fields.via_item)?);
                    absorbed_via = true;
                }
                if points.is_empty() {
                    GeoWindow::Whole
                } else {
                    GeoWindow::Through(points)
                }
            }
        };

        let via = if absorbed_via {
            None
        } else {
            point(fields.via_item)?
        };

        Ok(Self {
            window,
            via,
            hidden: fields.hidden,
            polarity: fields.via_polarity,
        })
    }

    /// "不得经过"：匹配完成后对见证取反
    pub fn negates_witness(&self) -> bool {
        self.polarity == ViaPolarity::MustNot
            && (self.via.is_some() || matches!(self.window, GeoWindow::Through(_)))
    }

    /// 计算窗口（航段下标的半开区间），不存在时返回 None
    pub fn window(&self, segs: &[TravelSegment]) -> Option<Range<usize>> {
        let n = segs.len();
        let window = match &self.window {
            GeoWindow::Whole => Some(0..n),
            GeoWindow::Between(a, b) => largest(n, |i, j| {
                (a.matches_at(segs, i) && b.matches_at(segs, j + 1))
                    || (b.matches_at(segs, i) && a.matches_at(segs, j + 1))
            }),
            GeoWindow::Within(zone) => {
                largest(n, |i, j| (i..=j + 1).all(|p| zone.matches_at(segs, p)))
            }
            GeoWindow::From(a) => (0..n).find(|&i| a.matches_at(segs, i)).map(|i| i..n),
            GeoWindow::To(b) => (0..n)
                .rev()
                .find(|&j| b.matches_at(segs, j + 1))
                .map(|j| 0..j + 1),
            GeoWindow::Through(points) => self.through_window(segs, points),
        }?;

        if let Some(via) = &self.via {
            if !self.passes_through(segs, &window, via) {
                return None;
            }
        }
        Some(window)
    }

    fn counts_connections(&self) -> bool {
        self.hidden != HiddenStops::Yes
    }

    fn counts_hidden_stops(&self) -> bool {
        self.hidden != HiddenStops::No
    }

    fn through_window(&self, segs: &[TravelSegment], points: &[GeoPoint]) -> Option<Range<usize>> {
        // (到达航段, 离开航段)
        let mut touches: Vec<(usize, usize)> = Vec::new();
        if self.counts_connections() {
            touches.extend(
                (1..segs.len())
                    .filter(|&p| points.iter().any(|v| v.matches_at(segs, p)))
                    .map(|p| (p - 1, p)),
            );
        }
        if self.counts_hidden_stops() {
            touches.extend(
                segs.iter()
                    .enumerate()
                    .filter(|(_, s)| {
                        s.hidden_stops
                            .iter()
                            .any(|h| points.iter().any(|v| v.matches_hidden(h)))
                    })
                    .map(|(k, _)| (k, k)),
            );
        }

        let start = touches.iter().map(|t| t.0).min()?;
        let end = touches.iter().map(|t| t.1).max()?;
        Some(start..end + 1)
    }

    fn passes_through(&self, segs: &[TravelSegment], window: &Range<usize>, via: &GeoPoint) -> bool {
        let at_connection = self.counts_connections()
            && (window.start + 1..window.end).any(|p| via.matches_at(segs, p));
        let at_hidden_stop = self.counts_hidden_stops()
            && segs[window.clone()]
                .iter()
                .any(|s| s.hidden_stops.iter().any(|h| via.matches_hidden(h)));
        at_connection || at_hidden_stop
    }
}

/// 满足条件的最长窗口 [i, j]，等长时取最早的
fn largest(n: usize, ok: impl Fn(usize, usize) -> bool) -> Option<Range<usize>> {
    for len in (1..=n).rev() {
        for i in 0..=n - len {
            let j = i + len - 1;
            if ok(i, j) {
                return Some(i..j + 1);
            }
        }
    }
    None
}

fn resolve_point(item: u32, vendor: &str, tx: &TransactionContext) -> Result<GeoPoint, CompileIssue> {
    let geo = tx
        .geo()
        .geo_rule_item(vendor, item)
        .ok_or_else(|| CompileIssue::UnresolvedGeoItem {
            vendor: vendor.to_string(),
            item_no: item,
        })?;

    let boundary = if geo.tsi == 0 {
        BoundaryDescriptor::default()
    } else {
        tx.geo()
            .trip_structure_scope(geo.tsi)
            .ok_or(CompileIssue::UnresolvedTripStructure { tsi: geo.tsi })?
    };

    Ok(GeoPoint {
        matcher: geo.location,
        boundary,
    })
}
