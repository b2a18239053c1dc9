//! 航程形态谓词
//!
//! 直飞、经停、同一航班号、在线/联程等，作用于整个作用域内的飞行航段。

use crate::core::models::{HiddenStops, ShapeFlags, TravelSegment, Validity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 航程形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// 单一航段且无经停
    NonStop,
    /// 同一市场航班号覆盖一个或多个技术航段
    Direct,
    OneStop,
    MultiStop,
    /// 全程同一市场承运人的转机
    Online,
    /// 多于一个市场承运人
    Interline,
    /// 同一承运人+航班号在去程与回程中重复使用
    SameFlight,
}

impl ShapeKind {
    pub fn holds(
        &self,
        segs: &[&TravelSegment],
        companion: &[TravelSegment],
        count_hidden_stops: bool,
    ) -> bool {
        let stops = stop_count(segs, count_hidden_stops);
        match self {
            ShapeKind::NonStop => segs.len() == 1 && stops == 0,
            ShapeKind::Direct => match segs.first() {
                Some(first) => segs.iter().all(|s| same_flight(s, first)),
                None => false,
            },
            ShapeKind::OneStop => stops == 1,
            ShapeKind::MultiStop => stops > 1,
            ShapeKind::Online => segs.len() > 1 && carriers(segs).len() == 1,
            ShapeKind::Interline => carriers(segs).len() > 1,
            ShapeKind::SameFlight => {
                let flown: Vec<&TravelSegment> =
                    companion.iter().filter(|s| s.is_flown()).collect();
                if flown.is_empty() {
                    segs.iter().enumerate().any(|(i, a)| {
                        segs.iter().skip(i + 1).any(|b| same_flight(a, b))
                    })
                } else {
                    segs.iter().any(|a| flown.iter().any(|b| same_flight(a, b)))
                }
            }
        }
    }
}

fn same_flight(a: &TravelSegment, b: &TravelSegment) -> bool {
    a.carrier.eq_ignore_ascii_case(&b.carrier) && a.flight_number == b.flight_number
}

fn carriers(segs: &[&TravelSegment]) -> BTreeSet<String> {
    segs.iter().map(|s| s.carrier.to_uppercase()).collect()
}

/// 经停次数：转机点数量，加上（如计入）隐藏经停点
pub fn stop_count(segs: &[&TravelSegment], count_hidden_stops: bool) -> usize {
    let connections = segs.len().saturating_sub(1);
    let hidden = if count_hidden_stops {
        segs.iter().map(|s| s.hidden_stops.len()).sum()
    } else {
        0
    };
    connections + hidden
}

/// 航程形态约束
///
/// 有效标志之间为"或"，无效标志各自取反后为"与"，两组再相与。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeConstraint {
    pub valid: Vec<ShapeKind>,
    pub invalid: Vec<ShapeKind>,
    pub count_hidden_stops: bool,
}

impl ShapeConstraint {
    /// 从规则记录的标志构造，全部为空时返回 None
    pub fn from_flags(flags: &ShapeFlags, hidden: HiddenStops) -> Option<Self> {
        if flags.is_blank() {
            return None;
        }

        let all = [
            (ShapeKind::NonStop, flags.nonstop),
            (ShapeKind::Direct, flags.direct),
            (ShapeKind::MultiStop, flags.multistop),
            (ShapeKind::OneStop, flags.onestop),
            (ShapeKind::Online, flags.online),
            (ShapeKind::Interline, flags.interline),
            (ShapeKind::SameFlight, flags.same_flight),
        ];

        let pick = |v: Validity| -> Vec<ShapeKind> {
            all.iter()
                .filter(|(_, flag)| *flag == v)
                .map(|(kind, _)| *kind)
                .collect()
        };

        Some(Self {
            valid: pick(Validity::Valid),
            invalid: pick(Validity::Invalid),
            count_hidden_stops: hidden != HiddenStops::No,
        })
    }

    pub fn holds(&self, segs: &[&TravelSegment], companion: &[TravelSegment]) -> bool {
        let valid_ok = self.valid.is_empty()
            || self
                .valid
                .iter()
                .any(|k| k.holds(segs, companion, self.count_hidden_stops));
        let invalid_ok = self
            .invalid
            .iter()
            .all(|k| !k.holds(segs, companion, self.count_hidden_stops));
        valid_ok && invalid_ok
    }
}
