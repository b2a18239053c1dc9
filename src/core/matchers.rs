//! 叶子匹配器
//!
//! 针对单个航段的纯谓词：承运人/航班、航班表成员、机型、星期。
//! 承运人/航班类谓词忽略未定航段与地面段，这类航段没有已确认的承运人和航班号。

use crate::core::context::TransactionContext;
use crate::core::models::{
    CarrierFlightEntry, CarrierFlightTable, CarrierPattern, FlightPattern, TravelSegment, Validity,
};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// 承运人+航班谓词
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightLeaf {
    pub carrier: CarrierPattern,
    pub operating: CarrierPattern,
    pub flight: FlightPattern,
    /// 环球票交易中，承运人代码可以是联盟代码
    #[serde(default)]
    pub alliance_aware: bool,
}

impl FlightLeaf {
    /// 字面条件：实际承运人不限
    pub fn literal(carrier: &str, flight: FlightPattern) -> Self {
        Self {
            carrier: CarrierPattern::from_code(carrier),
            operating: CarrierPattern::Any,
            flight,
            alliance_aware: false,
        }
    }

    /// 航班表中的一行
    pub fn from_entry(entry: &CarrierFlightEntry) -> Self {
        Self {
            carrier: CarrierPattern::from_code(&entry.marketing_carrier),
            operating: CarrierPattern::from_code(&entry.operating_carrier),
            flight: FlightPattern::from_range(entry.flt1, entry.flt2),
            alliance_aware: true,
        }
    }

    pub fn matches(&self, seg: &TravelSegment, tx: &TransactionContext) -> bool {
        if !seg.is_flown() {
            return false;
        }

        carrier_matches(&self.carrier, &seg.carrier, self.alliance_aware, tx)
            && carrier_matches(&self.operating, seg.operating(), self.alliance_aware, tx)
            && self.flight.matches(seg.flight_number)
    }
}

fn carrier_matches(
    pattern: &CarrierPattern,
    code: &str,
    alliance_aware: bool,
    tx: &TransactionContext,
) -> bool {
    match pattern {
        CarrierPattern::Any => true,
        CarrierPattern::Exact(expected) => {
            if expected.eq_ignore_ascii_case(code) {
                return true;
            }
            alliance_aware
                && tx.round_the_world
                && tx.alliances().alliances_of(code).contains(expected)
        }
    }
}

/// 航班表谓词：任一行匹配即可
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLeaf {
    pub vendor: String,
    pub item_no: u32,
    pub entries: Vec<FlightLeaf>,
}

impl TableLeaf {
    pub fn from_table(table: &CarrierFlightTable) -> Self {
        Self {
            vendor: table.vendor.clone(),
            item_no: table.item_no,
            entries: table.entries.iter().map(FlightLeaf::from_entry).collect(),
        }
    }

    pub fn matches(&self, seg: &TravelSegment, tx: &TransactionContext) -> bool {
        seg.is_flown() && self.entries.iter().any(|e| e.matches(seg, tx))
    }
}

/// 条件树的叶子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leaf {
    Flight(FlightLeaf),
    Table(TableLeaf),
    /// 任意飞行航段（槽位 1 未编码时）
    Always,
}

impl Leaf {
    pub fn matches(&self, seg: &TravelSegment, tx: &TransactionContext) -> bool {
        match self {
            Leaf::Flight(f) => f.matches(seg, tx),
            Leaf::Table(t) => t.matches(seg, tx),
            Leaf::Always => seg.is_flown(),
        }
    }
}

/// 星期掩码，bit0 = 周一 … bit6 = 周日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayMask(pub u8);

impl DayMask {
    /// 解析数字串（1=周一 … 7=周日），返回掩码与无效字符
    pub fn parse(days: &str) -> (Self, Vec<char>) {
        let mut mask = 0u8;
        let mut invalid = Vec::new();
        for c in days.chars().filter(|c| !c.is_whitespace()) {
            match c.to_digit(10) {
                Some(d @ 1..=7) => mask |= 1 << (d - 1),
                _ => invalid.push(c),
            }
        }
        (DayMask(mask), invalid)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }
}

/// 航段属性过滤器，与条件叶子按"同一航段"相与
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentFilter {
    Equipment { code: String, validity: Validity },
    DayOfWeek(DayMask),
}

impl SegmentFilter {
    pub fn matches(&self, seg: &TravelSegment) -> bool {
        match self {
            SegmentFilter::Equipment { code, validity } => {
                let same = seg.equipment.trim().eq_ignore_ascii_case(code.trim());
                match validity {
                    Validity::Valid => same,
                    Validity::Invalid => !same,
                    Validity::Blank => true,
                }
            }
            // 无法确定出发日期的航段不参与星期校验
            SegmentFilter::DayOfWeek(mask) => match seg.weekday() {
                Some(day) => mask.contains(day),
                None => true,
            },
        }
    }
}
