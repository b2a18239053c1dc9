//! 参考数据提供者
//!
//! 承运人航班表、地理项、行程结构范围与联盟成员关系都由宿主系统提供。
//! 这里定义读取接口，以及一个内存实现（测试与简单宿主使用）。

use crate::core::models::{CarrierFlightTable, Location};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 地点匹配器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationMatcher {
    Airport(String),
    City(String),
    Nation(String),
    Area(String),
    /// 区域：任一成员匹配即可
    Zone(Vec<LocationMatcher>),
}

impl LocationMatcher {
    pub fn matches(&self, loc: &Location) -> bool {
        match self {
            LocationMatcher::Airport(code) => loc.airport.eq_ignore_ascii_case(code),
            LocationMatcher::City(code) => loc.city.eq_ignore_ascii_case(code),
            LocationMatcher::Nation(code) => loc.nation.eq_ignore_ascii_case(code),
            LocationMatcher::Area(code) => loc.area.eq_ignore_ascii_case(code),
            LocationMatcher::Zone(members) => members.iter().any(|m| m.matches(loc)),
        }
    }
}

/// 地理项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRuleItem {
    pub vendor: String,
    pub item_no: u32,
    pub location: LocationMatcher,
    /// 行程结构指示，0 表示无
    #[serde(default)]
    pub tsi: u32,
}

/// 行程结构范围：限定哪些点可以参与地理匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryDescriptor {
    #[serde(default = "yes")]
    pub origin: bool,
    #[serde(default = "yes")]
    pub destination: bool,
    /// 转机点与隐藏经停点
    #[serde(default = "yes")]
    pub intermediate: bool,
}

fn yes() -> bool {
    true
}

impl Default for BoundaryDescriptor {
    fn default() -> Self {
        Self {
            origin: true,
            destination: true,
            intermediate: true,
        }
    }
}

/// 承运人航班表读取接口
pub trait TableProvider: Send + Sync {
    fn carrier_flight_table(&self, vendor: &str, item_no: u32) -> Option<CarrierFlightTable>;
}

/// 地理数据读取接口
pub trait GeoProvider: Send + Sync {
    fn geo_rule_item(&self, vendor: &str, item_no: u32) -> Option<GeoRuleItem>;

    fn trip_structure_scope(&self, tsi: u32) -> Option<BoundaryDescriptor>;
}

/// 联盟成员关系读取接口（环球票使用）
pub trait AllianceProvider: Send + Sync {
    fn alliances_of(&self, carrier: &str) -> BTreeSet<String>;
}

/// 内存参考数据
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    tables: BTreeMap<(String, u32), CarrierFlightTable>,
    geo_items: BTreeMap<(String, u32), GeoRuleItem>,
    trip_structures: BTreeMap<u32, BoundaryDescriptor>,
    alliances: BTreeMap<String, BTreeSet<String>>,
}

impl InMemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加承运人航班表，返回被替换的旧表
    pub fn add_table(&mut self, table: CarrierFlightTable) -> Option<CarrierFlightTable> {
        self.tables
            .insert((table.vendor.clone(), table.item_no), table)
    }

    /// 添加地理项，返回被替换的旧项
    pub fn add_geo_item(&mut self, item: GeoRuleItem) -> Option<GeoRuleItem> {
        self.geo_items.insert((item.vendor.clone(), item.item_no), item)
    }

    pub fn add_trip_structure(&mut self, tsi: u32, boundary: BoundaryDescriptor) {
        self.trip_structures.insert(tsi, boundary);
    }

    pub fn add_alliance_member(&mut self, carrier: &str, alliance: &str) {
        self.alliances
            .entry(carrier.to_uppercase())
            .or_default()
            .insert(alliance.to_uppercase());
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn geo_item_count(&self) -> usize {
        self.geo_items.len()
    }
}

impl TableProvider for InMemoryReferenceData {
    fn carrier_flight_table(&self, vendor: &str, item_no: u32) -> Option<CarrierFlightTable> {
        self.tables.get(&(vendor.to_string(), item_no)).cloned()
    }
}

impl GeoProvider for InMemoryReferenceData {
    fn geo_rule_item(&self, vendor: &str, item_no: u32) -> Option<GeoRuleItem> {
        self.geo_items.get(&(vendor.to_string(), item_no)).cloned()
    }

    fn trip_structure_scope(&self, tsi: u32) -> Option<BoundaryDescriptor> {
        self.trip_structures.get(&tsi).copied()
    }
}

impl AllianceProvider for InMemoryReferenceData {
    fn alliances_of(&self, carrier: &str) -> BTreeSet<String> {
        self.alliances
            .get(&carrier.to_uppercase())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::CarrierFlightEntry;

    #[test]
    fn test_location_matcher_levels() {
        let atl = Location::new("ATL", "US", "1");
        assert!(LocationMatcher::Airport("atl".to_string()).matches(&atl));
        assert!(LocationMatcher::Nation("US".to_string()).matches(&atl));
        assert!(LocationMatcher::Area("1".to_string()).matches(&atl));
        assert!(!LocationMatcher::Nation("GB".to_string()).matches(&atl));

        let zone = LocationMatcher::Zone(vec![
            LocationMatcher::Nation("GB".to_string()),
            LocationMatcher::City("ATL".to_string()),
        ]);
        assert!(zone.matches(&atl));
    }

    #[test]
    fn test_in_memory_lookup() {
        let mut data = InMemoryReferenceData::new();
        data.add_table(CarrierFlightTable {
            vendor: "ATP".to_string(),
            item_no: 1,
            entries: vec![CarrierFlightEntry::new("DL", -1, 0)],
        });
        data.add_alliance_member("dl", "skyteam");

        assert!(data.carrier_flight_table("ATP", 1).is_some());
        assert!(data.carrier_flight_table("SITA", 1).is_none());
        assert!(data.alliances_of("DL").contains("SKYTEAM"));
        assert!(data.alliances_of("AA").is_empty());
        assert!(data.trip_structure_scope(5).is_none());
    }
}
