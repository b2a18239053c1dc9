//! 参考数据文件
//!
//! 把承运人航班表、地理项、行程结构范围与联盟成员关系从 JSON 文档载入内存。
//! 同一供应商下重复的表号或地理项号视为数据错误。

use crate::core::error::ReferenceDataError;
use crate::core::models::CarrierFlightTable;
use crate::core::providers::{BoundaryDescriptor, GeoRuleItem, InMemoryReferenceData};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// 参考数据文档
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceDocument {
    #[serde(default)]
    pub tables: Vec<CarrierFlightTable>,
    #[serde(default)]
    pub geo_items: Vec<GeoRuleItem>,
    /// 行程结构指示 -> 范围
    #[serde(default)]
    pub trip_structures: BTreeMap<u32, BoundaryDescriptor>,
    /// 承运人 -> 所属联盟
    #[serde(default)]
    pub alliances: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceDocument {
    pub fn from_json(json: &str) -> Result<Self, ReferenceDataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 转换为内存参考数据
    pub fn into_reference_data(self) -> Result<InMemoryReferenceData, ReferenceDataError> {
        let mut data = InMemoryReferenceData::new();

        for table in self.tables {
            let (vendor, item_no) = (table.vendor.clone(), table.item_no);
            if data.add_table(table).is_some() {
                return Err(ReferenceDataError::DuplicateTable { vendor, item_no });
            }
        }

        for item in self.geo_items {
            let (vendor, item_no) = (item.vendor.clone(), item.item_no);
            if data.add_geo_item(item).is_some() {
                return Err(ReferenceDataError::DuplicateGeoItem { vendor, item_no });
            }
        }

        for (tsi, boundary) in self.trip_structures {
            data.add_trip_structure(tsi, boundary);
        }

        for (carrier, alliances) in self.alliances {
            for alliance in alliances {
                data.add_alliance_member(&carrier, &alliance);
            }
        }

        Ok(data)
    }
}

/// 从文件载入参考数据
pub fn load_from_file(path: &Path) -> Result<InMemoryReferenceData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取参考数据失败: {}", path.display()))?;
    let data = ReferenceDocument::from_json(&content)
        .and_then(ReferenceDocument::into_reference_data)
        .with_context(|| format!("载入参考数据失败: {}", path.display()))?;

    tracing::info!(
        "已载入参考数据: {} 个航班表, {} 个地理项",
        data.table_count(),
        data.geo_item_count()
    );
    Ok(data)
}
