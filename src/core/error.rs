//! 错误类型
//!
//! 编译期发现的数据问题不会越过 API 边界抛出，
//! 而是以 [`CompileIssue`] 的形式记录在编译结果上，并按约定降级。

use serde::Serialize;

/// 编译时的降级原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum CompileIssue {
    #[error("承运人航班表 {vendor}/{item_no} 不存在，规则降级为 FAIL")]
    UnresolvedTable { vendor: String, item_no: u32 },

    #[error("地理项 {vendor}/{item_no} 不存在，规则降级为 SKIP")]
    UnresolvedGeoItem { vendor: String, item_no: u32 },

    #[error("行程结构范围 {tsi} 不存在，规则降级为 SKIP")]
    UnresolvedTripStructure { tsi: u32 },

    #[error("关系运算符 {position} 缺少右侧条件，规则降级为 PASS")]
    DanglingRelational { position: u8 },

    #[error("槽位 1 未编码，按任意飞行航段处理")]
    MissingFirstCriterion,

    #[error("槽位 {slot} 已编码但没有关系运算符，已忽略")]
    OrphanCriterion { slot: u8 },

    #[error("区间两端承运人不同（{first} / {second}），按第一个承运人处理")]
    RangeCarrierMismatch { first: String, second: String },

    #[error("区间方式与航班表同时使用，按普通方式处理")]
    RangeWithTable,

    #[error("星期代码 '{0}' 无效，已忽略")]
    InvalidDayOfWeek(char),
}

/// 参考数据加载错误
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("参考数据格式错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("重复的承运人航班表 {vendor}/{item_no}")]
    DuplicateTable { vendor: String, item_no: u32 },

    #[error("重复的地理项 {vendor}/{item_no}")]
    DuplicateGeoItem { vendor: String, item_no: u32 },
}
