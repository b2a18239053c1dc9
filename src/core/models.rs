//! 核心数据模型定义
//!
//! 规则记录（RuleSpecification）保持数据源的原始编码约定：
//! 空承运人代表"任意承运人"，航班号 -1 代表"任意航班"，0 代表未编码。
//! 编译器负责把这些约定翻译成显式的通配变体（见 [`CarrierPattern`] 与 [`FlightPattern`]）。

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// 原始记录中"任意航班"的编码值
pub const ANY_FLIGHT: i32 = -1;

/// 航班适用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlightAppl {
    /// 未编码：只校验属性（机型、星期、航程形态）
    #[default]
    Blank,
    /// 必须乘坐
    Must,
    /// 不得乘坐
    MustNot,
    /// 必须乘坐航班号区间内的航班
    MustRange,
    /// 不得乘坐航班号区间内的航班
    MustNotRange,
}

impl FlightAppl {
    /// 是否为否定方式（MUST_NOT / MUST_NOT_RANGE）
    pub fn is_negative(&self) -> bool {
        matches!(self, FlightAppl::MustNot | FlightAppl::MustNotRange)
    }

    /// 是否为区间方式
    pub fn is_range(&self) -> bool {
        matches!(self, FlightAppl::MustRange | FlightAppl::MustNotRange)
    }
}

/// 条件之间的关系运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relational {
    And,
    Or,
    AndOr,
    Connecting,
}

/// 有效/无效指示（机型与航程形态标志共用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Validity {
    #[default]
    Blank,
    Valid,
    Invalid,
}

impl Validity {
    pub fn is_blank(&self) -> bool {
        *self == Validity::Blank
    }
}

/// 地理适用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocAppl {
    #[default]
    Blank,
    /// 在两地之间（两个地理项相同则为"在区域内"）
    BetweenAnd,
    /// 经由地理项所指地点
    Via,
}

/// 经由点的极性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViaPolarity {
    #[default]
    Blank,
    /// 必须经过
    Must,
    /// 不得经过（对最终见证取反）
    MustNot,
}

/// 隐藏经停点的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HiddenStops {
    /// 转机点与隐藏经停点都计入
    #[default]
    Blank,
    /// 只计隐藏经停点
    Yes,
    /// 不计隐藏经停点
    No,
}

/// 去程/回程适用方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InOutInd {
    #[default]
    Blank,
    Outbound,
    Inbound,
    /// 去程和/或回程
    Either,
    /// 去程或回程，但不能两者都满足
    OneNotBoth,
    /// 去程与回程都必须满足
    Both,
}

impl InOutInd {
    /// 只能在计价单元阶段判断的方向
    pub fn needs_pricing_unit(&self) -> bool {
        matches!(self, InOutInd::Either | InOutInd::OneNotBoth | InOutInd::Both)
    }
}

/// 规则数据可用性标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnavailTag {
    #[default]
    Available,
    DataUnavailable,
    TextOnly,
}

/// 单个条件槽位：字面承运人+航班，或承运人航班表引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CriterionSlot {
    /// 承运人代码，空表示任意承运人
    #[serde(default)]
    pub carrier: String,
    /// 航班号，-1 表示任意航班，0 表示未编码
    #[serde(default)]
    pub flight: i32,
    /// 承运人航班表编号，0 表示未引用
    #[serde(default)]
    pub table_item: u32,
}

impl CriterionSlot {
    pub fn literal(carrier: &str, flight: i32) -> Self {
        Self {
            carrier: carrier.to_string(),
            flight,
            table_item: 0,
        }
    }

    pub fn table(table_item: u32) -> Self {
        Self {
            carrier: String::new(),
            flight: 0,
            table_item,
        }
    }

    /// 槽位是否编码了任何内容
    pub fn is_coded(&self) -> bool {
        self.table_item != 0 || !self.carrier.is_empty() || self.flight != 0
    }
}

/// 航程形态标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShapeFlags {
    #[serde(default)]
    pub nonstop: Validity,
    #[serde(default)]
    pub direct: Validity,
    #[serde(default)]
    pub multistop: Validity,
    #[serde(default)]
    pub onestop: Validity,
    #[serde(default)]
    pub online: Validity,
    #[serde(default)]
    pub interline: Validity,
    #[serde(default)]
    pub same_flight: Validity,
}

impl ShapeFlags {
    pub fn is_blank(&self) -> bool {
        [
            self.nonstop,
            self.direct,
            self.multistop,
            self.onestop,
            self.online,
            self.interline,
            self.same_flight,
        ]
        .iter()
        .all(Validity::is_blank)
    }
}

/// 地理相关字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GeoFields {
    #[serde(default)]
    pub loc_appl: LocAppl,
    /// "之间"地理项编号
    #[serde(default)]
    pub between_item: u32,
    /// "与"地理项编号
    #[serde(default)]
    pub and_item: u32,
    /// 经由地理项编号
    #[serde(default)]
    pub via_item: u32,
    #[serde(default)]
    pub via_polarity: ViaPolarity,
    #[serde(default)]
    pub hidden: HiddenStops,
}

impl GeoFields {
    pub fn is_blank(&self) -> bool {
        self.between_item == 0 && self.and_item == 0 && self.via_item == 0
    }
}

/// 航班适用规则记录
/// 加载后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleSpecification {
    pub vendor: String,
    pub item_no: u32,
    #[serde(default)]
    pub unavail_tag: UnavailTag,
    #[serde(default)]
    pub flight_appl: FlightAppl,
    /// 三个条件槽位
    #[serde(default)]
    pub criteria: [CriterionSlot; 3],
    /// 连接槽位1与槽位2
    #[serde(default)]
    pub relational1: Option<Relational>,
    /// 连接前两个槽位的结果与槽位3
    #[serde(default)]
    pub relational2: Option<Relational>,
    /// 机型代码
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub equipment_appl: Validity,
    #[serde(default)]
    pub shape: ShapeFlags,
    /// 星期，数字 1-7（周一=1 … 周日=7）
    #[serde(default)]
    pub day_of_week: String,
    #[serde(default)]
    pub geo: GeoFields,
    #[serde(default)]
    pub in_out: InOutInd,
}

impl RuleSpecification {
    /// 规则指纹：记录内容的稳定哈希，可用作编译结果的缓存键
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        // 字段顺序固定，序列化结果稳定
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(format!("{:?}", self).as_bytes()),
        }
        hex::encode(&hasher.finalize()[..16])
    }
}

/// 承运人匹配模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierPattern {
    Any,
    Exact(String),
}

impl CarrierPattern {
    /// 按原始编码约定解析：空代码即任意承运人
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            CarrierPattern::Any
        } else {
            CarrierPattern::Exact(code.to_uppercase())
        }
    }
}

/// 航班号匹配模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightPattern {
    Any,
    Exact(u32),
    Range { lo: u32, hi: u32 },
}

impl FlightPattern {
    /// 解析字面槽位的航班号：-1 与未编码的 0 都表示任意航班
    pub fn from_literal(flight: i32) -> Self {
        if flight <= 0 {
            FlightPattern::Any
        } else {
            FlightPattern::Exact(flight as u32)
        }
    }

    /// 解析区间：hi 为 0 表示单一航班
    pub fn from_range(lo: i32, hi: i32) -> Self {
        if lo == ANY_FLIGHT {
            return FlightPattern::Any;
        }
        if hi <= 0 {
            return Self::from_literal(lo);
        }
        let lo = lo.max(0) as u32;
        let hi = hi as u32;
        FlightPattern::Range {
            lo: lo.min(hi),
            hi: lo.max(hi),
        }
    }

    pub fn matches(&self, flight: u32) -> bool {
        match *self {
            FlightPattern::Any => true,
            FlightPattern::Exact(n) => n == flight,
            FlightPattern::Range { lo, hi } => lo <= flight && flight <= hi,
        }
    }
}

/// 承运人航班表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierFlightEntry {
    pub marketing_carrier: String,
    /// 空表示任意实际承运人
    #[serde(default)]
    pub operating_carrier: String,
    /// 起始航班号，-1 表示任意航班
    pub flt1: i32,
    /// 结束航班号，0 表示单一航班
    #[serde(default)]
    pub flt2: i32,
}

impl CarrierFlightEntry {
    pub fn new(marketing_carrier: &str, flt1: i32, flt2: i32) -> Self {
        Self {
            marketing_carrier: marketing_carrier.to_string(),
            operating_carrier: String::new(),
            flt1,
            flt2,
        }
    }
}

/// 承运人航班表：各行之间为逻辑或
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierFlightTable {
    pub vendor: String,
    pub item_no: u32,
    pub entries: Vec<CarrierFlightEntry>,
}

/// 航段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SegmentKind {
    /// 已确认的飞行航段
    #[default]
    Air,
    /// 未定航段
    Open,
    /// 地面段
    Surface,
}

/// 地点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Location {
    pub airport: String,
    pub city: String,
    pub nation: String,
    pub area: String,
}

impl Location {
    /// 城市代码与机场代码相同的地点
    pub fn new(airport: &str, nation: &str, area: &str) -> Self {
        Self {
            airport: airport.to_string(),
            city: airport.to_string(),
            nation: nation.to_string(),
            area: area.to_string(),
        }
    }
}

/// 航段（宿主行程的只读投影）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelSegment {
    pub kind: SegmentKind,
    pub origin: Location,
    pub destination: Location,
    /// 市场承运人
    pub carrier: String,
    /// 实际承运人，空表示与市场承运人相同
    #[serde(default)]
    pub operating_carrier: String,
    pub flight_number: u32,
    /// 隐藏经停点（按顺序）
    #[serde(default)]
    pub hidden_stops: Vec<Location>,
    #[serde(default)]
    pub equipment: String,
    /// 出发时间（可能无法确定）
    #[serde(default)]
    pub departure: Option<NaiveDateTime>,
}

impl TravelSegment {
    /// 创建飞行航段
    pub fn air(carrier: &str, flight_number: u32, origin: Location, destination: Location) -> Self {
        Self {
            kind: SegmentKind::Air,
            origin,
            destination,
            carrier: carrier.to_string(),
            operating_carrier: String::new(),
            flight_number,
            hidden_stops: Vec::new(),
            equipment: String::new(),
            departure: None,
        }
    }

    /// 创建未定航段
    pub fn open(carrier: &str, origin: Location, destination: Location) -> Self {
        Self {
            kind: SegmentKind::Open,
            ..Self::air(carrier, 0, origin, destination)
        }
    }

    /// 创建地面段
    pub fn surface(origin: Location, destination: Location) -> Self {
        Self {
            kind: SegmentKind::Surface,
            ..Self::air("", 0, origin, destination)
        }
    }

    pub fn with_operating_carrier(mut self, carrier: &str) -> Self {
        self.operating_carrier = carrier.to_string();
        self
    }

    pub fn with_equipment(mut self, equipment: &str) -> Self {
        self.equipment = equipment.to_string();
        self
    }

    pub fn with_departure(mut self, departure: NaiveDateTime) -> Self {
        self.departure = Some(departure);
        self
    }

    pub fn with_hidden_stop(mut self, stop: Location) -> Self {
        self.hidden_stops.push(stop);
        self
    }

    /// 是否为已确认承运人/航班的飞行航段
    pub fn is_flown(&self) -> bool {
        self.kind == SegmentKind::Air
    }

    /// 实际承运人（未填写时取市场承运人）
    pub fn operating(&self) -> &str {
        if self.operating_carrier.is_empty() {
            &self.carrier
        } else {
            &self.operating_carrier
        }
    }

    /// 出发星期
    pub fn weekday(&self) -> Option<Weekday> {
        self.departure.map(|d| d.weekday())
    }
}

/// 运价市场方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FareDirection {
    Outbound,
    Inbound,
    #[default]
    Unknown,
}

/// 待校验的行程（一个运价组成部分的航段序列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Itinerary {
    pub segments: Vec<TravelSegment>,
    #[serde(default)]
    pub direction: FareDirection,
}

impl Itinerary {
    pub fn new(segments: Vec<TravelSegment>) -> Self {
        Self {
            segments,
            direction: FareDirection::Unknown,
        }
    }

    pub fn with_direction(mut self, direction: FareDirection) -> Self {
        self.direction = direction;
        self
    }
}

/// 运价使用：计价单元中的一个去程或回程部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareUsage {
    pub itinerary: Itinerary,
    pub inbound: bool,
}

impl FareUsage {
    pub fn outbound(itinerary: Itinerary) -> Self {
        Self {
            itinerary,
            inbound: false,
        }
    }

    pub fn inbound(itinerary: Itinerary) -> Self {
        Self {
            itinerary,
            inbound: true,
        }
    }
}

/// 计价单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PricingUnit {
    pub fare_usages: Vec<FareUsage>,
}

impl PricingUnit {
    pub fn new(fare_usages: Vec<FareUsage>) -> Self {
        Self { fare_usages }
    }

    /// 与给定运价使用方向相反的所有航段
    pub fn companion_segments(&self, usage: &FareUsage) -> Vec<TravelSegment> {
        self.fare_usages
            .iter()
            .filter(|fu| fu.inbound != usage.inbound)
            .flat_map(|fu| fu.itinerary.segments.iter().cloned())
            .collect()
    }
}

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 作为其他类别的限定条件使用时，把 SoftPass 视为 Skip
    #[serde(default = "default_true")]
    pub qualifier_softpass_as_skip: bool,
    /// 区间方式与航班表同时编码时，按普通 MUST/MUST_NOT 处理；
    /// 关闭后改为忽略航班表，只用槽位1/2的航班区间
    #[serde(default = "default_true")]
    pub range_with_table_as_plain: bool,
    /// 编译完成后以 debug 级别输出谓词树（JSON）
    #[serde(default)]
    pub log_compiled_tree: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            qualifier_softpass_as_skip: true,
            range_with_table_as_plain: true,
            log_compiled_tree: false,
        }
    }
}
