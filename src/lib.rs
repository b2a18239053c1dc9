//! flightapp - 航班适用规则求值引擎
//!
//! 判断候选行程是否满足一条航班适用规则：承运人/航班组合、机型、
//! 航程形态、星期以及地理范围，结果为 PASS / FAIL / SKIP / SOFTPASS / STOP 之一。
//!
//! 核心设计原则：
//! - 规则编译一次，求值多次，编译结果只读共享
//! - 求值是纯函数，相同输入永远得到相同结果
//! - 缺失的参考数据按约定降级，从不向调用方抛出错误
//!
//! ```
//! use flightapp::core::compiler::RuleUsage;
//! use flightapp::core::context::TransactionContext;
//! use flightapp::core::engine::FlightApplication;
//! use flightapp::core::models::*;
//! use flightapp::core::outcome::Outcome;
//!
//! let mut spec = RuleSpecification {
//!     vendor: "ATP".to_string(),
//!     item_no: 1,
//!     flight_appl: FlightAppl::Must,
//!     ..Default::default()
//! };
//! spec.criteria[0] = CriterionSlot::literal("DL", ANY_FLIGHT);
//!
//! let tx = TransactionContext::default();
//! let rule = FlightApplication::compile(&spec, RuleUsage::Primary, "ATP", &tx);
//!
//! let itin = Itinerary::new(vec![TravelSegment::air(
//!     "DL",
//!     100,
//!     Location::new("ATL", "US", "1"),
//!     Location::new("JFK", "US", "1"),
//! )]);
//! assert_eq!(rule.evaluate(&itin, &tx), Outcome::Pass);
//! ```

pub mod core;
pub mod storage;

pub use crate::core::compiler::{CompiledRule, RuleUsage};
pub use crate::core::context::TransactionContext;
pub use crate::core::engine::FlightApplication;
pub use crate::core::outcome::{negate, Outcome};
