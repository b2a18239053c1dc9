//! 结果归约模块
//!
//! 五值结果类型，以及见证（witness）与适用方式到结果的映射。

use crate::core::models::FlightAppl;
use serde::{Deserialize, Serialize};

/// 规则校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    /// 暂时通过，需要在计价单元阶段复核
    SoftPass,
    Stop,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Pass => write!(f, "PASS"),
            Outcome::Fail => write!(f, "FAIL"),
            Outcome::Skip => write!(f, "SKIP"),
            Outcome::SoftPass => write!(f, "SOFTPASS"),
            Outcome::Stop => write!(f, "STOP"),
        }
    }
}

/// 对结果取反：只交换 Pass/Fail
pub fn negate(outcome: Outcome) -> Outcome {
    match outcome {
        Outcome::Pass => Outcome::Fail,
        Outcome::Fail => Outcome::Pass,
        other => other,
    }
}

/// 作用域内是否找到见证
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Witness {
    Found,
    Absent,
}

impl Witness {
    pub fn from_bool(found: bool) -> Self {
        if found {
            Witness::Found
        } else {
            Witness::Absent
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Witness::Found => Witness::Absent,
            Witness::Absent => Witness::Found,
        }
    }
}

/// 作用域解析后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoped {
    /// 没有可用的作用域
    Unscoped,
    Scoped(Witness),
}

/// 按适用方式把见证归约为结果
pub fn reduce(scoped: Scoped, appl: FlightAppl) -> Outcome {
    let witness = match scoped {
        Scoped::Unscoped => return Outcome::Skip,
        Scoped::Scoped(w) => w,
    };

    match (appl.is_negative(), witness) {
        (false, Witness::Found) => Outcome::Pass,
        (false, Witness::Absent) => Outcome::Fail,
        (true, Witness::Found) => Outcome::Fail,
        (true, Witness::Absent) => Outcome::Pass,
    }
}
