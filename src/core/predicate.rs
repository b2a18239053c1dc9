//! 谓词树与关系组合
//!
//! 条件树最多三个叶子、两个组合节点，没有环也没有回指，
//! 用普通的递归枚举即可。树可以序列化，便于测试断言与诊断输出。

use crate::core::context::TransactionContext;
use crate::core::matchers::{Leaf, SegmentFilter};
use crate::core::models::{Relational, TravelSegment};
use crate::core::shape::ShapeConstraint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 见证区间：作用域窗口中 [start, end] 的一段航段（按行程顺序编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn at(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }
}

/// 承运人/航班条件树
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criteria {
    Leaf(Leaf),
    Combine {
        op: Relational,
        lhs: Box<Criteria>,
        rhs: Box<Criteria>,
    },
}

impl Criteria {
    pub fn combine(op: Relational, lhs: Criteria, rhs: Criteria) -> Self {
        Criteria::Combine {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// 是否包含连接关系（连接关系只约束相邻的一对航段，不要求覆盖全部航段）
    pub fn has_connecting(&self) -> bool {
        match self {
            Criteria::Leaf(_) => false,
            Criteria::Combine { op, lhs, rhs } => {
                *op == Relational::Connecting || lhs.has_connecting() || rhs.has_connecting()
            }
        }
    }

    pub fn leaves(&self) -> Vec<&Leaf> {
        match self {
            Criteria::Leaf(leaf) => vec![leaf],
            Criteria::Combine { lhs, rhs, .. } => {
                let mut out = lhs.leaves();
                out.extend(rhs.leaves());
                out
            }
        }
    }

    /// 计算所有见证区间
    ///
    /// `segs` 为作用域窗口内的全部航段。未定航段与地面段不匹配任何叶子，
    /// 也会打断连接关系。
    pub fn spans(
        &self,
        segs: &[TravelSegment],
        filters: &[SegmentFilter],
        tx: &TransactionContext,
    ) -> Vec<Span> {
        match self {
            Criteria::Leaf(leaf) => segs
                .iter()
                .enumerate()
                .filter(|(_, s)| segment_matches(leaf, s, filters, tx))
                .map(|(i, _)| Span::at(i))
                .collect(),
            Criteria::Combine { op, lhs, rhs } => {
                let left = lhs.spans(segs, filters, tx);
                match op {
                    Relational::Or => {
                        if !left.is_empty() {
                            return left;
                        }
                        rhs.spans(segs, filters, tx)
                    }
                    Relational::AndOr => union(left, rhs.spans(segs, filters, tx)),
                    Relational::And => {
                        if left.is_empty() {
                            return left;
                        }
                        let right = rhs.spans(segs, filters, tx);
                        if right.is_empty() {
                            return right;
                        }
                        union(left, right)
                    }
                    Relational::Connecting => {
                        if left.is_empty() {
                            return left;
                        }
                        let right = rhs.spans(segs, filters, tx);
                        let joined: BTreeSet<Span> = left
                            .iter()
                            .flat_map(|l| {
                                right
                                    .iter()
                                    .filter(move |r| r.start == l.end + 1)
                                    .map(move |r| Span {
                                        start: l.start,
                                        end: r.end,
                                    })
                            })
                            .collect();
                        joined.into_iter().collect()
                    }
                }
            }
        }
    }

    /// 每个飞行航段是否至少被一个叶子匹配
    pub fn covers(
        &self,
        segs: &[TravelSegment],
        filters: &[SegmentFilter],
        tx: &TransactionContext,
    ) -> bool {
        let leaves = self.leaves();
        segs.iter()
            .filter(|s| s.is_flown())
            .all(|s| leaves.iter().any(|leaf| segment_matches(leaf, s, filters, tx)))
    }
}

fn segment_matches(
    leaf: &Leaf,
    seg: &TravelSegment,
    filters: &[SegmentFilter],
    tx: &TransactionContext,
) -> bool {
    seg.is_flown() && leaf.matches(seg, tx) && filters.iter().all(|f| f.matches(seg))
}

fn union(left: Vec<Span>, right: Vec<Span>) -> Vec<Span> {
    let set: BTreeSet<Span> = left.into_iter().chain(right).collect();
    set.into_iter().collect()
}

/// 编译后的谓词树
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PredicateTree {
    /// 承运人/航班条件；适用方式为空时没有条件
    pub criteria: Option<Criteria>,
    /// 机型、星期等航段属性过滤器
    pub filters: Vec<SegmentFilter>,
    pub shape: Option<ShapeConstraint>,
}

/// 一次求值的见证信息
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WitnessReport {
    pub found: bool,
    pub spans: Vec<Span>,
}

impl PredicateTree {
    /// 在作用域窗口上求见证
    pub fn witness(
        &self,
        window: &[TravelSegment],
        companion: &[TravelSegment],
        tx: &TransactionContext,
    ) -> WitnessReport {
        let flown: Vec<&TravelSegment> = window.iter().filter(|s| s.is_flown()).collect();

        let (criteria_ok, spans) = match &self.criteria {
            Some(criteria) => {
                let spans = criteria.spans(window, &self.filters, tx);
                let ok = !spans.is_empty()
                    && (criteria.has_connecting() || criteria.covers(window, &self.filters, tx));
                (ok, spans)
            }
            None => {
                let ok = flown
                    .iter()
                    .all(|s| self.filters.iter().all(|f| f.matches(s)));
                (ok, Vec::new())
            }
        };

        let shape_ok = self
            .shape
            .as_ref()
            .map_or(true, |shape| shape.holds(&flown, companion));

        WitnessReport {
            found: criteria_ok && shape_ok,
            spans,
        }
    }
}
