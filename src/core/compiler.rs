//! 规则编译器
//!
//! 把一条航班适用规则记录与其引用的参考数据编译成不可变的 [`CompiledRule`]。
//! 编译不会失败：缺失的参考数据和自相矛盾的配置都按约定降级，
//! 原因记录在 [`CompiledRule::issues`] 上并以 warn 级别输出。

use crate::core::context::TransactionContext;
use crate::core::error::CompileIssue;
use crate::core::geo::GeoScope;
use crate::core::matchers::{DayMask, FlightLeaf, Leaf, SegmentFilter, TableLeaf};
use crate::core::models::{
    CriterionSlot, FlightAppl, FlightPattern, InOutInd, Relational, RuleSpecification,
    UnavailTag, Validity,
};
use crate::core::outcome::Outcome;
use crate::core::predicate::{Criteria, PredicateTree};
use crate::core::shape::ShapeConstraint;
use serde::Serialize;

/// 规则在调用方中的用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum RuleUsage {
    /// 直接作为航班适用规则校验
    #[default]
    Primary,
    /// 作为其他类别的"如果"限定条件
    IfQualifier,
    /// 作为其他类别的"如果不"限定条件，结果取反
    IfNotQualifier,
}

impl RuleUsage {
    pub fn is_qualifier(&self) -> bool {
        !matches!(self, RuleUsage::Primary)
    }
}

/// 规则主体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RuleBody {
    /// 无需求值，直接给出结果
    Degraded(Outcome),
    Tree(PredicateTree),
}

/// 地理作用域编译结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GeoPlan {
    Resolved(GeoScope),
    /// 地理项无法解析，所有行程都得到 Skip
    Unresolved,
}

/// 编译后的规则
#[derive(Debug, Clone, Serialize)]
pub struct CompiledRule {
    pub vendor: String,
    pub item_no: u32,
    /// 源记录指纹
    pub fingerprint: String,
    pub usage: RuleUsage,
    pub appl: FlightAppl,
    pub in_out: InOutInd,
    pub body: RuleBody,
    pub geo: GeoPlan,
    pub issues: Vec<CompileIssue>,
}

impl CompiledRule {
    pub fn tree(&self) -> Option<&PredicateTree> {
        match &self.body {
            RuleBody::Tree(tree) => Some(tree),
            RuleBody::Degraded(_) => None,
        }
    }
}

/// 编译规则
///
/// `vendor` 用于查找航班表与地理项。
pub fn compile_rule(
    spec: &RuleSpecification,
    usage: RuleUsage,
    vendor: &str,
    tx: &TransactionContext,
) -> CompiledRule {
    let mut issues = Vec::new();

    let body = match spec.unavail_tag {
        UnavailTag::DataUnavailable => RuleBody::Degraded(Outcome::Fail),
        UnavailTag::TextOnly => RuleBody::Degraded(Outcome::Skip),
        UnavailTag::Available => build_body(spec, vendor, tx, &mut issues),
    };

    let geo = match GeoScope::resolve(&spec.geo, vendor, tx) {
        Ok(scope) => GeoPlan::Resolved(scope),
        Err(issue) => {
            issues.push(issue);
            GeoPlan::Unresolved
        }
    };

    for issue in &issues {
        tracing::warn!("航班适用规则 {}/{}: {}", spec.vendor, spec.item_no, issue);
    }

    let rule = CompiledRule {
        vendor: spec.vendor.clone(),
        item_no: spec.item_no,
        fingerprint: spec.fingerprint(),
        usage,
        appl: spec.flight_appl,
        in_out: spec.in_out,
        body,
        geo,
        issues,
    };

    tracing::debug!(
        "已编译航班适用规则 {}/{} (指纹 {}, {} 个问题)",
        rule.vendor,
        rule.item_no,
        rule.fingerprint,
        rule.issues.len()
    );

    if tx.config.log_compiled_tree {
        match serde_json::to_string(&rule.body) {
            Ok(json) => tracing::debug!("规则 {}/{} 谓词树: {}", rule.vendor, rule.item_no, json),
            Err(e) => tracing::warn!("序列化谓词树失败: {}", e),
        }
    }

    rule
}

/// 构造规则主体
///
/// 航班表缺失时降级为 Fail；关系运算符缺少右侧条件时降级为 Pass，
/// 与适用方式无关。
fn build_body(
    spec: &RuleSpecification,
    vendor: &str,
    tx: &TransactionContext,
    issues: &mut Vec<CompileIssue>,
) -> RuleBody {
    let criteria = if spec.flight_appl == FlightAppl::Blank {
        None
    } else {
        match build_criteria(spec, vendor, tx, issues) {
            Ok(Built::Criteria(criteria)) => Some(criteria),
            Ok(Built::Permissive) => return RuleBody::Degraded(Outcome::Pass),
            Err(issue) => {
                issues.push(issue);
                return RuleBody::Degraded(Outcome::Fail);
            }
        }
    };

    RuleBody::Tree(PredicateTree {
        criteria,
        filters: build_filters(spec, issues),
        shape: ShapeConstraint::from_flags(&spec.shape, spec.geo.hidden),
    })
}

/// 条件构造结果
enum Built {
    Criteria(Criteria),
    /// 配置自相矛盾，规则放行
    Permissive,
}

fn build_criteria(
    spec: &RuleSpecification,
    vendor: &str,
    tx: &TransactionContext,
    issues: &mut Vec<CompileIssue>,
) -> Result<Built, CompileIssue> {
    let [s1, s2, s3] = &spec.criteria;

    if spec.flight_appl.is_range() {
        let has_table = s1.table_item != 0 || s2.table_item != 0;
        if !has_table || !tx.config.range_with_table_as_plain {
            if has_table {
                issues.push(CompileIssue::RangeWithTable);
            }
            return build_range(spec, vendor, tx, issues);
        }
        issues.push(CompileIssue::RangeWithTable);
    }

    let first = if s1.is_coded() {
        slot_leaf(s1, vendor, tx)?
    } else {
        if s2.is_coded() || s3.is_coded() {
            issues.push(CompileIssue::MissingFirstCriterion);
        }
        Leaf::Always
    };

    let second = match (spec.relational1, s2.is_coded()) {
        (Some(op), true) => Some((op, slot_leaf(s2, vendor, tx)?)),
        (Some(_), false) => {
            issues.push(CompileIssue::DanglingRelational { position: 1 });
            return Ok(Built::Permissive);
        }
        (None, true) => {
            issues.push(CompileIssue::OrphanCriterion { slot: 2 });
            None
        }
        (None, false) => None,
    };

    let third = match third_slot(spec.relational2, s3, vendor, tx, issues)? {
        Chained::Dangling => return Ok(Built::Permissive),
        Chained::Leaf(op, leaf) => Some((op, leaf)),
        Chained::None => None,
    };

    let first = Criteria::Leaf(first);
    Ok(Built::Criteria(match (second, third) {
        (None, None) => first,
        (Some((op1, l2)), None) => Criteria::combine(op1, first, Criteria::Leaf(l2)),
        (None, Some((op2, l3))) => Criteria::combine(op2, first, Criteria::Leaf(l3)),
        // s1 AND s2 CONNECTING s3 读作 s1 AND (s2 CONNECTING s3)
        (Some((Relational::And, l2)), Some((Relational::Connecting, l3))) => Criteria::combine(
            Relational::And,
            first,
            Criteria::combine(Relational::Connecting, Criteria::Leaf(l2), Criteria::Leaf(l3)),
        ),
        (Some((op1, l2)), Some((op2, l3))) => Criteria::combine(
            op2,
            Criteria::combine(op1, first, Criteria::Leaf(l2)),
            Criteria::Leaf(l3),
        ),
    }))
}

enum Chained {
    None,
    Dangling,
    Leaf(Relational, Leaf),
}

fn third_slot(
    op: Option<Relational>,
    slot: &CriterionSlot,
    vendor: &str,
    tx: &TransactionContext,
    issues: &mut Vec<CompileIssue>,
) -> Result<Chained, CompileIssue> {
    Ok(match (op, slot.is_coded()) {
        (Some(op), true) => Chained::Leaf(op, slot_leaf(slot, vendor, tx)?),
        (Some(_), false) => {
            issues.push(CompileIssue::DanglingRelational { position: 2 });
            Chained::Dangling
        }
        (None, true) => {
            issues.push(CompileIssue::OrphanCriterion { slot: 3 });
            Chained::None
        }
        (None, false) => Chained::None,
    })
}

/// 区间方式：槽位1/2给出同一承运人的航班号区间，关系运算符1不参与
fn build_range(
    spec: &RuleSpecification,
    vendor: &str,
    tx: &TransactionContext,
    issues: &mut Vec<CompileIssue>,
) -> Result<Built, CompileIssue> {
    let [s1, s2, s3] = &spec.criteria;

    let first = s1.carrier.trim();
    let second = s2.carrier.trim();
    if !second.is_empty() && !first.eq_ignore_ascii_case(second) {
        issues.push(CompileIssue::RangeCarrierMismatch {
            first: first.to_string(),
            second: second.to_string(),
        });
    }

    let range = Criteria::Leaf(Leaf::Flight(FlightLeaf::literal(
        first,
        FlightPattern::from_range(s1.flight, s2.flight),
    )));

    Ok(match third_slot(spec.relational2, s3, vendor, tx, issues)? {
        Chained::Leaf(op, leaf) => {
            Built::Criteria(Criteria::combine(op, range, Criteria::Leaf(leaf)))
        }
        Chained::Dangling => Built::Permissive,
        Chained::None => Built::Criteria(range),
    })
}

fn slot_leaf(
    slot: &CriterionSlot,
    vendor: &str,
    tx: &TransactionContext,
) -> Result<Leaf, CompileIssue> {
    if slot.table_item == 0 {
        return Ok(Leaf::Flight(FlightLeaf::literal(
            &slot.carrier,
            FlightPattern::from_literal(slot.flight),
        )));
    }

    tx.tables()
        .carrier_flight_table(vendor, slot.table_item)
        .map(|table| Leaf::Table(TableLeaf::from_table(&table)))
        .ok_or_else(|| CompileIssue::UnresolvedTable {
            vendor: vendor.to_string(),
            item_no: slot.table_item,
        })
}

fn build_filters(spec: &RuleSpecification, issues: &mut Vec<CompileIssue>) -> Vec<SegmentFilter> {
    let mut filters = Vec::new();

    let equipment = spec.equipment.trim();
    if !equipment.is_empty() {
        // 只填机型未填有效性时按"有效"处理
        let validity = match spec.equipment_appl {
            Validity::Blank => Validity::Valid,
            v => v,
        };
        filters.push(SegmentFilter::Equipment {
            code: equipment.to_string(),
            validity,
        });
    }

    let (mask, invalid) = DayMask::parse(&spec.day_of_week);
    issues.extend(invalid.into_iter().map(CompileIssue::InvalidDayOfWeek));
    if !mask.is_empty() {
        filters.push(SegmentFilter::DayOfWeek(mask));
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{CarrierFlightEntry, CarrierFlightTable, ANY_FLIGHT};
    use crate::core::providers::InMemoryReferenceData;

    fn spec(appl: FlightAppl) -> RuleSpecification {
        RuleSpecification {
            vendor: "ATP".to_string(),
            item_no: 1,
            flight_appl: appl,
            ..Default::default()
        }
    }

    fn tx_with_table(item_no: u32, entries: Vec<CarrierFlightEntry>) -> TransactionContext {
        let mut data = InMemoryReferenceData::new();
        data.add_table(CarrierFlightTable {
            vendor: "ATP".to_string(),
            item_no,
            entries,
        });
        TransactionContext::with_reference_data(data)
    }

    fn criteria(rule: &CompiledRule) -> &Criteria {
        rule.tree()
            .and_then(|t| t.criteria.as_ref())
            .expect("rule should have criteria")
    }

    fn op_of(c: &Criteria) -> Option<Relational> {
        match c {
            Criteria::Combine { op, .. } => Some(*op),
            Criteria::Leaf(_) => None,
        }
    }

    #[test]
    fn test_literal_slot_becomes_flight_leaf() {
        let mut s = spec(FlightAppl::Must);
        s.criteria[0] = CriterionSlot::literal("dl", ANY_FLIGHT);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert!(rule.issues.is_empty());
        assert_eq!(
            criteria(&rule),
            &Criteria::Leaf(Leaf::Flight(FlightLeaf::literal("DL", FlightPattern::Any)))
        );
        assert_eq!(rule.fingerprint, s.fingerprint());
    }

    #[test]
    fn test_blank_appl_has_no_criteria() {
        let mut s = spec(FlightAppl::Blank);
        s.criteria[0] = CriterionSlot::literal("DL", 100);
        s.equipment = "747".to_string();
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        let tree = rule.tree().unwrap();
        assert!(tree.criteria.is_none());
        assert_eq!(tree.filters.len(), 1);
    }

    #[test]
    fn test_missing_table_degrades_to_fail() {
        let mut s = spec(FlightAppl::Must);
        s.criteria[0] = CriterionSlot::table(55);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert_eq!(rule.body, RuleBody::Degraded(Outcome::Fail));
        assert_eq!(
            rule.issues,
            vec![CompileIssue::UnresolvedTable {
                vendor: "ATP".to_string(),
                item_no: 55
            }]
        );
    }

    #[test]
    fn test_table_slot_is_resolved() {
        let tx = tx_with_table(7, vec![CarrierFlightEntry::new("DL", 1000, 1999)]);
        let mut s = spec(FlightAppl::Must);
        s.criteria[0] = CriterionSlot::table(7);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &tx);

        match criteria(&rule) {
            Criteria::Leaf(Leaf::Table(t)) => {
                assert_eq!(t.item_no, 7);
                assert_eq!(t.entries.len(), 1);
            }
            other => panic!("unexpected criteria: {:?}", other),
        }
    }

    #[test]
    fn test_dangling_relational_degrades_to_pass() {
        let tx = TransactionContext::default();
        for appl in [FlightAppl::Must, FlightAppl::MustNot] {
            let mut s = spec(appl);
            s.criteria[0] = CriterionSlot::literal("DL", 100);
            s.relational1 = Some(Relational::And);
            let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &tx);

            assert_eq!(rule.body, RuleBody::Degraded(Outcome::Pass));
            assert_eq!(rule.issues, vec![CompileIssue::DanglingRelational { position: 1 }]);
        }

        let mut s = spec(FlightAppl::MustNotRange);
        s.criteria[0] = CriterionSlot::literal("DL", 100);
        s.criteria[1] = CriterionSlot::literal("DL", 199);
        s.relational2 = Some(Relational::Connecting);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &tx);
        assert_eq!(rule.body, RuleBody::Degraded(Outcome::Pass));
        assert_eq!(rule.issues, vec![CompileIssue::DanglingRelational { position: 2 }]);
    }

    #[test]
    fn test_missing_first_criterion_is_recorded() {
        let mut s = spec(FlightAppl::Must);
        s.relational1 = Some(Relational::And);
        s.criteria[1] = CriterionSlot::literal("AA", 200);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert_eq!(rule.issues, vec![CompileIssue::MissingFirstCriterion]);
        match criteria(&rule) {
            Criteria::Combine { lhs, .. } => assert_eq!(**lhs, Criteria::Leaf(Leaf::Always)),
            other => panic!("unexpected criteria: {:?}", other),
        }
    }

    #[test]
    fn test_orphan_criterion_is_ignored() {
        let mut s = spec(FlightAppl::Must);
        s.criteria[0] = CriterionSlot::literal("DL", 100);
        s.criteria[1] = CriterionSlot::literal("AA", 200);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert!(matches!(criteria(&rule), Criteria::Leaf(Leaf::Flight(_))));
        assert_eq!(rule.issues, vec![CompileIssue::OrphanCriterion { slot: 2 }]);
    }

    #[test]
    fn test_chaining_shapes() {
        let mut s = spec(FlightAppl::Must);
        s.criteria = [
            CriterionSlot::literal("DL", 1),
            CriterionSlot::literal("DL", 2),
            CriterionSlot::literal("DL", 3),
        ];
        let tx = TransactionContext::default();

        // s1 AND (s2 CONNECTING s3)
        s.relational1 = Some(Relational::And);
        s.relational2 = Some(Relational::Connecting);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &tx);
        match criteria(&rule) {
            Criteria::Combine { op, lhs, rhs } => {
                assert_eq!(*op, Relational::And);
                assert!(matches!(**lhs, Criteria::Leaf(_)));
                assert_eq!(op_of(rhs), Some(Relational::Connecting));
            }
            other => panic!("unexpected criteria: {:?}", other),
        }

        // (s1 CONNECTING s2) AND s3
        s.relational1 = Some(Relational::Connecting);
        s.relational2 = Some(Relational::And);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &tx);
        match criteria(&rule) {
            Criteria::Combine { op, lhs, rhs } => {
                assert_eq!(*op, Relational::And);
                assert_eq!(op_of(lhs), Some(Relational::Connecting));
                assert!(matches!(**rhs, Criteria::Leaf(_)));
            }
            other => panic!("unexpected criteria: {:?}", other),
        }
    }

    #[test]
    fn test_range_mode_builds_flight_range() {
        let mut s = spec(FlightAppl::MustRange);
        s.criteria[0] = CriterionSlot::literal("DL", 100);
        s.criteria[1] = CriterionSlot::literal("DL", 199);
        s.relational1 = Some(Relational::Or);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert!(rule.issues.is_empty());
        assert_eq!(
            criteria(&rule),
            &Criteria::Leaf(Leaf::Flight(FlightLeaf::literal(
                "DL",
                FlightPattern::Range { lo: 100, hi: 199 }
            )))
        );
    }

    #[test]
    fn test_range_carrier_mismatch_uses_first_carrier() {
        let mut s = spec(FlightAppl::MustNotRange);
        s.criteria[0] = CriterionSlot::literal("DL", 100);
        s.criteria[1] = CriterionSlot::literal("AA", 199);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert_eq!(
            rule.issues,
            vec![CompileIssue::RangeCarrierMismatch {
                first: "DL".to_string(),
                second: "AA".to_string()
            }]
        );
        match criteria(&rule) {
            Criteria::Leaf(Leaf::Flight(f)) => {
                assert_eq!(f.flight, FlightPattern::Range { lo: 100, hi: 199 })
            }
            other => panic!("unexpected criteria: {:?}", other),
        }
    }

    #[test]
    fn test_range_with_table_is_plain_by_default() {
        let tx = tx_with_table(7, vec![CarrierFlightEntry::new("DL", ANY_FLIGHT, 0)]);
        let mut s = spec(FlightAppl::MustRange);
        s.criteria[0] = CriterionSlot::table(7);
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &tx);

        assert!(rule.issues.contains(&CompileIssue::RangeWithTable));
        assert!(matches!(criteria(&rule), Criteria::Leaf(Leaf::Table(_))));
    }

    #[test]
    fn test_unavailable_data_and_text_only() {
        let tx = TransactionContext::default();
        let mut s = spec(FlightAppl::Must);
        s.unavail_tag = UnavailTag::DataUnavailable;
        assert_eq!(
            compile_rule(&s, RuleUsage::Primary, "ATP", &tx).body,
            RuleBody::Degraded(Outcome::Fail)
        );
        s.unavail_tag = UnavailTag::TextOnly;
        assert_eq!(
            compile_rule(&s, RuleUsage::Primary, "ATP", &tx).body,
            RuleBody::Degraded(Outcome::Skip)
        );
    }

    #[test]
    fn test_filters_and_invalid_day_codes() {
        let mut s = spec(FlightAppl::Blank);
        s.day_of_week = "16x".to_string();
        s.equipment = "320".to_string();
        s.equipment_appl = Validity::Invalid;
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        let tree = rule.tree().unwrap();
        assert_eq!(tree.filters.len(), 2);
        assert_eq!(rule.issues, vec![CompileIssue::InvalidDayOfWeek('x')]);
    }

    #[test]
    fn test_missing_geo_item_is_recorded() {
        let mut s = spec(FlightAppl::Must);
        s.criteria[0] = CriterionSlot::literal("DL", ANY_FLIGHT);
        s.geo.via_item = 12;
        let rule = compile_rule(&s, RuleUsage::Primary, "ATP", &TransactionContext::default());

        assert_eq!(rule.geo, GeoPlan::Unresolved);
        assert!(rule.tree().is_some());
    }
}
