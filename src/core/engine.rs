//! 航班适用规则引擎
//!
//! 编译一次，多次求值。编译结果不可变，可在多个线程间共享只读使用。
//!
//! 求值流程：
//! 1. 降级规则直接给出结果
//! 2. 方向过滤（环球票跳过）
//! 3. 地理作用域缩小为连续航段窗口，窗口不存在则 Skip
//! 4. 在窗口内的飞行航段上求见证，"不得经过"时取反
//! 5. 按适用方式归约为结果，再按规则用途做限定条件映射

use crate::core::compiler::{compile_rule, CompiledRule, GeoPlan, RuleBody, RuleUsage};
use crate::core::context::TransactionContext;
use crate::core::direction::{
    combine_pricing_unit, effective_indicator, fare_component_check, fare_usage_check,
};
use crate::core::error::CompileIssue;
use crate::core::models::{FareUsage, Itinerary, PricingUnit, RuleSpecification, TravelSegment};
use crate::core::outcome::{negate, reduce, Outcome, Scoped, Witness};
use crate::core::predicate::PredicateTree;

/// 航班适用规则
#[derive(Debug, Clone)]
pub struct FlightApplication {
    rule: CompiledRule,
}

impl FlightApplication {
    /// 编译规则记录
    pub fn compile(
        spec: &RuleSpecification,
        usage: RuleUsage,
        vendor: &str,
        tx: &TransactionContext,
    ) -> Self {
        Self {
            rule: compile_rule(spec, usage, vendor, tx),
        }
    }

    pub fn compiled(&self) -> &CompiledRule {
        &self.rule
    }

    /// 谓词树（降级规则没有）
    pub fn tree(&self) -> Option<&PredicateTree> {
        self.rule.tree()
    }

    pub fn issues(&self) -> &[CompileIssue] {
        &self.rule.issues
    }

    /// 运价组成部分阶段的校验
    ///
    /// 需要整个计价单元才能判断的方向指示在这里给出 SoftPass。
    pub fn evaluate(&self, itinerary: &Itinerary, tx: &TransactionContext) -> Outcome {
        let tree = match &self.rule.body {
            RuleBody::Degraded(outcome) => return self.finish(*outcome),
            RuleBody::Tree(tree) => tree,
        };

        let ind = effective_indicator(self.rule.in_out, tx);
        if let Some(outcome) = fare_component_check(ind, itinerary.direction) {
            return self.finish(outcome);
        }

        let outcome = self.evaluate_segments(tree, &itinerary.segments, &[], tx);
        self.finish(outcome)
    }

    /// 计价单元阶段的校验
    pub fn evaluate_fare_usage(
        &self,
        tx: &TransactionContext,
        pu: &PricingUnit,
        fu: &FareUsage,
    ) -> Outcome {
        let tree = match &self.rule.body {
            RuleBody::Degraded(outcome) => return self.finish(*outcome),
            RuleBody::Tree(tree) => tree,
        };

        let ind = effective_indicator(self.rule.in_out, tx);
        let outcome = if ind.needs_pricing_unit() {
            combine_pricing_unit(ind, pu, |usage| self.evaluate_usage(tree, pu, usage, tx))
        } else {
            match fare_usage_check(ind, fu) {
                Some(outcome) => outcome,
                None => self.evaluate_usage(tree, pu, fu, tx),
            }
        };

        self.finish(outcome)
    }

    fn evaluate_usage(
        &self,
        tree: &PredicateTree,
        pu: &PricingUnit,
        fu: &FareUsage,
        tx: &TransactionContext,
    ) -> Outcome {
        let companion = pu.companion_segments(fu);
        self.evaluate_segments(tree, &fu.itinerary.segments, &companion, tx)
    }

    /// 不含方向的核心校验
    fn evaluate_segments(
        &self,
        tree: &PredicateTree,
        segments: &[TravelSegment],
        companion: &[TravelSegment],
        tx: &TransactionContext,
    ) -> Outcome {
        let scope = match &self.rule.geo {
            GeoPlan::Resolved(scope) => scope,
            GeoPlan::Unresolved => return reduce(Scoped::Unscoped, self.rule.appl),
        };

        let Some(window) = scope.window(segments) else {
            tracing::trace!("规则 {}/{}: 地理作用域为空", self.rule.vendor, self.rule.item_no);
            return reduce(Scoped::Unscoped, self.rule.appl);
        };

        let window = &segments[window];
        let flown = window.iter().filter(|s| s.is_flown()).count();

        // 作用域内没有飞行航段时无从违反
        if flown == 0 {
            return Outcome::Pass;
        }

        let report = tree.witness(window, companion, tx);
        let mut witness = Witness::from_bool(report.found);
        if scope.negates_witness() {
            witness = witness.flip();
        }

        let outcome = self.qualify(reduce(Scoped::Scoped(witness), self.rule.appl), tx);
        tracing::trace!(
            "规则 {}/{}: {} 个飞行航段, 见证 {:?}, 结果 {}",
            self.rule.vendor,
            self.rule.item_no,
            flown,
            report.spans,
            outcome
        );
        outcome
    }

    /// 作为限定条件时，谓词树给出的 SoftPass 视为 Skip
    ///
    /// 方向初筛的 SoftPass 不经过这里，留待计价单元阶段复核。
    fn qualify(&self, outcome: Outcome, tx: &TransactionContext) -> Outcome {
        if self.rule.usage.is_qualifier()
            && tx.config.qualifier_softpass_as_skip
            && outcome == Outcome::SoftPass
        {
            Outcome::Skip
        } else {
            outcome
        }
    }

    /// "如果不"限定条件取反
    fn finish(&self, outcome: Outcome) -> Outcome {
        match self.rule.usage {
            RuleUsage::IfNotQualifier => negate(outcome),
            RuleUsage::Primary | RuleUsage::IfQualifier => outcome,
        }
    }
}
