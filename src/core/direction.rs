//! 方向作用域过滤
//!
//! 去程/回程限制分两个阶段：运价组成部分阶段只能按市场方向做初筛，
//! "任一/仅一/两者"三种组合要等到计价单元阶段，拿到全部运价使用后才能判断。
//! 环球票交易没有去程/回程划分，方向字段一律视为空。

use crate::core::context::TransactionContext;
use crate::core::models::{FareDirection, FareUsage, InOutInd, PricingUnit};
use crate::core::outcome::Outcome;

/// 本次交易实际生效的方向指示
pub fn effective_indicator(ind: InOutInd, tx: &TransactionContext) -> InOutInd {
    if tx.round_the_world {
        InOutInd::Blank
    } else {
        ind
    }
}

/// 运价组成部分阶段的方向初筛
///
/// 返回 None 表示继续做核心校验。
pub fn fare_component_check(ind: InOutInd, direction: FareDirection) -> Option<Outcome> {
    match (ind, direction) {
        (InOutInd::Blank, _) => None,
        (InOutInd::Outbound, FareDirection::Outbound) => None,
        (InOutInd::Inbound, FareDirection::Inbound) => None,
        (InOutInd::Outbound, FareDirection::Inbound) => Some(Outcome::Fail),
        (InOutInd::Inbound, FareDirection::Outbound) => Some(Outcome::Fail),
        (InOutInd::Outbound | InOutInd::Inbound, FareDirection::Unknown) => Some(Outcome::SoftPass),
        (InOutInd::Either | InOutInd::OneNotBoth | InOutInd::Both, _) => Some(Outcome::SoftPass),
    }
}

/// 计价单元阶段，单向指示下对一个运价使用的方向初筛
///
/// 市场方向未知时改用运价使用本身的去程/回程位置判断。
pub fn fare_usage_check(ind: InOutInd, usage: &FareUsage) -> Option<Outcome> {
    let direction = usage.itinerary.direction;
    let opposite = match ind {
        InOutInd::Outbound => {
            direction == FareDirection::Inbound
                || (direction == FareDirection::Unknown && usage.inbound)
        }
        InOutInd::Inbound => {
            direction == FareDirection::Outbound
                || (direction == FareDirection::Unknown && !usage.inbound)
        }
        _ => false,
    };
    opposite.then_some(Outcome::Fail)
}

/// 组合指示（任一/仅一/两者）下整个计价单元的结果
///
/// `eval` 对单个运价使用做不含方向的核心校验。
pub fn combine_pricing_unit<F>(ind: InOutInd, pu: &PricingUnit, mut eval: F) -> Outcome
where
    F: FnMut(&FareUsage) -> Outcome,
{
    let outbound = pu.fare_usages.iter().filter(|fu| !fu.inbound);
    let inbound = pu.fare_usages.iter().filter(|fu| fu.inbound);

    match ind {
        InOutInd::Both => validate_usages(true, pu.fare_usages.iter(), &mut eval),
        InOutInd::Either => {
            let ob = validate_usages(false, outbound, &mut eval);
            if ob == Outcome::Pass {
                return Outcome::Pass;
            }
            let ib = validate_usages(false, inbound, &mut eval);
            if ib == Outcome::Skip {
                ob
            } else {
                ib
            }
        }
        InOutInd::OneNotBoth => {
            let ob = validate_usages(false, outbound, &mut eval);
            let ib = validate_usages(false, inbound, &mut eval);
            if ob == Outcome::Skip || ib == Outcome::Skip {
                Outcome::Skip
            } else if ob != ib {
                Outcome::Pass
            } else {
                Outcome::Fail
            }
        }
        // 单向指示不经过这里
        InOutInd::Blank | InOutInd::Outbound | InOutInd::Inbound => Outcome::Fail,
    }
}

/// 校验一组运价使用
///
/// `all_required` 为真时全部通过才算通过，否则任一通过即可。
/// 后面出现的非 Skip 结果会覆盖之前的 Skip。
fn validate_usages<'a, I, F>(all_required: bool, usages: I, eval: &mut F) -> Outcome
where
    I: Iterator<Item = &'a FareUsage>,
    F: FnMut(&FareUsage) -> Outcome,
{
    let mut skipped = false;
    for usage in usages {
        let result = eval(usage);
        if result == Outcome::Skip {
            skipped = true;
            continue;
        }
        skipped = false;

        if all_required && result == Outcome::Fail {
            return Outcome::Fail;
        }
        if !all_required && result == Outcome::Pass {
            return Outcome::Pass;
        }
    }

    if skipped {
        Outcome::Skip
    } else if all_required {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Itinerary;

    fn pu() -> PricingUnit {
        PricingUnit::new(vec![
            FareUsage::outbound(Itinerary::default().with_direction(FareDirection::Outbound)),
            FareUsage::inbound(Itinerary::default().with_direction(FareDirection::Inbound)),
        ])
    }

    /// 按去程/回程给出固定结果
    fn fixed(ob: Outcome, ib: Outcome) -> impl FnMut(&FareUsage) -> Outcome {
        move |fu: &FareUsage| if fu.inbound { ib } else { ob }
    }

    #[test]
    fn test_round_the_world_ignores_direction() {
        let rtw = TransactionContext::default().round_the_world(true);
        assert_eq!(effective_indicator(InOutInd::Inbound, &rtw), InOutInd::Blank);
        let plain = TransactionContext::default();
        assert_eq!(effective_indicator(InOutInd::Inbound, &plain), InOutInd::Inbound);
    }

    #[test]
    fn test_fare_component_check() {
        use FareDirection::*;
        assert_eq!(fare_component_check(InOutInd::Blank, Inbound), None);
        assert_eq!(fare_component_check(InOutInd::Outbound, Outbound), None);
        assert_eq!(
            fare_component_check(InOutInd::Outbound, Inbound),
            Some(Outcome::Fail)
        );
        assert_eq!(
            fare_component_check(InOutInd::Inbound, Unknown),
            Some(Outcome::SoftPass)
        );
        assert_eq!(
            fare_component_check(InOutInd::Both, Outbound),
            Some(Outcome::SoftPass)
        );
    }

    #[test]
    fn test_fare_usage_check_uses_position_when_direction_unknown() {
        let ob = FareUsage::outbound(Itinerary::default());
        let ib = FareUsage::inbound(Itinerary::default());
        assert_eq!(fare_usage_check(InOutInd::Inbound, &ob), Some(Outcome::Fail));
        assert_eq!(fare_usage_check(InOutInd::Inbound, &ib), None);
        assert_eq!(fare_usage_check(InOutInd::Outbound, &ib), Some(Outcome::Fail));
        assert_eq!(fare_usage_check(InOutInd::Blank, &ib), None);
    }

    #[test]
    fn test_either_direction() {
        use Outcome::*;
        let pu = pu();
        assert_eq!(combine_pricing_unit(InOutInd::Either, &pu, fixed(Fail, Skip)), Fail);
        assert_eq!(combine_pricing_unit(InOutInd::Either, &pu, fixed(Skip, Skip)), Skip);
        assert_eq!(combine_pricing_unit(InOutInd::Either, &pu, fixed(Pass, Fail)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::Either, &pu, fixed(Pass, Skip)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::Either, &pu, fixed(Skip, Pass)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::Either, &pu, fixed(Fail, Fail)), Fail);
    }

    #[test]
    fn test_one_not_both() {
        use Outcome::*;
        let pu = pu();
        assert_eq!(combine_pricing_unit(InOutInd::OneNotBoth, &pu, fixed(Pass, Fail)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::OneNotBoth, &pu, fixed(Fail, Pass)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::OneNotBoth, &pu, fixed(Pass, Pass)), Fail);
        assert_eq!(combine_pricing_unit(InOutInd::OneNotBoth, &pu, fixed(Fail, Fail)), Fail);
        assert_eq!(combine_pricing_unit(InOutInd::OneNotBoth, &pu, fixed(Pass, Skip)), Skip);
    }

    #[test]
    fn test_both_directions() {
        use Outcome::*;
        let pu = pu();
        assert_eq!(combine_pricing_unit(InOutInd::Both, &pu, fixed(Pass, Pass)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::Both, &pu, fixed(Pass, Fail)), Fail);
        assert_eq!(combine_pricing_unit(InOutInd::Both, &pu, fixed(Pass, Skip)), Skip);
        assert_eq!(combine_pricing_unit(InOutInd::Both, &pu, fixed(Skip, Pass)), Pass);

        let empty = PricingUnit::default();
        assert_eq!(combine_pricing_unit(InOutInd::Both, &empty, fixed(Fail, Fail)), Pass);
        assert_eq!(combine_pricing_unit(InOutInd::Either, &empty, fixed(Pass, Pass)), Fail);
    }
}
