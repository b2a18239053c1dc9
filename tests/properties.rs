//! Property-based tests for flightapp
//!
//! 结果取反、MUST/MUST_NOT 对偶、未定航段中立、环球票方向无关与确定性。

use proptest::prelude::*;

use flightapp::core::models::{
    CriterionSlot, FareDirection, FareUsage, FlightAppl, InOutInd, Itinerary, Location,
    PricingUnit, RuleSpecification, TravelSegment, ANY_FLIGHT,
};
use flightapp::{negate, FlightApplication, Outcome, RuleUsage, TransactionContext};

const CARRIERS: &[&str] = &["DL", "AA", "AF", "LH"];
const CITIES: &[&str] = &["ATL", "NYC", "LON", "PAR", "FRA"];

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop::sample::select(vec![
        Outcome::Pass,
        Outcome::Fail,
        Outcome::Skip,
        Outcome::SoftPass,
        Outcome::Stop,
    ])
}

fn direction_strategy() -> impl Strategy<Value = InOutInd> {
    prop::sample::select(vec![
        InOutInd::Blank,
        InOutInd::Outbound,
        InOutInd::Inbound,
        InOutInd::Either,
        InOutInd::OneNotBoth,
        InOutInd::Both,
    ])
}

/// 飞行航段：承运人、航班号与终点城市
fn segment_strategy() -> impl Strategy<Value = TravelSegment> {
    (
        prop::sample::select(CARRIERS),
        1u32..2000,
        prop::sample::select(CITIES),
        prop::sample::select(CITIES),
    )
        .prop_map(|(carrier, flight, from, to)| {
            TravelSegment::air(
                carrier,
                flight,
                Location::new(from, "XX", "1"),
                Location::new(to, "XX", "1"),
            )
        })
}

fn itinerary_strategy() -> impl Strategy<Value = Vec<TravelSegment>> {
    prop::collection::vec(segment_strategy(), 1..5)
}

/// 单条件规则：承运人 + 任意航班或具体航班
fn rule_strategy() -> impl Strategy<Value = RuleSpecification> {
    (
        prop::sample::select(CARRIERS),
        prop_oneof![Just(ANY_FLIGHT), 1i32..2000],
    )
        .prop_map(|(carrier, flight)| {
            let mut spec = RuleSpecification {
                vendor: "ATP".to_string(),
                item_no: 1,
                flight_appl: FlightAppl::Must,
                ..Default::default()
            };
            spec.criteria[0] = CriterionSlot::literal(carrier, flight);
            spec
        })
}

fn compile(spec: &RuleSpecification, tx: &TransactionContext) -> FlightApplication {
    FlightApplication::compile(spec, RuleUsage::Primary, "ATP", tx)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn negate_is_an_involution(o in outcome_strategy()) {
        prop_assert_eq!(negate(negate(o)), o);
        if !matches!(o, Outcome::Pass | Outcome::Fail) {
            prop_assert_eq!(negate(o), o);
        }
    }

    #[test]
    fn must_and_must_not_swap(spec in rule_strategy(), segs in itinerary_strategy()) {
        let tx = TransactionContext::default();
        let mut negative = spec.clone();
        negative.flight_appl = FlightAppl::MustNot;

        let itin = Itinerary::new(segs);
        let p = compile(&spec, &tx).evaluate(&itin, &tx);
        let n = compile(&negative, &tx).evaluate(&itin, &tx);
        if p != Outcome::Skip {
            prop_assert_eq!(n, negate(p));
        }
    }

    #[test]
    fn open_segments_never_break_a_pass(
        flights in prop::collection::vec(1u32..2000, 1..5),
        open_mask in prop::collection::vec(any::<bool>(), 5),
    ) {
        let tx = TransactionContext::default();
        let mut spec = RuleSpecification {
            vendor: "ATP".to_string(),
            item_no: 1,
            flight_appl: FlightAppl::Must,
            ..Default::default()
        };
        spec.criteria[0] = CriterionSlot::literal("DL", ANY_FLIGHT);
        let app = compile(&spec, &tx);

        let flown: Vec<TravelSegment> = flights
            .iter()
            .map(|f| TravelSegment::air("DL", *f, Location::new("ATL", "US", "1"), Location::new("NYC", "US", "1")))
            .collect();
        prop_assert_eq!(app.evaluate(&Itinerary::new(flown.clone()), &tx), Outcome::Pass);

        let mixed: Vec<TravelSegment> = flown
            .into_iter()
            .zip(open_mask.iter())
            .map(|(seg, open)| if *open {
                TravelSegment::open("AF", seg.origin, seg.destination)
            } else {
                seg
            })
            .collect();
        prop_assert_eq!(app.evaluate(&Itinerary::new(mixed), &tx), Outcome::Pass);
    }

    #[test]
    fn round_the_world_ignores_direction(
        spec in rule_strategy(),
        outbound in itinerary_strategy(),
        inbound in itinerary_strategy(),
        ind in direction_strategy(),
    ) {
        let tx = TransactionContext::default().round_the_world(true);
        let pu = PricingUnit::new(vec![
            FareUsage::outbound(Itinerary::new(outbound).with_direction(FareDirection::Outbound)),
            FareUsage::inbound(Itinerary::new(inbound).with_direction(FareDirection::Inbound)),
        ]);

        let mut directed = spec.clone();
        directed.in_out = ind;
        let baseline = compile(&spec, &tx);
        let app = compile(&directed, &tx);

        for fu in &pu.fare_usages {
            prop_assert_eq!(
                app.evaluate_fare_usage(&tx, &pu, fu),
                baseline.evaluate_fare_usage(&tx, &pu, fu)
            );
            prop_assert_eq!(app.evaluate(&fu.itinerary, &tx), baseline.evaluate(&fu.itinerary, &tx));
        }
    }

    #[test]
    fn evaluation_is_deterministic(spec in rule_strategy(), segs in itinerary_strategy()) {
        let tx = TransactionContext::default();
        let app = compile(&spec, &tx);
        let itin = Itinerary::new(segs);
        let first = app.evaluate(&itin, &tx);
        for _ in 0..3 {
            prop_assert_eq!(app.evaluate(&itin, &tx), first);
        }
        prop_assert_eq!(compile(&spec, &tx).compiled().fingerprint.clone(), spec.fingerprint());
    }
}
