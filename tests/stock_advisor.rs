//! End-to-end stock trading advisor

use std::sync::Arc;

use fuzzy_relations::{
    get_defuzzification, BinaryOp, DefuzzificationMethod, Dimension, Dimensions, Expr, FuzzySet, Inputs, RelationKey,
    Relations,
};

struct Advisor {
    macd: Arc<Dimension>,
    rsi: Arc<Dimension>,
    action: Arc<Dimension>,
    relations: Relations,
    buy_rule: RelationKey,
    rule_base: RelationKey,
}

impl Advisor {
    fn new() -> Self {
        let mut dims = Dimensions::new();
        let macd = dims.add_continuous("MACD", "Moving average convergence/divergence", "", 0., 100.).unwrap();
        let rsi = dims.add_continuous("RSI", "Relative strength index", "", 0., 100.).unwrap();
        let action = dims.add_continuous("Action", "Sell (0) to buy (100)", "", 0., 100.).unwrap();

        let high_macd = Arc::new(FuzzySet::left_linear(&macd, "hMACD", 60., 80.).unwrap());
        let low_macd = Arc::new(FuzzySet::right_linear(&macd, "lMACD", 20., 40.).unwrap());
        let high_rsi = Arc::new(FuzzySet::left_linear(&rsi, "hRSI", 60., 80.).unwrap());
        let low_rsi = Arc::new(FuzzySet::right_linear(&rsi, "lRSI", 20., 40.).unwrap());
        let buy = Arc::new(FuzzySet::left_linear(&action, "buy", 50., 80.).unwrap());
        let sell = Arc::new(FuzzySet::right_linear(&action, "sell", 20., 50.).unwrap());

        let mut relations = Relations::new();
        let buy_rule = relations.insert(Expr::set(&high_macd) & &low_rsi & &buy);
        let sell_rule = relations.insert(Expr::set(&low_macd) & &high_rsi & &sell);
        let rule_base = relations.combine(buy_rule, BinaryOp::OrM, sell_rule).unwrap();

        Advisor {
            macd,
            rsi,
            action,
            relations,
            buy_rule,
            rule_base,
        }
    }

    fn inputs(&self, macd: f64, rsi: f64) -> Inputs {
        let mut inputs = Inputs::new();

        inputs.add(&self.macd, macd).add(&self.rsi, rsi);
        inputs
    }

    fn advise(&self, macd: f64, rsi: f64, method: DefuzzificationMethod) -> f64 {
        let root = self.relations.get(self.rule_base).unwrap();

        get_defuzzification(root, self.inputs(macd, rsi), method).unwrap().crisp_value().unwrap()
    }
}

#[test]
fn test_strong_buy_signal() {
    let advisor = Advisor::new();
    let buy_rule = advisor.relations.get(advisor.buy_rule).unwrap();
    let condition = buy_rule.children()[0];

    assert_eq!(condition.to_string(), "(hMACD And m lRSI)");
    assert_eq!(condition.is_member(&advisor.inputs(90., 5.)).unwrap(), 1.);

    let root = advisor.relations.get(advisor.rule_base).unwrap();
    let result =
        get_defuzzification(root, advisor.inputs(90., 5.), DefuzzificationMethod::RightOfMaximum).unwrap();

    assert_eq!(result.output_dimension().name(), "Action");
    assert_eq!(result.crisp_value().unwrap(), 100.);
    assert_eq!(result.membership_degree().unwrap(), 1.);
    assert_eq!(advisor.advise(90., 5., DefuzzificationMethod::LeftOfMaximum), 80.);
    assert_eq!(advisor.advise(90., 5., DefuzzificationMethod::MeanOfMaximum), 90.);
    assert!((advisor.advise(90., 5., DefuzzificationMethod::CenterOfGravity) - 82.5).abs() < 1e-9);

    assert_eq!(root.lower_support_bound(&advisor.inputs(90., 5.)).unwrap(), 50.);
    assert_eq!(root.upper_support_bound(&advisor.inputs(90., 5.)).unwrap(), 100.);
}

#[test]
fn test_mixed_signal_is_clipped() {
    let advisor = Advisor::new();
    let root = advisor.relations.get(advisor.rule_base).unwrap();
    let projected = root.project(&advisor.inputs(70., 30.)).unwrap();

    // Both antecedents at 0.5
    assert_eq!(projected.membership_degree(100.).unwrap(), 0.5);
    assert_eq!(projected.membership_degree(65.).unwrap(), 0.5);
    assert_eq!(projected.membership_degree(55.).unwrap(), 0.16667);
    assert!((advisor.advise(70., 30., DefuzzificationMethod::LeftOfMaximum) - 65.).abs() < 1e-9);
    assert_eq!(advisor.advise(70., 30., DefuzzificationMethod::RightOfMaximum), 100.);
}

#[test]
fn test_no_rule_fires() {
    let advisor = Advisor::new();

    // Neither buy nor sell conditions hold, so the output is empty
    assert_eq!(advisor.advise(50., 50., DefuzzificationMethod::CenterOfGravity), 50.);
}

#[test]
fn test_rss_with_center_of_maximum() {
    let advisor = Advisor::new();
    let high_macd = Arc::new(FuzzySet::left_linear(&advisor.macd, "hMACD", 60., 80.).unwrap());
    let low_rsi = Arc::new(FuzzySet::right_linear(&advisor.rsi, "lRSI", 20., 40.).unwrap());
    let buy = Arc::new(FuzzySet::singleton(&advisor.action, "buy", 100.).unwrap());
    let hold = Arc::new(FuzzySet::singleton(&advisor.action, "hold", 50.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert((Expr::set(&high_macd) & &buy).rss(Expr::set(&low_rsi) & &hold));
    let result = get_defuzzification(
        relations.get(root).unwrap(),
        advisor.inputs(70., 30.),
        DefuzzificationMethod::CenterOfMaximum,
    )
    .unwrap();

    assert_eq!(result.crisp_value().unwrap(), 75.);
    assert_eq!(result.membership_degree().unwrap(), 0.125);
}

#[test]
fn test_rss_without_weight_falls_back_to_midpoint() {
    let advisor = Advisor::new();
    let high_macd = Arc::new(FuzzySet::left_linear(&advisor.macd, "hMACD", 60., 80.).unwrap());
    let low_rsi = Arc::new(FuzzySet::right_linear(&advisor.rsi, "lRSI", 20., 40.).unwrap());
    let buy = Arc::new(FuzzySet::singleton(&advisor.action, "buy", 100.).unwrap());
    let hold = Arc::new(FuzzySet::singleton(&advisor.action, "hold", 50.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert((Expr::set(&high_macd) & &buy).rss(Expr::set(&low_rsi) & &hold));

    // Neither antecedent holds, so every singleton has degree 0
    let result = get_defuzzification(
        relations.get(root).unwrap(),
        advisor.inputs(0., 100.),
        DefuzzificationMethod::CenterOfMaximum,
    )
    .unwrap();

    assert_eq!(result.crisp_value().unwrap(), 50.);
    assert_eq!(result.membership_degree().unwrap(), 0.);
}

#[test]
fn test_invalid_requests() {
    let advisor = Advisor::new();
    let root = advisor.relations.get(advisor.rule_base).unwrap();
    let mut missing = Inputs::new();

    missing.add(&advisor.macd, 90.);

    assert!(get_defuzzification(root, missing, DefuzzificationMethod::CenterOfGravity).is_err());

    let mut complete = advisor.inputs(90., 5.);

    complete.add(&advisor.action, 10.);

    assert!(get_defuzzification(root, complete.clone(), DefuzzificationMethod::CenterOfGravity).is_err());
    assert!(root.is_member(&complete).is_ok());
    assert!(root.is_member(&advisor.inputs(90., 5.)).is_err());
}

#[test]
fn test_concurrent_advice() {
    let advisor = Advisor::new();
    let readings: Vec<(f64, f64)> = (0..16).map(|i| (f64::from(i) * 6., 90. - f64::from(i) * 5.)).collect();
    let expected: Vec<f64> = readings
        .iter()
        .map(|&(macd, rsi)| advisor.advise(macd, rsi, DefuzzificationMethod::CenterOfGravity))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = readings
            .chunks(4)
            .map(|chunk| {
                let advisor = &advisor;

                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&(macd, rsi)| advisor.advise(macd, rsi, DefuzzificationMethod::CenterOfGravity))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let advice: Vec<f64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

        assert_eq!(advice, expected);
    });
}
