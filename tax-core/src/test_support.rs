//! 2024 fixtures shared by the unit tests.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::models::{
    CaseBranch, ChildCreditConstants, CompareOp, DeductionAmount, EitcConstants, EitcParams,
    EstimatedPaymentConstants, Expr, FederalConstants, FilingStatus, FilingStatusTable,
    ItemizedCaps, NiitConstants, PayrollConstants, QbiConstants, Rule, RuleKind, RuleStatus,
    RuleTarget, SafeHarborConstants, StateCode, StateCreditConstants, StateEarnedIncomeCredit,
    StateIncomeTax, StateRuleSet, TaxBracket, TaxYearConstants, Value, YoungChildCredit,
};

pub(crate) fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_span_events(FmtSpan::NONE)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

fn brackets(
    bounds: &[Decimal],
    rates: &[Decimal],
) -> Vec<TaxBracket> {
    rates
        .iter()
        .enumerate()
        .map(|(i, rate)| TaxBracket::new(bounds.get(i).copied(), *rate))
        .collect()
}

fn by_status(
    single: Decimal,
    joint: Decimal,
    separate: Decimal,
    head: Decimal,
) -> FilingStatusTable<Decimal> {
    FilingStatusTable {
        single: Some(single),
        married_filing_jointly: Some(joint),
        married_filing_separately: Some(separate),
        head_of_household: Some(head),
        qualifying_surviving_spouse: None,
    }
}

fn eitc_row(
    max_credit: Decimal,
    phase_in_rate: Decimal,
    phase_out_start: Decimal,
    phase_out_rate: Decimal,
) -> EitcParams {
    EitcParams {
        max_credit,
        phase_in_rate,
        phase_out_start,
        phase_out_rate,
    }
}

fn federal_eitc_rows(
    childless_start: Decimal,
    start: Decimal,
) -> Vec<EitcParams> {
    vec![
        eitc_row(dec!(632), dec!(0.0765), childless_start, dec!(0.0765)),
        eitc_row(dec!(4213), dec!(0.34), start, dec!(0.1598)),
        eitc_row(dec!(6960), dec!(0.40), start, dec!(0.2106)),
        eitc_row(dec!(7830), dec!(0.45), start, dec!(0.2106)),
    ]
}

/// Federal and payroll figures for tax year 2024.
pub(crate) fn constants_2024() -> TaxYearConstants {
    let rates = [
        dec!(0.10),
        dec!(0.12),
        dec!(0.22),
        dec!(0.24),
        dec!(0.32),
        dec!(0.35),
        dec!(0.37),
    ];
    let mut federal_brackets = FilingStatusTable::default();
    federal_brackets.set(
        FilingStatus::Single,
        brackets(
            &[
                dec!(11600),
                dec!(47150),
                dec!(100525),
                dec!(191950),
                dec!(243725),
                dec!(609350),
            ],
            &rates,
        ),
    );
    federal_brackets.set(
        FilingStatus::MarriedFilingJointly,
        brackets(
            &[
                dec!(23200),
                dec!(94300),
                dec!(201050),
                dec!(383900),
                dec!(487450),
                dec!(731200),
            ],
            &rates,
        ),
    );
    federal_brackets.set(
        FilingStatus::MarriedFilingSeparately,
        brackets(
            &[
                dec!(11600),
                dec!(47150),
                dec!(100525),
                dec!(191950),
                dec!(243725),
                dec!(365600),
            ],
            &rates,
        ),
    );
    federal_brackets.set(
        FilingStatus::HeadOfHousehold,
        brackets(
            &[
                dec!(16550),
                dec!(63100),
                dec!(100500),
                dec!(191950),
                dec!(243700),
                dec!(609350),
            ],
            &rates,
        ),
    );

    let mut eitc_by_children = FilingStatusTable::default();
    for status in [FilingStatus::Single, FilingStatus::HeadOfHousehold] {
        eitc_by_children.set(status, federal_eitc_rows(dec!(10330), dec!(22720)));
    }
    eitc_by_children.set(
        FilingStatus::MarriedFilingJointly,
        federal_eitc_rows(dec!(17250), dec!(29640)),
    );

    let mut state_credits = BTreeMap::new();
    state_credits.insert(
        "CA".to_string(),
        StateCreditConstants {
            earned_income: Some(StateEarnedIncomeCredit {
                earned_income_limit: dec!(31950),
                by_children: vec![
                    eitc_row(dec!(285), dec!(0.0765), dec!(3725), dec!(0.0101)),
                    eitc_row(dec!(1900), dec!(0.34), dec!(5590), dec!(0.0721)),
                    eitc_row(dec!(3137), dec!(0.40), dec!(7845), dec!(0.1304)),
                    eitc_row(dec!(3529), dec!(0.45), dec!(7845), dec!(0.1467)),
                ],
            }),
            young_child: Some(YoungChildCredit {
                amount: dec!(1154),
                phase_out_start: dec!(25000),
                phase_out_rate: dec!(0.1946),
            }),
        },
    );

    TaxYearConstants {
        tax_year: 2024,
        federal: FederalConstants {
            brackets: federal_brackets,
            standard_deduction: by_status(dec!(14600), dec!(29200), dec!(14600), dec!(21900)),
        },
        payroll: PayrollConstants {
            ss_wage_base: dec!(168600),
            se_social_security_rate: dec!(0.124),
            se_medicare_rate: dec!(0.029),
            employee_social_security_rate: dec!(0.062),
            employee_medicare_rate: dec!(0.0145),
            additional_medicare_rate: dec!(0.009),
            additional_medicare_threshold: by_status(
                dec!(200000),
                dec!(250000),
                dec!(125000),
                dec!(200000),
            ),
            se_net_earnings_factor: dec!(0.9235),
            se_deduction_factor: dec!(0.5),
        },
        qbi: Some(QbiConstants {
            rate: dec!(0.20),
            threshold: by_status(dec!(191950), dec!(383900), dec!(191950), dec!(191950)),
            phaseout_range: by_status(dec!(50000), dec!(100000), dec!(50000), dec!(50000)),
        }),
        niit: Some(NiitConstants {
            rate: dec!(0.038),
            threshold: by_status(dec!(200000), dec!(250000), dec!(125000), dec!(200000)),
        }),
        child_credits: Some(ChildCreditConstants {
            per_child: dec!(2000),
            per_other_dependent: dec!(500),
            phaseout_threshold: by_status(
                dec!(200000),
                dec!(400000),
                dec!(200000),
                dec!(200000),
            ),
            phaseout_step: dec!(1000),
            phaseout_amount_per_step: dec!(50),
            max_refundable_per_child: dec!(1700),
            refundable_earned_income_threshold: Some(dec!(2500)),
            refundable_rate: Some(dec!(0.15)),
        }),
        eitc: Some(EitcConstants {
            investment_income_limit: dec!(11600),
            by_children: eitc_by_children,
        }),
        itemized: Some(ItemizedCaps {
            salt_cap: by_status(dec!(10000), dec!(10000), dec!(5000), dec!(10000)),
            medical_agi_floor: dec!(0.075),
        }),
        safe_harbor: SafeHarborConstants::default(),
        estimated_payments: EstimatedPaymentConstants::default(),
        state_credits,
    }
}

/// California 2024: nine-bracket schedule, standard deduction, the personal
/// exemption credit, an HSA addback and a renters credit awaiting detail.
pub(crate) fn california_2024() -> StateRuleSet {
    let bounds = [
        dec!(10756),
        dec!(25499),
        dec!(40245),
        dec!(55866),
        dec!(70606),
        dec!(360659),
        dec!(432787),
        dec!(721314),
    ];
    let rates = [
        dec!(0.01),
        dec!(0.02),
        dec!(0.04),
        dec!(0.06),
        dec!(0.08),
        dec!(0.093),
        dec!(0.103),
        dec!(0.113),
        dec!(0.123),
    ];
    let doubled: Vec<Decimal> = bounds.iter().map(|b| b * Decimal::TWO).collect();

    let mut table = FilingStatusTable::uniform(brackets(&bounds, &rates));
    table.set(FilingStatus::MarriedFilingJointly, brackets(&doubled, &rates));
    table.set(FilingStatus::QualifyingSurvivingSpouse, brackets(&doubled, &rates));

    let mut standard_deduction = DeductionAmount::flat(dec!(5540));
    for status in [
        FilingStatus::MarriedFilingJointly,
        FilingStatus::QualifyingSurvivingSpouse,
    ] {
        standard_deduction.by_filing_status.set(status, dec!(11080));
    }

    let mut ruleset = StateRuleSet::untaxed(2024, StateCode::parse("CA").unwrap());
    ruleset.name = Some("California".to_string());
    ruleset.income_tax = StateIncomeTax::Progressive { brackets: table };
    ruleset.standard_deduction = standard_deduction;
    ruleset.additions.push(
        Rule::new("ca_hsa_addback", RuleKind::Addition, RuleTarget::StateAgi)
            .with_amount(Expr::lookup("hsaContributions"))
            .with_requires(&["hsaContributions"])
            .with_description("California does not conform to the HSA deduction"),
    );
    ruleset.credits.push(
        Rule::new("ca_personal_exemption", RuleKind::Credit, RuleTarget::StateTax).with_amount(
            Expr::Case {
                branches: vec![CaseBranch {
                    when: Expr::compare(
                        CompareOp::Eq,
                        "filingStatus",
                        Value::Text("MFJ".to_string()),
                    ),
                    then: Expr::constant(dec!(298)),
                }],
                default: Some(Box::new(Expr::constant(dec!(149)))),
            },
        ),
    );
    let mut renters = Rule::new("ca_renters_credit", RuleKind::Credit, RuleTarget::StateTax);
    renters.status = RuleStatus::NeedsDetail;
    ruleset.credits.push(renters);
    ruleset
}

pub(crate) fn texas_2024() -> StateRuleSet {
    let mut ruleset = StateRuleSet::untaxed(2024, StateCode::parse("TX").unwrap());
    ruleset.name = Some("Texas".to_string());
    ruleset
}
