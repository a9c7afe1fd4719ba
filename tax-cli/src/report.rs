//! Plain-text rendering of engine results.

use std::fmt::Write;

use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::calculations::premium::SafeHarborResult;
use tax_core::calculations::{Diagnostics, SeTaxResult};
use tax_core::scenario::{PathResult, PayrollTax, PlanningResult, ScenarioResult};

/// One batch row as it appears in JSON output.
#[derive(Debug, Serialize)]
pub struct BatchEntry<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub result: &'a ScenarioResult,
}

fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let (sign, digits) = if rounded.is_sign_negative() && !rounded.is_zero() {
        ("-", format!("{:.2}", rounded.abs()))
    } else {
        ("", format!("{:.2}", rounded))
    };
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{cents}")
}

fn percent(rate: Decimal) -> String {
    format!("{:.2}%", (rate * Decimal::ONE_HUNDRED).round_dp(2))
}

fn row(
    out: &mut String,
    label: &str,
    w2: Decimal,
    contractor: Decimal,
) {
    let _ = writeln!(
        out,
        "  {label:<24}{:>16}{:>16}",
        money(w2),
        money(contractor)
    );
}

fn payroll_label(payroll: &PayrollTax) -> &'static str {
    match payroll {
        PayrollTax::Fica(_) => "FICA",
        PayrollTax::SelfEmployment(_) => "SE tax",
    }
}

pub fn comparison(result: &ScenarioResult) -> String {
    let mut out = String::new();
    let w2 = &result.w2;
    let c = &result.contractor;

    let _ = writeln!(
        out,
        "Tax year {} | {} | {}",
        result.tax_year, result.filing_status, result.state
    );
    let _ = writeln!(out, "  {:<24}{:>16}{:>16}", "", "W-2", "1099");
    row(&mut out, "Gross income", w2.gross_income, c.gross_income);
    row(&mut out, "Business expenses", w2.business_expenses, c.business_expenses);
    row(&mut out, "AGI", w2.agi, c.agi);
    row(&mut out, "Federal income tax", w2.federal_tax, c.federal_tax);
    row(
        &mut out,
        &format!("{} / {}", payroll_label(&w2.payroll), payroll_label(&c.payroll)),
        w2.payroll.total(),
        c.payroll.total(),
    );
    row(&mut out, "State tax", w2.state.tax, c.state.tax);
    if w2.refundable_credits > Decimal::ZERO || c.refundable_credits > Decimal::ZERO {
        row(&mut out, "Refundable credits", w2.refundable_credits, c.refundable_credits);
    }
    row(&mut out, "Total tax", w2.total_tax, c.total_tax);
    row(&mut out, "Net income", w2.net_income, c.net_income);
    let _ = writeln!(
        out,
        "  {:<24}{:>16}{:>16}",
        "Effective rate",
        percent(w2.effective_rate),
        percent(c.effective_rate)
    );

    if let Some(qbi) = &c.qbi {
        let _ = writeln!(out, "  QBI deduction (1099): {}", money(qbi.deduction));
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "1099 minus W-2: {} per year, {} per month",
        money(result.annual_difference),
        money(result.monthly_difference)
    );
    let break_even = &result.break_even;
    if break_even.converged {
        let _ = writeln!(
            out,
            "Break-even 1099 income: {} (net {})",
            money(break_even.income_1099),
            money(break_even.net_income)
        );
    } else {
        let _ = writeln!(
            out,
            "Break-even 1099 income: above {}",
            money(break_even.income_1099)
        );
    }

    if let Some(planning) = &result.planning {
        planning_block(&mut out, planning);
    }
    diagnostics(&mut out, &result.diagnostics);
    out
}

fn path_summary(path: &PathResult) -> String {
    format!("{} net, {} tax", money(path.net_income), money(path.total_tax))
}

fn planning_block(
    out: &mut String,
    planning: &PlanningResult,
) {
    let estimates = &planning.estimated_payments;
    let _ = writeln!(out);
    let _ = writeln!(out, "Estimated payments (1099 path)");
    if let Some(safe_harbor) = &planning.safe_harbor {
        let _ = writeln!(
            out,
            "  Prior-year safe harbor: {} ({} per quarter)",
            money(safe_harbor.annual_required),
            money(safe_harbor.quarterly_required)
        );
    }
    let _ = writeln!(
        out,
        "  Required annual payment: {}",
        money(estimates.required_annual_payment)
    );
    if estimates.estimated_payments_required {
        let _ = writeln!(
            out,
            "  Quarterly installment: {}",
            money(estimates.quarterly_installment)
        );
    } else {
        let _ = writeln!(out, "  Estimated payments are not required");
    }

    if let Some(risk) = &planning.penalty_risk {
        for quarter in &risk.quarters {
            let _ = writeln!(
                out,
                "  Q{} due {}: paid {} of {}{}",
                quarter.quarter,
                quarter.due_date,
                money(quarter.paid_to_date),
                money(quarter.required_to_date),
                if quarter.due { "" } else { " (not yet due)" }
            );
        }
        let _ = writeln!(
            out,
            "  {}",
            if risk.protected {
                "No underpayment so far"
            } else {
                "Underpaid: penalty risk"
            }
        );
    }
}

fn diagnostics(
    out: &mut String,
    diagnostics: &Diagnostics,
) {
    if diagnostics.is_empty() {
        return;
    }
    let _ = writeln!(out);
    for warning in &diagnostics.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    if !diagnostics.missing_inputs.is_empty() {
        let _ = writeln!(
            out,
            "missing inputs (treated as 0): {}",
            diagnostics.missing_inputs.join(", ")
        );
    }
}

pub fn batch(results: &[(String, ScenarioResult)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24}{:>6}{:>5}{:>28}{:>28}{:>16}",
        "Scenario", "Year", "St", "W-2", "1099", "Difference"
    );
    for (name, result) in results {
        let _ = writeln!(
            out,
            "{:<24}{:>6}{:>5}{:>28}{:>28}{:>16}",
            name,
            result.tax_year,
            result.state.as_str(),
            path_summary(&result.w2),
            path_summary(&result.contractor),
            money(result.annual_difference)
        );
    }
    out
}

pub fn self_employment(result: &SeTaxResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Net earnings:          {}", money(result.net_earnings));
    let _ = writeln!(out, "Social security:       {}", money(result.social_security_tax));
    let _ = writeln!(out, "Medicare:              {}", money(result.medicare_tax));
    if result.additional_medicare_tax > Decimal::ZERO {
        let _ = writeln!(
            out,
            "Additional Medicare:   {}",
            money(result.additional_medicare_tax)
        );
    }
    let _ = writeln!(out, "Total SE tax:          {}", money(result.total));
    let _ = writeln!(out, "Deductible half:       {}", money(result.deductible_half));
    out
}

pub fn safe_harbor(result: &SafeHarborResult) -> String {
    format!(
        "Pay {} ({}% of prior-year tax), {} per quarter\n",
        money(result.annual_required),
        (result.multiplier * Decimal::ONE_HUNDRED).normalize(),
        money(result.quarterly_required)
    )
}
