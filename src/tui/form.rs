//! Editable application form for the dashboard's Application page.
//!
//! Numeric fields are typed into a buffer and committed on Enter; categorical
//! fields cycle with Left/Right.

use crate::data::{EDUCATION_LEVELS, MARITAL_STATUSES};
use crate::domain::Application;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Age,
    Income,
    CreditScore,
    DebtToIncome,
    LoanAmount,
    EmploymentLength,
    CreditLines,
    LatePayments,
    Utilization,
    Inquiries,
    ExistingLoans,
    Savings,
    MonthlyExpenses,
    Education,
    MaritalStatus,
    Dependents,
    Property,
    BusinessOwner,
    HistoryLength,
    IndustryRisk,
    GeographicRisk,
}

impl FormField {
    pub const ALL: [FormField; 21] = [
        FormField::Age,
        FormField::Income,
        FormField::CreditScore,
        FormField::DebtToIncome,
        FormField::LoanAmount,
        FormField::EmploymentLength,
        FormField::CreditLines,
        FormField::LatePayments,
        FormField::Utilization,
        FormField::Inquiries,
        FormField::ExistingLoans,
        FormField::Savings,
        FormField::MonthlyExpenses,
        FormField::Education,
        FormField::MaritalStatus,
        FormField::Dependents,
        FormField::Property,
        FormField::BusinessOwner,
        FormField::HistoryLength,
        FormField::IndustryRisk,
        FormField::GeographicRisk,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Age => "Age",
            FormField::Income => "Annual income (₹)",
            FormField::CreditScore => "Bureau score",
            FormField::DebtToIncome => "Debt-to-income",
            FormField::LoanAmount => "Loan amount (₹)",
            FormField::EmploymentLength => "Employment (yrs)",
            FormField::CreditLines => "Credit lines",
            FormField::LatePayments => "Late payments 90d",
            FormField::Utilization => "Utilization",
            FormField::Inquiries => "Recent inquiries",
            FormField::ExistingLoans => "Existing loans",
            FormField::Savings => "Savings (₹)",
            FormField::MonthlyExpenses => "Monthly expenses (₹)",
            FormField::Education => "Education",
            FormField::MaritalStatus => "Marital status",
            FormField::Dependents => "Dependents",
            FormField::Property => "Property",
            FormField::BusinessOwner => "Business owner",
            FormField::HistoryLength => "Credit history (yrs)",
            FormField::IndustryRisk => "Industry risk",
            FormField::GeographicRisk => "Geographic risk",
        }
    }

    /// Categorical fields cycle instead of taking typed input.
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            FormField::Education
                | FormField::MaritalStatus
                | FormField::Property
                | FormField::BusinessOwner
                | FormField::IndustryRisk
                | FormField::GeographicRisk
        )
    }

    pub fn value(self, app: &Application) -> String {
        match self {
            FormField::Age => app.age.to_string(),
            FormField::Income => format!("{:.0}", app.income),
            FormField::CreditScore => app.credit_score.to_string(),
            FormField::DebtToIncome => format!("{:.2}", app.debt_to_income),
            FormField::LoanAmount => format!("{:.0}", app.loan_amount),
            FormField::EmploymentLength => format!("{:.1}", app.employment_length),
            FormField::CreditLines => app.number_of_credit_lines.to_string(),
            FormField::LatePayments => app.late_payments_90d.to_string(),
            FormField::Utilization => format!("{:.2}", app.credit_utilization),
            FormField::Inquiries => app.recent_inquiries.to_string(),
            FormField::ExistingLoans => app.existing_loans.to_string(),
            FormField::Savings => format!("{:.0}", app.savings_balance),
            FormField::MonthlyExpenses => format!("{:.0}", app.monthly_expenses),
            FormField::Education => app.education_level.clone(),
            FormField::MaritalStatus => app.marital_status.clone(),
            FormField::Dependents => app.dependents.to_string(),
            FormField::Property => app.property_ownership.display_name().to_string(),
            FormField::BusinessOwner => if app.business_owner { "Yes" } else { "No" }.to_string(),
            FormField::HistoryLength => format!("{:.1}", app.credit_history_length),
            FormField::IndustryRisk => app.industry_risk.display_name().to_string(),
            FormField::GeographicRisk => app.geographic_risk.display_name().to_string(),
        }
    }

    /// Parse typed input into the field. Range checks are left to
    /// `Application::validate`.
    pub fn set(self, app: &mut Application, input: &str) -> Result<(), String> {
        let input = input.trim();
        let int = || {
            input
                .parse::<u32>()
                .map_err(|_| format!("{}: expected a whole number, got '{input}'", self.label()))
        };
        let num = || {
            input
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("{}: expected a number, got '{input}'", self.label()))
        };

        match self {
            FormField::Age => app.age = int()?,
            FormField::Income => app.income = num()?,
            FormField::CreditScore => app.credit_score = int()?,
            FormField::DebtToIncome => app.debt_to_income = num()?,
            FormField::LoanAmount => app.loan_amount = num()?,
            FormField::EmploymentLength => app.employment_length = num()?,
            FormField::CreditLines => app.number_of_credit_lines = int()?,
            FormField::LatePayments => app.late_payments_90d = int()?,
            FormField::Utilization => app.credit_utilization = num()?,
            FormField::Inquiries => app.recent_inquiries = int()?,
            FormField::ExistingLoans => app.existing_loans = int()?,
            FormField::Savings => app.savings_balance = num()?,
            FormField::MonthlyExpenses => app.monthly_expenses = num()?,
            FormField::Dependents => app.dependents = int()?,
            FormField::HistoryLength => app.credit_history_length = num()?,
            _ => return Err(format!("{} is chosen with ←/→", self.label())),
        }
        Ok(())
    }

    /// Move a categorical field to its next (or previous) option.
    pub fn cycle(self, app: &mut Application, forward: bool) {
        match self {
            FormField::Education => {
                app.education_level = step_str(&EDUCATION_LEVELS, &app.education_level, forward);
            }
            FormField::MaritalStatus => {
                app.marital_status = step_str(&MARITAL_STATUSES, &app.marital_status, forward);
            }
            FormField::Property => {
                app.property_ownership = if forward {
                    app.property_ownership.next()
                } else {
                    app.property_ownership.prev()
                };
            }
            FormField::BusinessOwner => app.business_owner = !app.business_owner,
            FormField::IndustryRisk => {
                app.industry_risk = if forward {
                    app.industry_risk.next()
                } else {
                    app.industry_risk.prev()
                };
            }
            FormField::GeographicRisk => {
                app.geographic_risk = if forward {
                    app.geographic_risk.next()
                } else {
                    app.geographic_risk.prev()
                };
            }
            _ => {}
        }
    }
}

/// Next option after `current`; unknown values restart at the first option.
fn step_str(options: &[&str], current: &str, forward: bool) -> String {
    let n = options.len();
    let next = match options.iter().position(|o| o.eq_ignore_ascii_case(current)) {
        Some(i) if forward => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
        None => 0,
    };
    options[next].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PropertyOwnership, RiskBand};

    #[test]
    fn typed_values_are_parsed_per_field() {
        let mut app = Application::default();
        FormField::Income.set(&mut app, " 1250000 ").unwrap();
        FormField::Age.set(&mut app, "41").unwrap();
        FormField::Utilization.set(&mut app, "0.15").unwrap();
        assert_eq!(app.income, 1_250_000.0);
        assert_eq!(app.age, 41);
        assert_eq!(app.credit_utilization, 0.15);
        assert_eq!(FormField::Income.value(&app), "1250000");
    }

    #[test]
    fn bad_input_leaves_the_field_alone() {
        let mut app = Application::default();
        assert!(FormField::Age.set(&mut app, "4.5").is_err());
        assert!(FormField::Savings.set(&mut app, "lots").is_err());
        assert!(FormField::Property.set(&mut app, "1").is_err());
        assert_eq!(app, Application::default());
    }

    #[test]
    fn choices_cycle_both_ways() {
        let mut app = Application::default();
        FormField::Property.cycle(&mut app, true);
        assert_eq!(app.property_ownership, PropertyOwnership::Mortgaged);
        FormField::Property.cycle(&mut app, false);
        FormField::Property.cycle(&mut app, false);
        assert_eq!(app.property_ownership, PropertyOwnership::Other);

        FormField::IndustryRisk.cycle(&mut app, false);
        assert_eq!(app.industry_risk, RiskBand::Low);

        FormField::Education.cycle(&mut app, true);
        assert_eq!(app.education_level, "Post Graduate");
        FormField::BusinessOwner.cycle(&mut app, true);
        assert!(app.business_owner);
    }

    #[test]
    fn unknown_text_choice_restarts_the_list() {
        let mut app = Application {
            marital_status: "Widowed".to_string(),
            ..Application::default()
        };
        FormField::MaritalStatus.cycle(&mut app, true);
        assert_eq!(app.marital_status, "Single");
    }
}
