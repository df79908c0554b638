use serde::{Deserialize, Serialize};

/// One PPP loan as stored in the `ppp_loans` table. Field names are the table's
/// column names; `None` is written as `null` so "unknown" stays distinct from
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Business key and upsert conflict target. Passed through unvalidated.
    pub loan_number: Option<String>,
    pub date_approved: Option<String>,
    pub borrower_name: Option<String>,
    pub borrower_address: Option<String>,
    pub borrower_city: Option<String>,
    pub borrower_state: Option<String>,
    pub borrower_zip: Option<String>,
    pub initial_approval_amount: Option<f64>,
    pub current_approval_amount: Option<f64>,
    pub forgiveness_amount: Option<f64>,
    pub forgiveness_date: Option<String>,
    pub loan_status: Option<String>,
    pub jobs_reported: Option<i64>,
    pub naics_code: Option<String>,
    pub business_type: Option<String>,
    pub lender_name: Option<String>,
    pub payroll_proceed: Option<f64>,
    pub rent_proceed: Option<f64>,
    pub utilities_proceed: Option<f64>,
    pub is_nonprofit: bool,
}

impl LoanRecord {
    /// Name used when reporting a failed write.
    pub fn display_name(&self) -> &str {
        self.borrower_name.as_deref().unwrap_or("<unnamed borrower>")
    }

    pub fn loan_number_or_blank(&self) -> &str {
        self.loan_number.as_deref().unwrap_or("")
    }
}
