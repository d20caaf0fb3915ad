//! The asset entry form, as command-line flags and as interactive prompts.
//!
//! Neither form checks anything: both collect raw text into
//! [`CandidateFields`] and leave validation to the register.

use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use iar::{
    domain::{
        record::flag_label,
        schema::{LOCATION_PRESETS, OTHER},
        BreachActionsStatus, Choice, RopaStatus, SharedExternally,
    },
    CandidateFields, Field,
};

/// Asset fields supplied as flags.
#[derive(Debug, Default, clap::Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldArgs {
    /// Name of the information asset (required)
    #[arg(long, short = 'n')]
    asset_name: Option<String>,

    /// Information asset owner (required)
    #[arg(long, short = 'o')]
    owner: Option<String>,

    /// Supplier name
    #[arg(long)]
    supplier: Option<String>,

    /// Where the physical or digital contract is stored
    #[arg(long)]
    contract_location: Option<String>,

    /// Contract period, e.g. "01/2024 - 01/2025"
    #[arg(long)]
    contract_dates: Option<String>,

    /// The type of data held and the business reason for keeping it
    #[arg(long)]
    purpose: Option<String>,

    /// Where the asset lives (required). Use "Other" together with
    /// --location-other to give a location of your own.
    #[arg(long, short = 'l')]
    location: Option<String>,

    /// The location to record when --location is "Other"
    #[arg(long)]
    location_other: Option<String>,

    /// The asset contains special category data
    #[arg(long)]
    special_category: bool,

    /// Whether the asset is shared externally: no, received, shared or both
    #[arg(long, value_name = "SHARING")]
    shared_externally: Option<String>,

    /// Whether the asset is on the Record of Processing Activities: yes, no
    /// or "under review". A shared asset without one is under review.
    #[arg(long, value_name = "STATUS")]
    ropa_status: Option<String>,

    /// Risks should the asset be breached
    #[arg(long)]
    breach_risks: Option<String>,

    /// Measures protecting the asset
    #[arg(long)]
    security_measures: Option<String>,

    /// The asset is a mobile device
    #[arg(long)]
    mobile_device: bool,

    /// Date the device was issued (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "mobile_device")]
    date_issued: Option<String>,

    /// Date the device was returned (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "mobile_device")]
    date_returned: Option<String>,

    /// Date of the last audit (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_name = "DATE")]
    last_audit: Option<String>,

    /// There has been a breach since the last audit
    #[arg(long)]
    breach_since_audit: bool,

    /// Whether all actions following the breach have been taken: yes, no or
    /// "in progress". Defaults to in progress with --breach-since-audit.
    #[arg(long, value_name = "STATUS")]
    breach_actions: Option<String>,
}

impl FieldArgs {
    /// Collects the flags into a candidate record.
    pub fn into_candidate(self, today: NaiveDate) -> CandidateFields {
        let text = [
            (Field::AssetName, self.asset_name),
            (Field::Owner, self.owner),
            (Field::Supplier, self.supplier),
            (Field::ContractLocation, self.contract_location),
            (Field::ContractDates, self.contract_dates),
            (Field::Purpose, self.purpose),
            (Field::Location, self.location),
            (Field::LocationOther, self.location_other),
            (Field::SharedExternally, self.shared_externally),
            (Field::RopaStatus, self.ropa_status),
            (Field::BreachRisks, self.breach_risks),
            (Field::SecurityMeasures, self.security_measures),
            (Field::DateIssued, self.date_issued),
            (Field::DateReturned, self.date_returned),
            (
                Field::LastAuditDate,
                Some(self.last_audit.unwrap_or_else(|| today.to_string())),
            ),
            (Field::BreachActionsStatus, self.breach_actions),
        ];
        let flags = [
            (Field::SpecialCategoryData, self.special_category),
            (Field::IsMobileDevice, self.mobile_device),
            (Field::BreachSinceAudit, self.breach_since_audit),
        ];

        text.into_iter()
            .filter_map(|(field, value)| value.map(|value| (field, value)))
            .chain(
                flags
                    .into_iter()
                    .map(|(field, value)| (field, flag_label(value).to_string())),
            )
            .collect()
    }
}

/// Asks for every field of a new asset.
///
/// Conditional questions are only asked when the answer they depend on
/// makes them apply.
pub fn prompt(today: NaiveDate) -> anyhow::Result<CandidateFields> {
    let form = Form {
        theme: ColorfulTheme::default(),
        candidate: CandidateFields::new(),
    };
    form.run(today)
}

struct Form {
    theme: ColorfulTheme,
    candidate: CandidateFields,
}

impl Form {
    fn run(mut self, today: NaiveDate) -> anyhow::Result<CandidateFields> {
        println!("Core identity");
        self.text(Field::AssetName, "1. Information Asset Name*")?;
        self.text(Field::Owner, "6. Information Asset Owner*")?;

        println!("Supply chain");
        self.text(Field::Supplier, "2a. Supplier Name")?;
        self.text(Field::ContractLocation, "2b. Contract Location")?;
        self.text(Field::ContractDates, "2c. Contract Dates (e.g. 01/2024 - 01/2025)")?;

        println!("Data scope");
        self.text(Field::Purpose, "3. What & Why?")?;
        let location = self.select(Field::Location, "4. Location*", LOCATION_PRESETS)?;
        if LOCATION_PRESETS[location] == OTHER {
            self.text(Field::LocationOther, "4a. Specify the location")?;
        }
        self.confirm(
            Field::SpecialCategoryData,
            "5. Does this contain special category data?",
        )?;

        println!("External sharing");
        let shared = self.select(
            Field::SharedExternally,
            "7. Is the information shared externally?",
            SharedExternally::LABELS,
        )?;
        if SharedExternally::LABELS[shared] != SharedExternally::None.label() {
            self.select(
                Field::RopaStatus,
                "8. Is this on the Record of Processing Activities (ROPA)?",
                applicable(RopaStatus::LABELS, RopaStatus::NotApplicable.label()),
            )?;
        }

        println!("Risk & governance");
        self.text(Field::BreachRisks, "9. Breach Risks")?;
        self.text(Field::SecurityMeasures, "10. Security Measures")?;
        if self.confirm(Field::IsMobileDevice, "This is a mobile device")? {
            self.text(Field::DateIssued, "11. Date Issued (YYYY-MM-DD)")?;
            self.text(Field::DateReturned, "12. Date Returned (YYYY-MM-DD)")?;
        }

        println!("Audit trail");
        let last_audit = Input::<String>::with_theme(&self.theme)
            .with_prompt("13. Date of Last Audit (YYYY-MM-DD)")
            .default(today.to_string())
            .interact_text()?;
        self.candidate.insert(Field::LastAuditDate, last_audit);
        if self.confirm(Field::BreachSinceAudit, "14. Breach since last audit?")? {
            self.select(
                Field::BreachActionsStatus,
                "15. All actions taken?",
                applicable(
                    BreachActionsStatus::LABELS,
                    BreachActionsStatus::NotApplicable.label(),
                ),
            )?;
        }

        Ok(self.candidate)
    }

    fn text(&mut self, field: Field, prompt: &str) -> anyhow::Result<()> {
        let value = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        self.candidate.insert(field, value);
        Ok(())
    }

    fn select(&mut self, field: Field, prompt: &str, labels: &[&str]) -> anyhow::Result<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(labels)
            .default(0)
            .interact()?;
        self.candidate.insert(field, labels[index]);
        Ok(index)
    }

    fn confirm(&mut self, field: Field, prompt: &str) -> anyhow::Result<bool> {
        let value = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        self.candidate.insert(field, flag_label(value));
        Ok(value)
    }
}

/// The labels a user may pick once a condition holds: every label but the
/// not-applicable sentinel, which is last.
fn applicable<'a>(labels: &'a [&'static str], not_applicable: &str) -> &'a [&'static str] {
    labels
        .split_last()
        .filter(|(last, _)| **last == not_applicable)
        .map_or(labels, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use iar::Schema;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        fields: FieldArgs,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn flags_build_a_valid_candidate() {
        let harness = Harness::parse_from([
            "test",
            "--asset-name",
            "Payroll Spreadsheet",
            "--owner",
            "Jane Smith",
            "--location",
            "Other",
            "--location-other",
            "Basement safe",
            "--shared-externally",
            "both",
            "--ropa-status",
            "under review",
        ]);
        let candidate = harness.fields.into_candidate(today());

        assert_eq!(candidate.get(Field::LastAuditDate), Some("2024-01-15"));
        assert_eq!(candidate.get(Field::IsMobileDevice), Some("No"));

        let record = Schema::resolve(&candidate).unwrap();
        assert_eq!(record.location(), "Basement safe");
        assert_eq!(record.ropa_status(), RopaStatus::UnderReview);
    }

    #[test]
    fn device_dates_require_the_mobile_flag() {
        let result = Harness::try_parse_from(["test", "--date-issued", "2024-01-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn applicable_drops_the_sentinel() {
        assert_eq!(
            applicable(RopaStatus::LABELS, "N/A"),
            &["Yes", "No", "Under Review"]
        );
        assert_eq!(applicable(&["a", "b"], "N/A"), &["a", "b"]);
    }
}
