//! The record schema.
//!
//! [`Field`] enumerates every field a form can supply, and [`Schema`] holds
//! the rules that turn a [`CandidateFields`] into an [`AssetRecord`]: which
//! fields are required, which enumerations are allowed, and which fields only
//! apply while another field holds.
//!
//! The schema is fixed at compile time.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use non_empty_string::NonEmptyString;
use nonempty::NonEmpty;

use crate::domain::{
    candidate::CandidateFields,
    record::{
        normalize, parse_flag, AssetRecord, BreachActionsStatus, Choice, Conditional, RopaStatus,
        SharedExternally,
    },
};

/// The value a location field takes when the user supplies their own text in
/// [`Field::LocationOther`].
pub const OTHER: &str = "Other";

/// Suggested values for [`Field::Location`].
///
/// Any non-empty text is a valid location; these are what a form offers.
pub const LOCATION_PRESETS: &[&str] = &[
    "Cloud Storage",
    "Network Drive",
    "Local Device",
    "Physical Filing Cabinet",
    "Third-Party System",
    OTHER,
];

/// A field of an asset record.
///
/// Variants are declared in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Name of the information asset.
    AssetName,
    /// Information asset owner.
    Owner,
    /// Supplier name.
    Supplier,
    /// Where the supplier contract is kept.
    ContractLocation,
    /// Free-form contract period.
    ContractDates,
    /// What data is held, and why.
    Purpose,
    /// Where the asset lives.
    Location,
    /// Free text standing in for [`Field::Location`] when it is "Other".
    ///
    /// Input only: never stored or exported.
    LocationOther,
    /// Whether the asset holds special category data.
    SpecialCategoryData,
    /// Whether the asset is shared outside the organisation.
    SharedExternally,
    /// Whether the asset is on the Record of Processing Activities.
    RopaStatus,
    /// Risks should the asset be breached.
    BreachRisks,
    /// Measures protecting the asset.
    SecurityMeasures,
    /// Whether the asset is a mobile device.
    IsMobileDevice,
    /// When the device was issued.
    DateIssued,
    /// When the device was returned.
    DateReturned,
    /// Date of the last audit.
    LastAuditDate,
    /// Whether there has been a breach since the last audit.
    BreachSinceAudit,
    /// Whether all post-breach actions have been taken.
    BreachActionsStatus,
}

/// How a field's text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// `Yes` or `No`.
    Flag,
    /// An ISO 8601 calendar date.
    Date,
    /// One of a fixed set of labels.
    Choice(&'static [&'static str]),
}

/// Whether a field must be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present and non-empty.
    Required,
    /// May be omitted.
    Optional,
    /// Only applies while the governing field holds; otherwise it is stored as
    /// not applicable.
    Conditional {
        /// The field the condition is read from.
        on: Field,
    },
    /// Replaces another field's value when that field is [`OTHER`].
    Companion {
        /// The field this one stands in for.
        of: Field,
    },
}

impl Field {
    /// Every field, including input-only ones.
    pub const ALL: [Self; 19] = [
        Self::AssetName,
        Self::Owner,
        Self::Supplier,
        Self::ContractLocation,
        Self::ContractDates,
        Self::Purpose,
        Self::Location,
        Self::LocationOther,
        Self::SpecialCategoryData,
        Self::SharedExternally,
        Self::RopaStatus,
        Self::BreachRisks,
        Self::SecurityMeasures,
        Self::IsMobileDevice,
        Self::DateIssued,
        Self::DateReturned,
        Self::LastAuditDate,
        Self::BreachSinceAudit,
        Self::BreachActionsStatus,
    ];

    /// The snake case key used by forms.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::AssetName => "asset_name",
            Self::Owner => "owner",
            Self::Supplier => "supplier",
            Self::ContractLocation => "contract_location",
            Self::ContractDates => "contract_dates",
            Self::Purpose => "purpose",
            Self::Location => "location",
            Self::LocationOther => "location_other",
            Self::SpecialCategoryData => "special_category_data",
            Self::SharedExternally => "shared_externally",
            Self::RopaStatus => "ropa_status",
            Self::BreachRisks => "breach_risks",
            Self::SecurityMeasures => "security_measures",
            Self::IsMobileDevice => "is_mobile_device",
            Self::DateIssued => "date_issued",
            Self::DateReturned => "date_returned",
            Self::LastAuditDate => "last_audit_date",
            Self::BreachSinceAudit => "breach_since_audit",
            Self::BreachActionsStatus => "breach_actions_status",
        }
    }

    /// The column header used in exported files.
    ///
    /// Where the first release of the register tool already exported a
    /// column, the same header is kept.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::AssetName => "Asset Name",
            Self::Owner => "Owner",
            Self::Supplier => "Supplier",
            Self::ContractLocation => "Contract Location",
            Self::ContractDates => "Contract Dates",
            Self::Purpose => "Purpose",
            Self::Location => "Location",
            Self::LocationOther => "Location (Other)",
            Self::SpecialCategoryData => "Special Category Data",
            Self::SharedExternally => "Shared Externally",
            Self::RopaStatus => "ROPA Status",
            Self::BreachRisks => "Breach Risks",
            Self::SecurityMeasures => "Security Measures",
            Self::IsMobileDevice => "Mobile Device",
            Self::DateIssued => "Date Issued",
            Self::DateReturned => "Date Returned",
            Self::LastAuditDate => "Last Audit",
            Self::BreachSinceAudit => "Breach Since Audit",
            Self::BreachActionsStatus => "Breach Actions Status",
        }
    }

    /// Other names this field has gone by, in normalized form.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::AssetName => &["name", "information_asset_name"],
            Self::Owner => &["asset_owner", "information_asset_owner"],
            Self::Supplier => &["supplier_name"],
            Self::Purpose => &["what_why"],
            Self::SpecialCategoryData => &["special_category"],
            Self::SharedExternally => &["is_shared"],
            Self::RopaStatus => &["ropa"],
            Self::IsMobileDevice => &["mobile"],
            Self::LastAuditDate => &["audit", "date_of_last_audit"],
            Self::BreachActionsStatus => &["breach_actions", "all_actions_taken"],
            _ => &[],
        }
    }

    /// How the field's text is interpreted.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::SpecialCategoryData | Self::IsMobileDevice | Self::BreachSinceAudit => {
                FieldKind::Flag
            }
            Self::DateIssued | Self::DateReturned | Self::LastAuditDate => FieldKind::Date,
            Self::SharedExternally => FieldKind::Choice(SharedExternally::LABELS),
            Self::RopaStatus => FieldKind::Choice(RopaStatus::LABELS),
            Self::BreachActionsStatus => FieldKind::Choice(BreachActionsStatus::LABELS),
            _ => FieldKind::Text,
        }
    }

    /// Whether the field must be supplied.
    #[must_use]
    pub const fn presence(self) -> Presence {
        match self {
            Self::AssetName | Self::Owner | Self::Location | Self::LastAuditDate => {
                Presence::Required
            }
            Self::LocationOther => Presence::Companion { of: Self::Location },
            Self::RopaStatus => Presence::Conditional {
                on: Self::SharedExternally,
            },
            Self::DateIssued | Self::DateReturned => Presence::Conditional {
                on: Self::IsMobileDevice,
            },
            Self::BreachActionsStatus => Presence::Conditional {
                on: Self::BreachSinceAudit,
            },
            _ => Presence::Optional,
        }
    }

    /// Whether the field is a stored column.
    #[must_use]
    pub const fn is_column(self) -> bool {
        !matches!(self.presence(), Presence::Companion { .. })
    }

    /// Looks up a field by key, header or a historical alias.
    ///
    /// Matching ignores case, surrounding whitespace and punctuation.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = normalize(name);
        if name.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|field| {
            name == field.key()
                || name == normalize(field.header())
                || field.aliases().contains(&name.as_str())
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

/// Error returned when a name does not identify any field.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown field '{0}'")]
pub struct UnknownFieldError(String);

/// Why a field failed validation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Reason {
    /// A required field is absent or blank.
    #[error("is required")]
    Missing,
    /// A conditional field is "N/A" while its condition holds.
    #[error("cannot be N/A when {governing} is {value}")]
    NotApplicableWhen {
        /// The governing field.
        governing: Field,
        /// The governing field's value.
        value: String,
    },
    /// The companion of an "Other" selection is absent.
    #[error("must be given when {of} is 'Other'")]
    CompanionMissing {
        /// The field set to "Other".
        of: Field,
    },
    /// The companion of an "Other" selection is itself "Other".
    #[error("must name the location when {of} is 'Other'")]
    CompanionIsOther {
        /// The field set to "Other".
        of: Field,
    },
    /// An enumerated field holds a value outside its set.
    #[error("'{value}' is not one of: {}", .allowed.join(", "))]
    NotAllowed {
        /// The rejected text.
        value: String,
        /// The accepted labels.
        allowed: &'static [&'static str],
    },
    /// A flag is not `Yes` or `No`.
    #[error("'{0}' is not Yes or No")]
    InvalidFlag(String),
    /// A date is not an ISO 8601 calendar date.
    #[error("'{0}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// A single field that failed validation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{field} {reason}")]
pub struct FieldFailure {
    /// The offending field.
    pub field: Field,
    /// What is wrong with it.
    pub reason: Reason,
}

/// A candidate record that failed validation.
///
/// Always names at least one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    failures: NonEmpty<FieldFailure>,
}

impl ValidationError {
    /// Every failing field.
    #[must_use]
    pub const fn failures(&self) -> &NonEmpty<FieldFailure> {
        &self.failures
    }

    /// The failing fields.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.failures.iter().map(|failure| failure.field)
    }

    /// Whether the given field is among the failures.
    #[must_use]
    pub fn names(&self, field: Field) -> bool {
        self.fields().any(|f| f == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid asset record: ")?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The record schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct Schema;

impl Schema {
    const COLUMNS: [Field; 18] = [
        Field::AssetName,
        Field::Owner,
        Field::Supplier,
        Field::ContractLocation,
        Field::ContractDates,
        Field::Purpose,
        Field::Location,
        Field::SpecialCategoryData,
        Field::SharedExternally,
        Field::RopaStatus,
        Field::BreachRisks,
        Field::SecurityMeasures,
        Field::IsMobileDevice,
        Field::DateIssued,
        Field::DateReturned,
        Field::LastAuditDate,
        Field::BreachSinceAudit,
        Field::BreachActionsStatus,
    ];

    /// The stored columns, in export order.
    #[must_use]
    pub const fn columns() -> &'static [Field] {
        &Self::COLUMNS
    }

    /// The columns an imported table must carry.
    pub fn required_columns() -> impl Iterator<Item = Field> {
        Self::COLUMNS
            .into_iter()
            .filter(|field| field.presence() == Presence::Required)
    }

    /// Checks a candidate against the schema without building a record.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(candidate: &CandidateFields) -> Result<(), ValidationError> {
        Self::resolve(candidate).map(drop)
    }

    /// Builds a record from a candidate.
    ///
    /// Conditional fields are resolved against their governing field: when
    /// the condition does not hold they become not applicable, whatever the
    /// candidate says. When it holds, an absent ROPA status reads as
    /// "Under Review" and an absent breach actions status as "In Progress".
    /// A location of "Other" is replaced by the text of
    /// [`Field::LocationOther`].
    ///
    /// # Errors
    ///
    /// Returns every failing field, not just the first.
    pub fn resolve(candidate: &CandidateFields) -> Result<AssetRecord, ValidationError> {
        let mut r = Resolver {
            candidate,
            failures: Vec::new(),
        };

        let asset_name = r.required_text(Field::AssetName);
        let owner = r.required_text(Field::Owner);
        let location = r.location();
        let special_category_data = r.flag(Field::SpecialCategoryData);

        let shared_externally = r
            .choice::<SharedExternally>(Field::SharedExternally)
            .unwrap_or_default();
        let ropa_status = if shared_externally.is_shared() {
            r.applicable_choice(
                Field::RopaStatus,
                Field::SharedExternally,
                RopaStatus::UnderReview,
                RopaStatus::NotApplicable,
            )
        } else {
            Ok(RopaStatus::NotApplicable)
        };

        let is_mobile_device = r.flag(Field::IsMobileDevice);
        let (date_issued, date_returned) = if is_mobile_device {
            (
                Conditional::Value(r.date(Field::DateIssued)),
                Conditional::Value(r.date(Field::DateReturned)),
            )
        } else {
            (Conditional::NotApplicable, Conditional::NotApplicable)
        };

        let last_audit_date = r.required_date(Field::LastAuditDate);

        let breach_since_audit = r.flag(Field::BreachSinceAudit);
        let breach_actions_status = if breach_since_audit {
            r.applicable_choice(
                Field::BreachActionsStatus,
                Field::BreachSinceAudit,
                BreachActionsStatus::InProgress,
                BreachActionsStatus::NotApplicable,
            )
        } else {
            Ok(BreachActionsStatus::NotApplicable)
        };

        let others = NonEmpty::from_vec(r.failures).map_or(Ok(()), Err);
        let required = zip(
            zip(asset_name, owner),
            zip(location, last_audit_date),
        );
        let conditional = zip(zip(ropa_status, breach_actions_status), others);
        let (
            ((asset_name, owner), (location, last_audit_date)),
            ((ropa_status, breach_actions_status), ()),
        ) = zip(required, conditional).map_err(|failures| ValidationError { failures })?;

        Ok(AssetRecord {
            asset_name,
            owner,
            supplier: optional_text(candidate, Field::Supplier),
            contract_location: optional_text(candidate, Field::ContractLocation),
            contract_dates: optional_text(candidate, Field::ContractDates),
            purpose: optional_text(candidate, Field::Purpose),
            location,
            special_category_data,
            shared_externally,
            ropa_status,
            breach_risks: optional_text(candidate, Field::BreachRisks),
            security_measures: optional_text(candidate, Field::SecurityMeasures),
            is_mobile_device,
            date_issued,
            date_returned,
            last_audit_date,
            breach_since_audit,
            breach_actions_status,
        })
    }
}

/// A value, or every failure met while reading it.
type Checked<T> = Result<T, NonEmpty<FieldFailure>>;

/// Pairs two checked values, keeping the failures of both.
fn zip<A, B>(a: Checked<A>, b: Checked<B>) -> Checked<(A, B)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(failures), Ok(_)) | (Ok(_), Err(failures)) => Err(failures),
        (Err(mut failures), Err(more)) => {
            failures.extend(more);
            Err(failures)
        }
    }
}

fn is_other(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(OTHER)
}

/// Optional text is stored verbatim; blank text is stored as empty.
fn optional_text(candidate: &CandidateFields, field: Field) -> String {
    candidate.text(field).map(str::to_string).unwrap_or_default()
}

fn failure<T>(field: Field, reason: Reason) -> Checked<T> {
    Err(NonEmpty::new(FieldFailure { field, reason }))
}

/// Reads a candidate. Values a record cannot do without come back as
/// [`Checked`]; the rest fall back to a default and record their failure.
struct Resolver<'a> {
    candidate: &'a CandidateFields,
    failures: Vec<FieldFailure>,
}

impl Resolver<'_> {
    fn fail(&mut self, field: Field, reason: Reason) {
        self.failures.push(FieldFailure { field, reason });
    }

    fn required_text(&self, field: Field) -> Checked<NonEmptyString> {
        self.candidate
            .text(field)
            .and_then(|text| NonEmptyString::new(text.to_string()).ok())
            .map_or_else(|| failure(field, Reason::Missing), Ok)
    }

    fn location(&self) -> Checked<NonEmptyString> {
        let location = self.required_text(Field::Location)?;
        if !is_other(location.as_str()) {
            return Ok(location);
        }
        match self.candidate.text(Field::LocationOther) {
            None => failure(
                Field::LocationOther,
                Reason::CompanionMissing { of: Field::Location },
            ),
            Some(text) if is_other(text) => failure(
                Field::LocationOther,
                Reason::CompanionIsOther { of: Field::Location },
            ),
            Some(_) => self.required_text(Field::LocationOther),
        }
    }

    /// Absent or blank flags read as `false`.
    fn flag(&mut self, field: Field) -> bool {
        let candidate = self.candidate;
        let Some(text) = candidate.text(field) else {
            return false;
        };
        parse_flag(text).unwrap_or_else(|| {
            self.fail(field, Reason::InvalidFlag(text.to_string()));
            false
        })
    }

    /// Absent or blank dates read as `None`.
    fn date(&mut self, field: Field) -> Option<NaiveDate> {
        let candidate = self.candidate;
        let text = candidate.text(field)?;
        let date = parse_date(text);
        if date.is_none() {
            self.fail(field, Reason::InvalidDate(text.to_string()));
        }
        date
    }

    fn required_date(&self, field: Field) -> Checked<NaiveDate> {
        let Some(text) = self.candidate.text(field) else {
            return failure(field, Reason::Missing);
        };
        parse_date(text)
            .map_or_else(|| failure(field, Reason::InvalidDate(text.to_string())), Ok)
    }

    /// Absent choices read as `None` without a failure.
    fn choice<T: Choice>(&mut self, field: Field) -> Option<T> {
        let candidate = self.candidate;
        let text = candidate.text(field)?;
        let value = T::parse(text);
        if value.is_none() {
            self.fail(
                field,
                Reason::NotAllowed {
                    value: text.to_string(),
                    allowed: T::LABELS,
                },
            );
        }
        value
    }

    /// A choice whose governing condition holds. It may not be the
    /// not-applicable sentinel; when absent it takes `default`.
    fn applicable_choice<T: Choice + PartialEq>(
        &self,
        field: Field,
        governing: Field,
        default: T,
        not_applicable: T,
    ) -> Checked<T> {
        let Some(text) = self.candidate.text(field) else {
            return Ok(default);
        };
        match T::parse(text) {
            None => failure(
                field,
                Reason::NotAllowed {
                    value: text.to_string(),
                    allowed: T::LABELS,
                },
            ),
            Some(value) if value == not_applicable => {
                let value = self
                    .candidate
                    .get(governing)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                failure(field, Reason::NotApplicableWhen { governing, value })
            }
            Some(value) => Ok(value),
        }
    }
}

/// Parses an ISO 8601 calendar date.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn payroll() -> CandidateFields {
        CandidateFields::new()
            .with(Field::AssetName, "Payroll Spreadsheet")
            .with(Field::Owner, "Jane Smith")
            .with(Field::Location, "Network Drive")
            .with(Field::LastAuditDate, "2024-01-15")
            .with(Field::IsMobileDevice, "No")
            .with(Field::SharedExternally, "No")
    }

    #[test]
    fn resolves_minimal_record() {
        let record = Schema::resolve(&payroll()).unwrap();

        assert_eq!(record.asset_name(), "Payroll Spreadsheet");
        assert_eq!(record.owner(), "Jane Smith");
        assert_eq!(record.ropa_status(), RopaStatus::NotApplicable);
        assert_eq!(record.date_issued(), Conditional::NotApplicable);
        assert_eq!(record.date_returned(), Conditional::NotApplicable);
        assert_eq!(
            record.breach_actions_status(),
            BreachActionsStatus::NotApplicable
        );
        assert_eq!(
            record.last_audit_date(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test_case(Field::AssetName)]
    #[test_case(Field::Owner)]
    #[test_case(Field::Location)]
    #[test_case(Field::LastAuditDate)]
    fn blank_required_field_is_named(field: Field) {
        let candidate = payroll().with(field, "");
        let error = Schema::validate(&candidate).unwrap_err();

        assert_eq!(error.failures().len(), 1);
        assert_eq!(error.failures().first().field, field);
        assert_eq!(error.failures().first().reason, Reason::Missing);
    }

    #[test]
    fn reports_every_failure_at_once() {
        let candidate = CandidateFields::new().with(Field::LastAuditDate, "15/01/2024");
        let error = Schema::validate(&candidate).unwrap_err();

        let fields: Vec<_> = error.fields().collect();
        assert_eq!(
            fields,
            vec![
                Field::AssetName,
                Field::Owner,
                Field::Location,
                Field::LastAuditDate
            ]
        );
    }

    #[test]
    fn conditional_values_are_ignored_when_condition_is_false() {
        let candidate = payroll()
            .with(Field::RopaStatus, "Yes")
            .with(Field::DateIssued, "2023-05-01")
            .with(Field::DateReturned, "not even a date")
            .with(Field::BreachActionsStatus, "In Progress");

        let record = Schema::resolve(&candidate).unwrap();
        assert_eq!(record.ropa_status(), RopaStatus::NotApplicable);
        assert!(record.date_issued().is_not_applicable());
        assert!(record.date_returned().is_not_applicable());
        assert_eq!(
            record.breach_actions_status(),
            BreachActionsStatus::NotApplicable
        );
    }

    #[test]
    fn mobile_device_keeps_its_dates() {
        let candidate = payroll()
            .with(Field::IsMobileDevice, "Yes")
            .with(Field::DateIssued, "2023-05-01");

        let record = Schema::resolve(&candidate).unwrap();
        assert_eq!(
            record.date_issued(),
            Conditional::Value(NaiveDate::from_ymd_opt(2023, 5, 1))
        );
        assert_eq!(record.date_returned(), Conditional::Value(None));
    }

    #[test]
    fn mobile_device_dates_must_parse() {
        let candidate = payroll()
            .with(Field::IsMobileDevice, "Yes")
            .with(Field::DateReturned, "yesterday");

        let error = Schema::validate(&candidate).unwrap_err();
        assert!(error.names(Field::DateReturned));
    }

    #[test]
    fn shared_asset_without_ropa_status_is_under_review() {
        let candidate = payroll().with(Field::SharedExternally, "Yes - Both");
        let record = Schema::resolve(&candidate).unwrap();

        assert_eq!(record.shared_externally(), SharedExternally::Both);
        assert_eq!(record.ropa_status(), RopaStatus::UnderReview);
    }

    #[test]
    fn shared_asset_rejects_not_applicable_ropa_status() {
        let candidate = payroll()
            .with(Field::SharedExternally, "Yes - Both")
            .with(Field::RopaStatus, "N/A");
        let error = Schema::validate(&candidate).unwrap_err();

        assert!(matches!(
            error.failures().first().reason,
            Reason::NotApplicableWhen { .. }
        ));
    }

    #[test]
    fn breach_without_actions_status_is_in_progress() {
        let candidate = payroll().with(Field::BreachSinceAudit, "Yes");
        let record = Schema::resolve(&candidate).unwrap();
        assert_eq!(
            record.breach_actions_status(),
            BreachActionsStatus::InProgress
        );

        let candidate = candidate.with(Field::BreachActionsStatus, "yes");
        let record = Schema::resolve(&candidate).unwrap();
        assert_eq!(record.breach_actions_status(), BreachActionsStatus::Yes);
    }

    #[test]
    fn breach_rejects_unknown_actions_status() {
        let candidate = payroll()
            .with(Field::BreachSinceAudit, "Yes")
            .with(Field::BreachActionsStatus, "Mostly");

        assert!(Schema::validate(&candidate)
            .unwrap_err()
            .names(Field::BreachActionsStatus));
    }

    #[test]
    fn other_location_stores_companion_text() {
        let candidate = payroll()
            .with(Field::Location, "Other")
            .with(Field::LocationOther, "Basement safe");

        let record = Schema::resolve(&candidate).unwrap();
        assert_eq!(record.location(), "Basement safe");
    }

    #[test]
    fn other_location_without_companion_fails() {
        let candidate = payroll().with(Field::Location, "other");
        let error = Schema::validate(&candidate).unwrap_err();

        assert_eq!(
            error.failures().first().reason,
            Reason::CompanionMissing {
                of: Field::Location
            }
        );
        assert!(error.names(Field::LocationOther));
    }

    #[test_case("Other")]
    #[test_case(" OTHER ")]
    fn other_location_companion_must_name_a_location(companion: &str) {
        let candidate = payroll()
            .with(Field::Location, "Other")
            .with(Field::LocationOther, companion);
        let error = Schema::validate(&candidate).unwrap_err();

        assert_eq!(
            error.failures().first(),
            &FieldFailure {
                field: Field::LocationOther,
                reason: Reason::CompanionIsOther {
                    of: Field::Location
                },
            }
        );
    }

    #[test]
    fn failures_from_every_field_are_combined() {
        let candidate = payroll()
            .with(Field::Owner, "")
            .with(Field::IsMobileDevice, "perhaps")
            .with(Field::SharedExternally, "Yes")
            .with(Field::RopaStatus, "N/A");
        let error = Schema::validate(&candidate).unwrap_err();

        assert!(error.names(Field::Owner));
        assert!(error.names(Field::IsMobileDevice));
        assert!(error.names(Field::RopaStatus));
        assert_eq!(error.failures().len(), 3);
    }

    #[test]
    fn unknown_choice_lists_allowed_labels() {
        let candidate = payroll().with(Field::SharedExternally, "Sometimes");
        let error = Schema::validate(&candidate).unwrap_err();

        assert_eq!(
            error.failures().first().to_string(),
            "shared_externally 'Sometimes' is not one of: No, Yes - Received from outside, Yes - \
             Shared externally, Yes - Both"
        );
    }

    #[test]
    fn validate_does_not_touch_candidate() {
        let candidate = payroll().with(Field::Location, "Other");
        let before = candidate.clone();
        let _ = Schema::validate(&candidate);
        assert_eq!(candidate, before);
    }

    #[test_case("Asset Name", Field::AssetName)]
    #[test_case("asset_name", Field::AssetName)]
    #[test_case("Last Audit", Field::LastAuditDate)]
    #[test_case("last_audit_date", Field::LastAuditDate)]
    #[test_case("MOBILE DEVICE", Field::IsMobileDevice)]
    #[test_case("ROPA Status", Field::RopaStatus)]
    #[test_case("Name", Field::AssetName)]
    fn fields_are_found_by_any_name(name: &str, expected: Field) {
        assert_eq!(Field::from_name(name), Some(expected));
    }

    #[test]
    fn columns_exclude_input_only_fields() {
        assert!(!Schema::columns().contains(&Field::LocationOther));
        assert_eq!(Schema::columns().len(), Field::ALL.len() - 1);
        assert!(Schema::columns().iter().all(|field| field.is_column()));
    }

    #[test]
    fn headers_and_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.header()), Some(field));
            assert_eq!(field.key().parse::<Field>(), Ok(field));
        }
    }
}
