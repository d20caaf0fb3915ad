use std::{borrow::Cow, fmt};

use chrono::NaiveDate;
use non_empty_string::NonEmptyString;

use crate::domain::schema::Field;

/// The text stored for a conditional value whose governing condition does not
/// hold.
pub const NOT_APPLICABLE: &str = "N/A";

const YES: &str = "Yes";
const NO: &str = "No";

/// One row of the register.
///
/// Records can only be built by [`Schema::resolve`](crate::Schema::resolve),
/// so every record in a register satisfies the schema: the required text
/// fields are non-empty and every conditional field agrees with the flag that
/// governs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub(crate) asset_name: NonEmptyString,
    pub(crate) owner: NonEmptyString,
    pub(crate) supplier: String,
    pub(crate) contract_location: String,
    pub(crate) contract_dates: String,
    pub(crate) purpose: String,
    pub(crate) location: NonEmptyString,
    pub(crate) special_category_data: bool,
    pub(crate) shared_externally: SharedExternally,
    pub(crate) ropa_status: RopaStatus,
    pub(crate) breach_risks: String,
    pub(crate) security_measures: String,
    pub(crate) is_mobile_device: bool,
    pub(crate) date_issued: Conditional<Option<NaiveDate>>,
    pub(crate) date_returned: Conditional<Option<NaiveDate>>,
    pub(crate) last_audit_date: NaiveDate,
    pub(crate) breach_since_audit: bool,
    pub(crate) breach_actions_status: BreachActionsStatus,
}

impl AssetRecord {
    /// The name of the information asset.
    #[must_use]
    pub fn asset_name(&self) -> &str {
        self.asset_name.as_str()
    }

    /// The information asset owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    /// The supplier name, empty if none was given.
    #[must_use]
    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    /// Where the supplier contract is kept.
    #[must_use]
    pub fn contract_location(&self) -> &str {
        &self.contract_location
    }

    /// Free-form contract period, e.g. `01/2024 - 01/2025`.
    #[must_use]
    pub fn contract_dates(&self) -> &str {
        &self.contract_dates
    }

    /// What the asset holds and why it is kept.
    #[must_use]
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// Where the asset lives.
    ///
    /// If the form selected "Other", this is the free text the user supplied
    /// instead.
    #[must_use]
    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Whether the asset contains special category personal data.
    #[must_use]
    pub const fn special_category_data(&self) -> bool {
        self.special_category_data
    }

    /// Whether, and in which direction, the asset is shared outside the
    /// organisation.
    #[must_use]
    pub const fn shared_externally(&self) -> SharedExternally {
        self.shared_externally
    }

    /// Whether the asset appears on the Record of Processing Activities.
    #[must_use]
    pub const fn ropa_status(&self) -> RopaStatus {
        self.ropa_status
    }

    /// Risks should the asset be breached.
    #[must_use]
    pub fn breach_risks(&self) -> &str {
        &self.breach_risks
    }

    /// Measures protecting the asset.
    #[must_use]
    pub fn security_measures(&self) -> &str {
        &self.security_measures
    }

    /// Whether the asset is a mobile device.
    #[must_use]
    pub const fn is_mobile_device(&self) -> bool {
        self.is_mobile_device
    }

    /// When the device was issued.
    #[must_use]
    pub const fn date_issued(&self) -> Conditional<Option<NaiveDate>> {
        self.date_issued
    }

    /// When the device was returned.
    #[must_use]
    pub const fn date_returned(&self) -> Conditional<Option<NaiveDate>> {
        self.date_returned
    }

    /// Date of the last audit of the asset.
    #[must_use]
    pub const fn last_audit_date(&self) -> NaiveDate {
        self.last_audit_date
    }

    /// Whether a breach has happened since the last audit.
    #[must_use]
    pub const fn breach_since_audit(&self) -> bool {
        self.breach_since_audit
    }

    /// Whether all actions following a breach have been taken.
    #[must_use]
    pub const fn breach_actions_status(&self) -> BreachActionsStatus {
        self.breach_actions_status
    }

    /// The canonical text of a stored column.
    ///
    /// This is the form used for export and display: dates as ISO 8601
    /// calendar dates, flags as `Yes`/`No`, enumerations by label.
    ///
    /// [`Field::LocationOther`] is input-only and always yields an empty
    /// string.
    #[must_use]
    pub fn value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::AssetName => Cow::Borrowed(self.asset_name()),
            Field::Owner => Cow::Borrowed(self.owner()),
            Field::Supplier => Cow::Borrowed(self.supplier()),
            Field::ContractLocation => Cow::Borrowed(self.contract_location()),
            Field::ContractDates => Cow::Borrowed(self.contract_dates()),
            Field::Purpose => Cow::Borrowed(self.purpose()),
            Field::Location => Cow::Borrowed(self.location()),
            Field::LocationOther => Cow::Borrowed(""),
            Field::SpecialCategoryData => Cow::Borrowed(flag_label(self.special_category_data)),
            Field::SharedExternally => Cow::Borrowed(self.shared_externally.label()),
            Field::RopaStatus => Cow::Borrowed(self.ropa_status.label()),
            Field::BreachRisks => Cow::Borrowed(self.breach_risks()),
            Field::SecurityMeasures => Cow::Borrowed(self.security_measures()),
            Field::IsMobileDevice => Cow::Borrowed(flag_label(self.is_mobile_device)),
            Field::DateIssued => date_text(self.date_issued),
            Field::DateReturned => date_text(self.date_returned),
            Field::LastAuditDate => Cow::Owned(self.last_audit_date.to_string()),
            Field::BreachSinceAudit => Cow::Borrowed(flag_label(self.breach_since_audit)),
            Field::BreachActionsStatus => Cow::Borrowed(self.breach_actions_status.label()),
        }
    }
}

fn date_text(date: Conditional<Option<NaiveDate>>) -> Cow<'static, str> {
    match date {
        Conditional::NotApplicable => Cow::Borrowed(NOT_APPLICABLE),
        Conditional::Value(None) => Cow::Borrowed(""),
        Conditional::Value(Some(date)) => Cow::Owned(date.to_string()),
    }
}

/// A value that only exists while some other field holds.
///
/// `NotApplicable` is the sentinel stored when the governing condition is
/// false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conditional<T> {
    /// The governing condition does not hold.
    NotApplicable,
    /// The governing condition holds.
    Value(T),
}

#[cfg(test)]
impl<T> Conditional<T> {
    /// Whether this is the `NotApplicable` sentinel.
    pub(crate) const fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable)
    }
}

/// An enumerated field with a fixed set of labels.
///
/// Labels are the stored and exported form. Parsing is case-insensitive and
/// also accepts the aliases a type chooses to recognise.
pub trait Choice: Sized + Copy {
    /// Every canonical label, in presentation order.
    const LABELS: &'static [&'static str];

    /// The canonical label of this value.
    fn label(self) -> &'static str;

    /// Parses a label or alias.
    fn parse(text: &str) -> Option<Self>;
}

/// Whether, and in which direction, an asset is shared outside the
/// organisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SharedExternally {
    /// Not shared.
    #[default]
    None,
    /// Information is received from outside the organisation.
    ReceivedFromOutside,
    /// Information is sent outside the organisation.
    SharedExternally,
    /// Received and sent.
    Both,
}

impl SharedExternally {
    /// Whether the asset crosses the organisation boundary at all.
    #[must_use]
    pub const fn is_shared(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Choice for SharedExternally {
    const LABELS: &'static [&'static str] = &[
        "No",
        "Yes - Received from outside",
        "Yes - Shared externally",
        "Yes - Both",
    ];

    fn label(self) -> &'static str {
        match self {
            Self::None => Self::LABELS[0],
            Self::ReceivedFromOutside => Self::LABELS[1],
            Self::SharedExternally => Self::LABELS[2],
            Self::Both => Self::LABELS[3],
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match normalize(text).as_str() {
            "no" | "none" => Some(Self::None),
            "yes_received_from_outside" | "received_from_outside" | "received" => {
                Some(Self::ReceivedFromOutside)
            }
            // Older exports only recorded a bare "Yes".
            "yes_shared_externally" | "shared_externally" | "shared" | "yes" => {
                Some(Self::SharedExternally)
            }
            "yes_both" | "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Whether an asset is on the Record of Processing Activities (ROPA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RopaStatus {
    /// Recorded.
    Yes,
    /// Not recorded.
    No,
    /// Being reviewed for inclusion.
    UnderReview,
    /// The asset is not shared externally.
    NotApplicable,
}

impl Choice for RopaStatus {
    const LABELS: &'static [&'static str] = &[YES, NO, "Under Review", NOT_APPLICABLE];

    fn label(self) -> &'static str {
        match self {
            Self::Yes => Self::LABELS[0],
            Self::No => Self::LABELS[1],
            Self::UnderReview => Self::LABELS[2],
            Self::NotApplicable => Self::LABELS[3],
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match normalize(text).as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "under_review" | "underreview" => Some(Self::UnderReview),
            "n_a" | "na" | "not_applicable" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

/// Whether all actions following a breach have been taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreachActionsStatus {
    /// All actions taken.
    Yes,
    /// Actions outstanding.
    No,
    /// Actions under way.
    InProgress,
    /// No breach since the last audit.
    NotApplicable,
}

impl Choice for BreachActionsStatus {
    const LABELS: &'static [&'static str] = &[YES, NO, "In Progress", NOT_APPLICABLE];

    fn label(self) -> &'static str {
        match self {
            Self::Yes => Self::LABELS[0],
            Self::No => Self::LABELS[1],
            Self::InProgress => Self::LABELS[2],
            Self::NotApplicable => Self::LABELS[3],
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match normalize(text).as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "in_progress" | "inprogress" => Some(Self::InProgress),
            "n_a" | "na" | "not_applicable" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

impl fmt::Display for SharedExternally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for RopaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for BreachActionsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The canonical text of a flag.
#[must_use]
pub const fn flag_label(value: bool) -> &'static str {
    if value { YES } else { NO }
}

/// Parses a flag from `Yes`/`No` and the usual spellings of true and false.
#[must_use]
pub fn parse_flag(text: &str) -> Option<bool> {
    match normalize(text).as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Lowercases and collapses every run of non-alphanumeric characters into a
/// single underscore, so `Yes - Both`, `yes_both` and ` YES-BOTH ` compare
/// equal.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}
