use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingSurvivingSpouse,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 5] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingSurvivingSpouse,
    ];

    /// Short code used in CSV files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::MarriedFilingSeparately => "MFS",
            Self::HeadOfHousehold => "HOH",
            Self::QualifyingSurvivingSpouse => "QSS",
        }
    }

    /// The serde name, which is also what rule expressions compare against
    /// when they read the `filingStatus` path.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MarriedFilingJointly => "married_filing_jointly",
            Self::MarriedFilingSeparately => "married_filing_separately",
            Self::HeadOfHousehold => "head_of_household",
            Self::QualifyingSurvivingSpouse => "qualifying_surviving_spouse",
        }
    }

    /// Accepts either the short code (`MFJ`) or the long key
    /// (`married_filing_jointly`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::Single),
            "MFJ" => Some(Self::MarriedFilingJointly),
            "MFS" => Some(Self::MarriedFilingSeparately),
            "HOH" => Some(Self::HeadOfHousehold),
            "QSS" => Some(Self::QualifyingSurvivingSpouse),
            other => Self::ALL.into_iter().find(|status| status.key() == other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedFilingJointly => "Married Filing Jointly",
            Self::MarriedFilingSeparately => "Married Filing Separately",
            Self::HeadOfHousehold => "Head of Household",
            Self::QualifyingSurvivingSpouse => "Qualifying Surviving Spouse",
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per filing status.
///
/// Every slot is optional so the same shape serves complete federal tables
/// and sparse per-status state overrides. Qualifying surviving spouse falls
/// back to the married-filing-jointly entry when it is not given, the same
/// way IRS Schedule Y-1 covers both statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct FilingStatusTable<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub married_filing_jointly: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub married_filing_separately: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_of_household: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifying_surviving_spouse: Option<T>,
}

impl<T> Default for FilingStatusTable<T> {
    fn default() -> Self {
        Self {
            single: None,
            married_filing_jointly: None,
            married_filing_separately: None,
            head_of_household: None,
            qualifying_surviving_spouse: None,
        }
    }
}

impl<T> FilingStatusTable<T> {
    /// Builds a table with the same value for every filing status.
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            single: Some(value.clone()),
            married_filing_jointly: Some(value.clone()),
            married_filing_separately: Some(value.clone()),
            head_of_household: Some(value.clone()),
            qualifying_surviving_spouse: Some(value),
        }
    }

    pub fn get(
        &self,
        status: FilingStatus,
    ) -> Option<&T> {
        match status {
            FilingStatus::Single => self.single.as_ref(),
            FilingStatus::MarriedFilingJointly => self.married_filing_jointly.as_ref(),
            FilingStatus::MarriedFilingSeparately => self.married_filing_separately.as_ref(),
            FilingStatus::HeadOfHousehold => self.head_of_household.as_ref(),
            FilingStatus::QualifyingSurvivingSpouse => self
                .qualifying_surviving_spouse
                .as_ref()
                .or(self.married_filing_jointly.as_ref()),
        }
    }

    pub fn set(
        &mut self,
        status: FilingStatus,
        value: T,
    ) {
        let slot = match status {
            FilingStatus::Single => &mut self.single,
            FilingStatus::MarriedFilingJointly => &mut self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => &mut self.married_filing_separately,
            FilingStatus::HeadOfHousehold => &mut self.head_of_household,
            FilingStatus::QualifyingSurvivingSpouse => &mut self.qualifying_surviving_spouse,
        };
        *slot = Some(value);
    }

    /// Filing statuses for which [`FilingStatusTable::get`] yields nothing.
    pub fn missing(&self) -> Vec<FilingStatus> {
        FilingStatus::ALL
            .into_iter()
            .filter(|status| self.get(*status).is_none())
            .collect()
    }
}
