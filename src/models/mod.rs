use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ============================================================================
// Metadata Models
// ============================================================================

/// SEO metadata extracted from a single fetched page.
///
/// `source_url` is the caller's URL and is always set by extraction. For the
/// other fields `None` means no matching element (or attribute) was found. An element whose value is the empty
/// string yields `Some("")`, mirroring the literal markup.
///
/// Field order here is the canonical export order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub robots: Option<String>,
    pub twitter_card: Option<String>,
}

impl MetadataRecord {
    /// Value of one of the important fields.
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::Title => self.title.as_deref(),
            MetadataField::Description => self.description.as_deref(),
            MetadataField::OgImage => self.og_image.as_deref(),
        }
    }
}

/// Identifier of a field whose absence triggers a warning and remediation
/// guidance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MetadataField {
    Title,
    Description,
    OgImage,
}

/// The importance set, in declaration order. Missing-field reports and
/// recommendation lists always follow this order.
pub const IMPORTANT_FIELDS: [MetadataField; 3] = [
    MetadataField::Title,
    MetadataField::Description,
    MetadataField::OgImage,
];

// ============================================================================
// Analysis Models
// ============================================================================

/// Remediation guidance for one missing important field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub field: MetadataField,
    pub heading: &'static str,
    pub tips: Vec<&'static str>,
}

/// Result of analyzing one page: the extracted record plus the missing
/// important fields and their recommendations, both in importance order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub metadata: MetadataRecord,
    pub missing_fields: Vec<MetadataField>,
    pub recommendations: Vec<Recommendation>,
}
