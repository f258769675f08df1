use crate::models::{
    AnalysisReport, MetadataField, MetadataRecord, Recommendation, IMPORTANT_FIELDS,
};

/// Important fields that are absent from `record`, in importance order
/// (title, description, ogImage) regardless of which ones are missing.
pub fn missing_important_fields(record: &MetadataRecord) -> Vec<MetadataField> {
    IMPORTANT_FIELDS
        .into_iter()
        .filter(|field| record.get(*field).is_none())
        .collect()
}

/// Best-practice guidance shown for a missing important field.
pub fn recommendation_for(field: MetadataField) -> Recommendation {
    let (heading, tips): (&'static str, &[&'static str]) = match field {
        MetadataField::Title => (
            "Add a Title Tag",
            &[
                "Keep it under 60 characters",
                "Include your primary keyword",
                "Make it accurately describe the page content",
                "Make it unique for each page",
            ],
        ),
        MetadataField::Description => (
            "Add a Meta Description",
            &[
                "Keep it under 160 characters",
                "Include relevant keywords naturally",
                "Write a compelling summary of the page",
                "Encourage users to click through",
            ],
        ),
        MetadataField::OgImage => (
            "Add an Open Graph Image",
            &[
                "Use an eye-catching, relevant image",
                "Recommended size: 1200×630 pixels",
                "Use JPG or PNG format",
                "Keep the file size under 1MB",
            ],
        ),
    };

    Recommendation {
        field,
        heading,
        tips: tips.to_vec(),
    }
}

/// Combine a record with its missing fields and one recommendation per
/// missing field, both in the same order.
pub fn build_report(record: MetadataRecord) -> AnalysisReport {
    let missing_fields = missing_important_fields(&record);
    let recommendations = missing_fields
        .iter()
        .copied()
        .map(recommendation_for)
        .collect();

    AnalysisReport {
        metadata: record,
        missing_fields,
        recommendations,
    }
}
