//! Header-only CSV templates for the upload surface.

use bls_model::InputLayout;

use crate::error::{IngestError, Result};

/// Builds a CSV containing only the allowed input columns of a layout.
pub fn template_csv(layout: InputLayout) -> Result<String> {
    let template_err = |err: &dyn std::fmt::Display| IngestError::Template {
        message: err.to_string(),
    };
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(layout.allowed_columns())
        .map_err(|err| template_err(&err))?;
    let bytes = writer.into_inner().map_err(|err| template_err(&err))?;
    String::from_utf8(bytes).map_err(|err| template_err(&err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_template() {
        let csv = template_csv(InputLayout::Summary).unwrap();
        insta::assert_snapshot!(
            csv.trim_end(),
            @"Month Year,Brand,Category,Market,KPI,Control Sample,Exposed Sample,Control Score,Exposed Score,Study ID,KPI Order"
        );
    }

    #[test]
    fn observation_template() {
        let csv = template_csv(InputLayout::Observations).unwrap();
        insta::assert_snapshot!(
            csv.trim_end(),
            @"Brand,Group,Metric,KPI,Month Year,Market,Category,Study ID"
        );
    }
}
