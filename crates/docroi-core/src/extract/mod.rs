//! Template-driven structured extraction.

mod labels;

pub use labels::{LabelRule, LabeledFieldParser};

use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::error::{OcrError, TemplateError};
use crate::models::document::{DocumentType, Side, Subtype};
use crate::models::record::ExtractedRecord;
use crate::ocr::TextRecognizer;
use crate::region::extract_region;
use crate::template::{Template, TemplateRegistry};
use crate::validate::FieldValidator;

/// Orchestrates template lookup, region cropping, OCR and validation.
///
/// Holds no per-call state, so one extractor can serve many documents
/// concurrently when wrapped in an `Arc`.
pub struct StructuredExtractor<R: TextRecognizer> {
    registry: Arc<TemplateRegistry>,
    validator: Arc<FieldValidator>,
    recognizer: R,
    labels: LabeledFieldParser,
}

impl<R: TextRecognizer> StructuredExtractor<R> {
    /// Create an extractor from shared registry and validator.
    pub fn new(
        registry: Arc<TemplateRegistry>,
        validator: Arc<FieldValidator>,
        recognizer: R,
    ) -> Self {
        Self {
            registry,
            validator,
            recognizer,
            labels: LabeledFieldParser::new(),
        }
    }

    /// Replace the labeled-field parser used by [`Self::extract_labeled`].
    pub fn with_label_parser(mut self, labels: LabeledFieldParser) -> Self {
        self.labels = labels;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    /// Extract the fields of a document.
    ///
    /// Only template lookup can fail. Fields whose region is empty, whose OCR
    /// fails or whose text is rejected by the validator are left out of the
    /// record.
    pub fn extract(
        &self,
        image: &DynamicImage,
        document_type: DocumentType,
        subtype: Subtype,
        side: Option<Side>,
    ) -> Result<ExtractedRecord, TemplateError> {
        let template = self.registry.lookup(document_type, subtype, side)?;

        let (width, height) = image.dimensions();
        info!(
            "Extracting {}/{}{} from {}x{} image",
            document_type,
            subtype,
            side.map(|s| format!("/{}", s)).unwrap_or_default(),
            width,
            height
        );

        Ok(self.extract_with_template(image, template))
    }

    /// Run every field of `template` against `image`.
    pub fn extract_with_template(
        &self,
        image: &DynamicImage,
        template: &Template,
    ) -> ExtractedRecord {
        let start = Instant::now();
        let mut record = ExtractedRecord::new();

        for (field, region) in template.iter() {
            let crop = match extract_region(image, region) {
                Ok(crop) => crop,
                Err(e) => {
                    debug!("Skipping field '{}': {}", field, e);
                    continue;
                }
            };

            let raw = match self.recognizer.extract_text(&crop) {
                Ok(text) => text,
                Err(e) => {
                    warn!("OCR failed for field '{}': {}", field, e);
                    continue;
                }
            };

            match self.validator.validate(field, &raw) {
                Some(value) => {
                    debug!("Field '{}' = {:?}", field, value);
                    record.insert(field, value);
                }
                None => debug!("Field '{}' rejected: {:?}", field, raw),
            }
        }

        info!(
            "Extracted {}/{} fields in {}ms",
            record.len(),
            template.len(),
            start.elapsed().as_millis()
        );

        record
    }

    /// Extract several sides of an ID card and merge them.
    ///
    /// Sides are processed in the given order; a field found on a later side
    /// replaces the same field from an earlier one. Any lookup error aborts
    /// the whole card.
    pub fn extract_id_card(
        &self,
        subtype: Subtype,
        sides: &[(Side, &DynamicImage)],
    ) -> Result<ExtractedRecord, TemplateError> {
        // Resolve every template before spending time on OCR
        let templates = sides
            .iter()
            .map(|(side, image)| {
                self.registry
                    .lookup(DocumentType::IdCard, subtype, Some(*side))
                    .map(|template| (*side, *image, template))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut record = ExtractedRecord::new();
        for (side, image, template) in templates {
            debug!("Processing ID card {} side", side);
            record.merge(self.extract_with_template(image, template));
        }

        Ok(record)
    }

    /// Read the whole page once and pick out `Label: value` pairs.
    ///
    /// Unlike template extraction there is nothing to fall back to, so an
    /// OCR failure is returned to the caller.
    pub fn extract_labeled(&self, image: &DynamicImage) -> Result<ExtractedRecord, OcrError> {
        let text = self.recognizer.extract_text(image)?;
        Ok(self.labels.parse(&text, &self.validator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::UnknownFieldPolicy;
    use crate::models::document::NormalizedBox;
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    fn record(pairs: &[(&str, &str)]) -> ExtractedRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn extractor<R: TextRecognizer>(recognizer: R) -> StructuredExtractor<R> {
        StructuredExtractor::new(
            Arc::new(TemplateRegistry::builtin().unwrap()),
            Arc::new(FieldValidator::new()),
            recognizer,
        )
    }

    fn registry_with(template: Template) -> Arc<TemplateRegistry> {
        Arc::new(
            TemplateRegistry::builder()
                .register(DocumentType::Report, Subtype::Type1, None, template)
                .unwrap()
                .build(),
        )
    }

    /// Answers by crop width so each field of a template gets its own text.
    fn by_width(answers: &'static [(u32, &'static str)]) -> impl TextRecognizer {
        move |region: &DynamicImage| -> Result<String, OcrError> {
            let width = region.width();
            answers
                .iter()
                .find(|(w, _)| *w == width)
                .map(|(_, text)| text.to_string())
                .ok_or_else(|| OcrError::Engine(format!("no stub for width {}", width)))
        }
    }

    #[test]
    fn test_end_to_end_name() {
        let template = Template::from_coords([("name", [0.1, 0.2, 0.6, 0.3])]).unwrap();
        let extractor = StructuredExtractor::new(
            registry_with(template),
            Arc::new(FieldValidator::new()),
            |_: &DynamicImage| -> Result<String, OcrError> { Ok("John   Doe!!".to_string()) },
        );

        let result = extractor
            .extract(&blank(200, 100), DocumentType::Report, Subtype::Type1, None)
            .unwrap();

        assert_eq!(result, record(&[("name", "John Doe")]));
    }

    #[test]
    fn test_crop_passed_to_recognizer() {
        let template = Template::from_coords([("name", [0.1, 0.2, 0.6, 0.3])]).unwrap();
        let extractor = StructuredExtractor::new(
            registry_with(template),
            Arc::new(FieldValidator::new()),
            |region: &DynamicImage| -> Result<String, OcrError> {
                Ok(format!("{}x{}", region.width(), region.height()))
            },
        );

        let result = extractor
            .extract(&blank(1000, 500), DocumentType::Report, Subtype::Type1, None)
            .unwrap();

        assert_eq!(result.get("name"), Some("500x50"));
    }

    #[test]
    fn test_id_card_front_validation() {
        // name crop is 250px wide, id_number crop 150px on a 500x300 card
        let extractor = extractor(by_width(&[(250, "Jane Roe"), (150, "12345")]));

        let result = extractor
            .extract(&blank(500, 300), DocumentType::IdCard, Subtype::Type1, Some(Side::Front))
            .unwrap();

        // id_number fails the ten-digit rule and is omitted
        assert_eq!(result, record(&[("name", "Jane Roe")]));
    }

    #[test]
    fn test_ocr_failure_omits_field_only() {
        let extractor = extractor(by_width(&[(250, "Jane Roe")]));

        let result = extractor
            .extract(&blank(500, 300), DocumentType::IdCard, Subtype::Type1, Some(Side::Front))
            .unwrap();

        assert_eq!(result, record(&[("name", "Jane Roe")]));
    }

    #[test]
    fn test_empty_region_omits_field() {
        let template = Template::new()
            .with_field("tiny", NormalizedBox::new(0.01, 0.01, 0.02, 0.02).unwrap())
            .unwrap()
            .with_field("whole", NormalizedBox::full())
            .unwrap();

        let calls = AtomicUsize::new(0);
        let extractor = StructuredExtractor::new(
            registry_with(template),
            Arc::new(FieldValidator::new()),
            |_: &DynamicImage| -> Result<String, OcrError> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("text".to_string())
            },
        );

        let result = extractor
            .extract(&blank(10, 10), DocumentType::Report, Subtype::Type1, None)
            .unwrap();

        assert_eq!(result, record(&[("whole", "text")]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nothing_recognized_is_empty_record() {
        let extractor = extractor(|_: &DynamicImage| -> Result<String, OcrError> {
            Err(OcrError::Engine("engine offline".to_string()))
        });

        let result = extractor
            .extract(&blank(400, 400), DocumentType::Report, Subtype::Type1, None)
            .unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_lookup_errors_propagate() {
        let extractor = extractor(|_: &DynamicImage| -> Result<String, OcrError> {
            panic!("OCR must not run when lookup fails")
        });
        let image = blank(100, 100);

        let err = extractor
            .extract(&image, DocumentType::IdCard, Subtype::Type1, None)
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidLookupKey(_)));

        let err = extractor
            .extract(&image, DocumentType::Report, Subtype::Type1, Some(Side::Front))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidLookupKey(_)));

        let err = extractor
            .extract(&image, DocumentType::Report, Subtype::Type3, None)
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
    }

    #[test]
    fn test_idempotent() {
        let extractor = extractor(by_width(&[(250, "Jane  Roe"), (150, "0123456789")]));
        let image = blank(500, 300);

        let first = extractor
            .extract(&image, DocumentType::IdCard, Subtype::Type1, Some(Side::Front))
            .unwrap();
        let second = extractor
            .extract(&image, DocumentType::IdCard, Subtype::Type1, Some(Side::Front))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, record(&[("id_number", "0123456789"), ("name", "Jane Roe")]));
    }

    #[test]
    fn test_unknown_fields_rejected_by_policy() {
        let template = Template::from_coords([
            ("name", [0.0, 0.0, 1.0, 0.5]),
            ("date", [0.0, 0.5, 1.0, 1.0]),
        ])
        .unwrap();
        let validator =
            FieldValidator::new().with_unknown_field_policy(UnknownFieldPolicy::Reject);
        let extractor = StructuredExtractor::new(
            registry_with(template),
            Arc::new(validator),
            |_: &DynamicImage| -> Result<String, OcrError> { Ok("27/12/2024".to_string()) },
        );

        let result = extractor
            .extract(&blank(100, 100), DocumentType::Report, Subtype::Type1, None)
            .unwrap();

        assert_eq!(result, record(&[("date", "2024-12-27")]));
    }

    #[test]
    fn test_id_card_sides_merged() {
        // front: name 250px, id_number 150px; back: address 350px
        let extractor = extractor(by_width(&[
            (250, "Jane Roe"),
            (150, "0123456789"),
            (350, "12 Palm St."),
        ]));
        let front = blank(500, 300);
        let back = blank(500, 300);

        let result = extractor
            .extract_id_card(Subtype::Type1, &[(Side::Front, &front), (Side::Back, &back)])
            .unwrap();

        assert_eq!(
            result,
            record(&[
                ("address", "12 Palm St."),
                ("id_number", "0123456789"),
                ("name", "Jane Roe"),
            ])
        );
    }

    #[test]
    fn test_id_card_missing_side_template() {
        let extractor = extractor(|_: &DynamicImage| -> Result<String, OcrError> {
            Ok(String::new())
        });
        let image = blank(10, 10);

        let err = extractor
            .extract_id_card(Subtype::Type2, &[(Side::Front, &image)])
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
    }

    #[test]
    fn test_labeled_mode() {
        let extractor = extractor(|_: &DynamicImage| -> Result<String, OcrError> {
            Ok("Name: Jane Roe\nDOB: 01/02/1990\nID Number: 0123456789\n".to_string())
        });

        let result = extractor.extract_labeled(&blank(50, 50)).unwrap();
        assert_eq!(result.get("name"), Some("Jane Roe"));
        assert_eq!(result.get("date_of_birth"), Some("1990-02-01"));
        assert_eq!(result.get("id_number"), Some("0123456789"));
    }

    #[test]
    fn test_shared_across_threads() {
        let extractor = Arc::new(extractor(by_width(&[(250, "Jane Roe"), (150, "0123456789")])));

        let results: Vec<ExtractedRecord> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let extractor = Arc::clone(&extractor);
                    scope.spawn(move || {
                        extractor
                            .extract(
                                &blank(500, 300),
                                DocumentType::IdCard,
                                Subtype::Type1,
                                Some(Side::Front),
                            )
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(results[0].len(), 2);
    }
}
