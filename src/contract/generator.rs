use lazy_static::lazy_static;
use log::{debug, error};

use crate::clock::Clock;

use super::{
    export::{ContractFile, ExportError, FileExporter},
    form::ContractFormData,
    template::{self, Template},
};

/// Текст стандартного договора о свопе.
pub const STANDARD_AGREEMENT: &str = include_str!("agreement.txt");

/// Текст, который попадает в раздел дополнительных условий, если их нет.
pub const NO_SPECIAL_TERMS: &str = "No additional terms specified.";

lazy_static! {
    static ref STANDARD: Template =
        Template::compile(STANDARD_AGREEMENT).expect("standard agreement template must compile");
}

/// Генератор договоров по заданному шаблону.
#[derive(Debug, Clone)]
pub struct ContractGenerator {
    template: Template,
}

impl ContractGenerator {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    /// Генератор стандартного договора.
    pub fn standard() -> Self {
        Self::new(STANDARD.clone())
    }

    /// Компилирует пользовательский шаблон.
    pub fn from_text(text: &str) -> template::Result<Self> {
        Ok(Self::new(Template::compile(text)?))
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Формирует текст договора.
    /// ID и дата берутся из одного и того же момента времени.
    pub fn generate(&self, form: &ContractFormData, clock: &dyn Clock) -> String {
        let now = clock.now();

        debug!("Render contract at {}", now);

        self.template.render(form, &now)
    }

    /// Формирует договор и отдаёт его файлом через `exporter`.
    /// Ошибка сохранения логируется и возвращается, но ни на что не влияет.
    pub fn download(
        &self,
        form: &ContractFormData,
        clock: &dyn Clock,
        exporter: &dyn FileExporter,
    ) -> Result<ContractFile, ExportError> {
        let now = clock.now();

        let file = ContractFile::new(form, &now, self.template.render(form, &now));

        debug!("Export contract as {}", file.name);

        exporter.export(&file).map_err(|e| {
            error!("Failed to export contract {}: {}", file.name, e);
            e
        })?;

        Ok(file)
    }
}

impl Default for ContractGenerator {
    fn default() -> Self {
        Self::standard()
    }
}

/// Формирует стандартный договор.
pub fn generate_contract(form: &ContractFormData, clock: &dyn Clock) -> String {
    STANDARD.render(form, &clock.now())
}

/// Формирует стандартный договор и отдаёт его файлом.
pub fn download_contract(
    form: &ContractFormData,
    clock: &dyn Clock,
    exporter: &dyn FileExporter,
) -> Result<ContractFile, ExportError> {
    ContractGenerator::standard().download(form, clock, exporter)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io};

    use chrono::DateTime;

    use super::*;
    use crate::{clock::FixedClock, contract::export::CONTRACT_MIME};

    fn clock() -> FixedClock {
        FixedClock(DateTime::parse_from_rfc3339("2024-06-15T12:34:56.789Z").unwrap())
    }

    fn form() -> ContractFormData {
        ContractFormData {
            tenant1_name: "Alex Johnson".to_owned(),
            tenant1_email: "alex.johnson@email.com".to_owned(),
            tenant1_phone: "+49 151 000000".to_owned(),
            tenant2_name: "Carlos Gomez".to_owned(),
            tenant2_email: "carlos.gomez@email.com".to_owned(),
            tenant2_phone: "+34 600 000000".to_owned(),
            property1_address: "Friedrichshain, Berlin, Germany".to_owned(),
            property1_rent: "1200".to_owned(),
            property1_description: "Beautiful Altbau flat".to_owned(),
            property2_address: "Barceloneta, Barcelona, Spain".to_owned(),
            property2_rent: "950".to_owned(),
            property2_description: "2-bedroom apartment near the beach".to_owned(),
            start_date: "2024-07-01".to_owned(),
            end_date: "2024-08-15".to_owned(),
            duration: "1 month and 15 days".to_owned(),
            special_terms: "Plants must be watered twice a week".to_owned(),
            platform_fee_percentage: None,
        }
    }

    /// Возвращает кусок документа между двумя заголовками.
    fn section<'a>(doc: &'a str, from: &str, to: &str) -> &'a str {
        let start = doc.find(from).unwrap();
        let end = start + doc[start..].find(to).unwrap();
        &doc[start..end]
    }

    #[test]
    fn header() {
        let doc = generate_contract(&form(), &clock());

        assert!(doc.starts_with(
            "FLAT SWAP AGREEMENT\nContract ID: FS-896789\nAgreement Date: 15/06/2024\n"
        ));
        assert!(doc.contains("Contract ID: FS-896789\nGeneration Date: 15/06/2024\n"));
    }

    #[test]
    fn every_field_lands_once_in_its_section() {
        let f = form();
        let doc = generate_contract(&f, &clock());

        let party_a = section(&doc, "PARTY A", "PARTY B");
        for value in [
            &f.tenant1_name,
            &f.tenant1_email,
            &f.tenant1_phone,
            &f.property1_address,
            &f.property1_description,
            &f.property1_rent,
        ] {
            assert_eq!(1, party_a.matches(value.as_str()).count(), "{}", value);
        }

        let party_b = section(&doc, "PARTY B", "SWAP ARRANGEMENT");
        for value in [
            &f.tenant2_name,
            &f.tenant2_email,
            &f.tenant2_phone,
            &f.property2_address,
            &f.property2_description,
            &f.property2_rent,
        ] {
            assert_eq!(1, party_b.matches(value.as_str()).count(), "{}", value);
        }

        let swap = section(&doc, "SWAP ARRANGEMENT", "TERMS AND CONDITIONS");
        assert!(swap.contains("Start Date: 2024-07-01\n"));
        assert!(swap.contains("End Date: 2024-08-15\n"));
        assert!(swap.contains("Duration: 1 month and 15 days\n"));

        let terms = section(&doc, "10. ADDITIONAL TERMS", "ACKNOWLEDGMENT");
        assert_eq!(1, terms.matches(f.special_terms.as_str()).count());
        assert!(!terms.contains(NO_SPECIAL_TERMS));

        let payments = section(&doc, "1. RENTAL PAYMENT", "2. PROPERTY CONDITION");
        assert!(payments.contains("Party A will pay €950/month"));
        assert!(payments.contains("Party B will pay €1200/month"));

        let signatures = section(&doc, "ACKNOWLEDGMENT", "EMERGENCY CONTACTS");
        assert!(signatures.contains("Party A (Alex Johnson):"));
        assert!(signatures.contains("Party B (Carlos Gomez):"));
    }

    #[test]
    fn ten_numbered_clauses() {
        let doc = generate_contract(&form(), &clock());

        for n in 1..=10 {
            assert!(doc.contains(&format!("\n{}. ", n)), "clause {}", n);
        }
    }

    #[test]
    fn special_terms_fallback() {
        let f = ContractFormData {
            special_terms: String::new(),
            ..form()
        };

        let doc = generate_contract(&f, &clock());

        assert!(doc.contains("10. ADDITIONAL TERMS:\nNo additional terms specified.\n"));
    }

    #[test]
    fn blank_form_renders() {
        let doc = generate_contract(&ContractFormData::default(), &clock());

        assert!(doc.contains("Full Name: \n"));
        assert!(doc.contains("Monthly Rent: €\n"));
        assert!(doc.ends_with("Users proceed at their own discretion."));
    }

    #[test]
    fn generator_renders_custom_template() {
        let generator =
            ContractGenerator::from_text("{{ tenant1_name }} <-> {{ tenant2_name }} ({{ contract_id() }})")
                .unwrap();

        assert_eq!(
            "Alex Johnson <-> Carlos Gomez (FS-896789)",
            generator.generate(&form(), &clock())
        );
    }

    #[test]
    fn standard_generator_matches_generate_contract() {
        assert_eq!(
            generate_contract(&form(), &clock()),
            ContractGenerator::default().generate(&form(), &clock())
        );
    }

    #[derive(Default)]
    struct RecordingExporter {
        files: RefCell<Vec<ContractFile>>,
    }

    impl FileExporter for RecordingExporter {
        fn export(&self, file: &ContractFile) -> Result<(), ExportError> {
            self.files.borrow_mut().push(file.clone());
            Ok(())
        }
    }

    struct FailingExporter;

    impl FileExporter for FailingExporter {
        fn export(&self, _file: &ContractFile) -> Result<(), ExportError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn download_hands_file_to_exporter() {
        let exporter = RecordingExporter::default();

        let file = download_contract(&form(), &clock(), &exporter).unwrap();

        let exported = exporter.files.borrow();
        assert_eq!(1, exported.len());
        assert_eq!(file, exported[0]);
        assert_eq!(
            "flat-swap-contract-alex-johnson-carlos-gomez-2024-06-15.txt",
            file.name
        );
        assert_eq!(CONTRACT_MIME, file.mime);
        assert_eq!(generate_contract(&form(), &clock()), file.contents);
    }

    #[test]
    fn download_reports_export_failure() {
        assert!(matches!(
            download_contract(&form(), &clock(), &FailingExporter),
            Err(ExportError::WriteFile(_))
        ));
    }
}
