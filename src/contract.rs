mod export;
mod form;
mod functions;
mod generator;
mod pricing;
pub mod template;
mod timeline;

pub use export::{
    file_name, ContractFile, ExportError, ExportResult, FileExporter, FsExporter, CONTRACT_MIME,
};
pub use form::{ContractFormData, FieldName, UnknownField};
pub use functions::{contract_id, Function};
pub use generator::{
    download_contract, generate_contract, ContractGenerator, NO_SPECIAL_TERMS, STANDARD_AGREEMENT,
};
pub use pricing::{PricingBreakdown, DEFAULT_PLATFORM_FEE_PERCENTAGE};
pub use template::Template;
pub use timeline::swap_duration;
