use crate::{
    dispatch::DispatchError, loader::LoaderError, pipeline::PipelineError, plane::PlaneError,
    settings::SettingsError, table::TableError, vendor::VendorError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `table` module")]
    Table(#[from] TableError),
    #[error("Error in the `plane` module")]
    Plane(#[from] PlaneError),
    #[error("Error in the `vendor` module")]
    Vendor(#[from] VendorError),
    #[error("Error in the `dispatch` module")]
    Dispatch(#[from] DispatchError),
    #[error("Error in the `loader` module")]
    Loader(#[from] LoaderError),
    #[error("Error in the `settings` module")]
    Settings(#[from] SettingsError),
    #[error("Error in the `pipeline` module")]
    Pipeline(#[from] PipelineError),
    #[error("failed to write the canonical table")]
    Csv(#[from] csv::Error),
}
pub type Result<T> = std::result::Result<T, Error>;
