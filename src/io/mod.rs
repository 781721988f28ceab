//! CSV import and export.

pub mod export;
pub mod import;

pub use export::{
    write_curve, write_curve_to_path, write_hourly, write_hourly_to_path, write_samples,
    write_samples_to_path,
};
pub use import::{LoadedCurve, load_curve, read_degradation_csv};
