pub mod settings;

pub use settings::CalcSettings;
