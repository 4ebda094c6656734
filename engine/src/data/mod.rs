pub mod form;
pub mod normalizer;
