use thiserror::Error;

pub type TkResult<T> = Result<T, TkError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TkError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Value out of range for {what}: {value} not in [{lo}, {hi}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },
}
