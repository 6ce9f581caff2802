pub mod currency;
pub mod facebook;

pub use currency::{CurrencyClient, ExchangeRateRecord};
pub use facebook::{ActionValue, AdInsightRecord, FacebookClient, FacebookCredentials};
