mod alphavantage;
mod parse;
mod twelvedata;
mod yahoo;

pub use alphavantage::AlphaVantageAdapter;
pub use twelvedata::TwelveDataAdapter;
pub use yahoo::{YahooAdapter, RAPIDAPI_HOST};
