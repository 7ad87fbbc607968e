//! Common test utilities and helpers
//!
//! This module provides shared functionality for all tests.


pub use db::TestDb;
pub use fixtures::{
    forecast_json, runner, settings, FailingStore, FakePoster, FakeWeather, ForecastBuilder,
};
