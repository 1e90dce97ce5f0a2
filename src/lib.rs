//! # Climate Explorer
//!
//! Exploration of the global land-ocean temperature anomaly record.
//!
//! This crate ties the workspace together: [`climate_data`] loads and
//! analyses the dataset, [`climate_math`] holds the numeric kernels, and
//! [`pages`] renders each dashboard page as text or JSON.
//!
//! ## Example
//!
//! ```
//! use climate_explorer::pages::{render, Page, PageOptions};
//! use climate_explorer::{DashboardConfig, RawTable, Session};
//!
//! let raw = RawTable::from_csv_str("Year,Jan,Feb\n2000,0.1,0.3\n2001,0.2,***\n", 0).unwrap();
//! let session = Session::new(Box::new(raw), DashboardConfig::default());
//!
//! let text = render(Page::Monthly, &session, &PageOptions::default()).unwrap();
//! assert!(text.contains("Feb   0.3000"));
//! ```

pub mod pages;

pub use climate_data::{
    ClimateError, DashboardConfig, DataSource, ForecastError, RawSource, RawTable, Session,
};
pub use climate_data as data;
pub use climate_math as math;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
