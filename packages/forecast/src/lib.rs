#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone-level aggregation and short-horizon demand forecasting.
//!
//! [`aggregate`] folds enriched trips into a daily trip-count series per
//! zone (a trip counts once at its pickup zone and once at its dropoff
//! zone). [`rolling`] turns each zone's series into next-day and
//! next-week predictions using rolling windows over available
//! observations — date gaps are adjacent positions, never reindexed to
//! calendar days.
//!
//! Both stages are pure in-memory computation; all I/O lives in the
//! warehouse and mart crates.

pub mod aggregate;
pub mod rolling;
