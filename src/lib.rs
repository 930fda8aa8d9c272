//! Energy-storage sizing and V2G arbitrage engine for EV charging
//! stations.
//!
//! Given a station's PV capacity, an EV fleet with a weekly charging
//! schedule, a pile inventory and a time-of-use tariff, the engine
//! computes the weekly load curve (96 slots of 15 minutes per day), the
//! recommended storage system rounded to standard commercial modules,
//! V2G discharge schedules with their arbitrage revenue, and a 20-year
//! economic projection.
//!
//! The core is pure and deterministic: no I/O, no shared state, decimal
//! arithmetic throughout. All entry points live on [`engine::Engine`];
//! [`adapter`] converts persisted JSON rows into the typed inputs.
//!
//! ```
//! use ess_sizer::domain::{FleetConfig, PileGroup, WeeklySchedule};
//! use ess_sizer::domain::{PeriodType, TouPeriod, MinuteRange};
//! use ess_sizer::engine::Engine;
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::default();
//! let fleet = FleetConfig {
//!     vehicle_count: 4,
//!     battery_kwh: dec!(60),
//!     enable_time_control: false,
//!     piles: PileGroup::new(4, 0, 0),
//!     v2g_piles: PileGroup::default(),
//! };
//! let tous = vec![TouPeriod::new(
//!     PeriodType::Normal,
//!     vec![MinuteRange::parse("00:00", "24:00").unwrap()],
//!     dec!(0.55),
//! )];
//! let result = engine
//!     .compute_load_curve(&fleet, &WeeklySchedule::default(), &tous)
//!     .unwrap();
//! assert_eq!(result.peak_power_kw, dec!(28.00));
//! ```

pub mod adapter;
pub mod config;
pub mod domain;
pub mod economics;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod sizing;
pub mod telemetry;
pub mod timegrid;

pub use config::CalculationConfig;
pub use engine::{Engine, LoadCurveResult, SizingRequest, SizingResult, V2gRequest, V2gResult};
pub use error::{CalcError, CalcResult, ErrorKind};
