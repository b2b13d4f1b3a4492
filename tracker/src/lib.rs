//! Projection engine behind the vaccination tracker dashboard.
//!
//! Raw daily records are rolled up per prefecture ([`aggregate`]), published
//! as immutable epochs ([`tracker`]) and sampled on every frame into
//! monotonically rising display counts ([`projection`], [`ticker`]).

pub mod aggregate;
pub mod cancellation;
pub mod catalog;
pub mod civil;
pub mod feed;
pub mod projection;
pub mod records;
pub mod refresh;
pub mod runtime;
pub mod ticker;
pub mod tracker;

pub use aggregate::{AggregateError, Aggregation, Aggregator, EntityAggregate, PerDose};
pub use catalog::{Catalog, CatalogError, Prefecture, load_catalog};
pub use feed::{FeedClient, FeedError, FeedSource};
pub use projection::{DisplayCounter, Projection, Sample, ease};
pub use records::{Dose, VaccinationRecord};
pub use refresh::RefreshPolicy;
pub use runtime::{RuntimeOptions, TrackerRuntime};
pub use ticker::{Frame, FrameGate, SampleEvent, Ticker};
pub use tracker::{Entity, Epoch, Tracker};
