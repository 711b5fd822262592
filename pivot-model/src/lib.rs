//! FILENAME: pivot-model/src/lib.rs
//! Data model for the pivot-grid rendering engine.
//!
//! This crate carries the pure data side of the system, with no rendering
//! logic:
//! - `axis`: hierarchical axis descriptors backed by an index arena
//! - `key`: id-combination keying into the sparse aggregation result
//! - `response`: the aggregation result and its display metadata
//! - `layout`: the immutable options record and the legend model

pub mod axis;
pub mod key;
pub mod layout;
pub mod response;

pub use axis::{AxisDescriptor, AxisNode, NodeId};
pub use key::{IdCombination, ID_SEPARATOR};
pub use layout::{
    DigitGroupSeparator, DisplayDensity, FontSize, Layout, Legend,
    LegendDisplayStrategy, LegendDisplayStyle, LegendRegistry, LegendSet,
    NumberType,
};
pub use response::{parse_value, AggregationResponse};
