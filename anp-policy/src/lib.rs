#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
pub mod load;
pub mod scenario;

pub use self::{
    args::Args,
    scenario::{Direction, PeerEndpoint, PodEndpoint, Scenario},
};
