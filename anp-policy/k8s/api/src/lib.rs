#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod policy;

pub use self::labels::{Labels, Selector};
pub use k8s_openapi::api::core::v1::PodSpec;
pub use kube::ResourceExt;
